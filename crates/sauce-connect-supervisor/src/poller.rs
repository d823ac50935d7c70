//! Background health polling of the identified tunnel

use crate::api::TunnelApi;
use crate::shutdown::{StopHandle, StopReason};
use sauce_connect_rest::TunnelId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Periodically re-check that the identified tunnel is still listed.
///
/// Only explicit absence from a successful listing counts as loss; a
/// failed listing is "not confirmed present" for that cycle and the
/// poller keeps going. The wait between cycles races the shutdown signal,
/// so the poller exits promptly once a stop is requested, without another
/// listing call.
pub(crate) async fn run(
    api: Arc<dyn TunnelApi>,
    tunnel_id: TunnelId,
    interval: Duration,
    stop: StopHandle,
) {
    let mut shutdown = stop.subscribe();
    if *shutdown.borrow() {
        return;
    }
    debug!(
        tunnel = %tunnel_id,
        interval_ms = interval.as_millis() as u64,
        "health poller started"
    );

    loop {
        match api.list_tunnels().await {
            Ok(tunnels) => {
                if !tunnels.contains(&tunnel_id) {
                    warn!(tunnel = %tunnel_id, "tunnel no longer listed");
                    stop.request_stop(StopReason::TunnelVanished);
                    return;
                }
                debug!(tunnel = %tunnel_id, "tunnel still listed");
            }
            Err(err) => {
                // Transient failure: tunnel not confirmed present, not lost
                warn!(error = %err, "health listing failed, retrying next cycle");
            }
        }

        tokio::select! {
            _ = shutdown.changed() => {
                debug!("health poller stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
