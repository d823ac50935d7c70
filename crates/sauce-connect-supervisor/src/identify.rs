//! Correlating the launched process with its remote tunnel
//!
//! The REST API offers no way to ask "which tunnel did my process
//! create", so the only correlation signal is the difference between a
//! pre-launch snapshot of the listing and the listings taken after
//! launch. If an unrelated actor creates a tunnel on the same account
//! during the detection window, identification can bind to the wrong id;
//! that is a limitation of the listing API, accepted rather than hidden.

use crate::api::TunnelApi;
use sauce_connect_rest::TunnelId;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Delay between listing attempts while identifying.
const POLL_DELAY: Duration = Duration::from_millis(500);

/// Identification errors
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("no new tunnel appeared within {0:?}")]
    Timeout(Duration),
}

/// Wait until the listing contains an id outside `existing` and return it.
///
/// The loop is bounded by a wall-clock deadline rather than an iteration
/// count, since listing latency varies. Listing failures inside the window
/// are swallowed; the loop itself is the retry. The first id not present
/// in the pre-launch snapshot wins, in the order the API reported it.
pub async fn identify_new_tunnel(
    api: &dyn TunnelApi,
    existing: &[TunnelId],
    timeout: Duration,
) -> Result<TunnelId, IdentifyError> {
    let deadline = Instant::now() + timeout;

    loop {
        match api.list_tunnels().await {
            Ok(current) => {
                if let Some(id) = current.into_iter().find(|id| !existing.contains(id)) {
                    return Ok(id);
                }
                debug!("no new tunnel yet");
            }
            Err(err) => {
                debug!(error = %err, "listing failed during identification, retrying");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(IdentifyError::Timeout(timeout));
        }
        tokio::time::sleep(POLL_DELAY.min(deadline - now)).await;
    }
}
