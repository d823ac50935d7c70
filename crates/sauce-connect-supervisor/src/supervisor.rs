//! Lifecycle coordination
//!
//! Start-up sequencing (snapshot, launch, identify), then a control loop
//! that owns the subprocess handle and waits on the two things that can
//! end the `Running` phase from inside: the subprocess terminating and
//! the shutdown signal (raised by the poller, by an external stop
//! request, or by the control loop itself on process exit). Whichever
//! fires, the same teardown runs exactly once.

use crate::api::TunnelApi;
use crate::config::SupervisorConfig;
use crate::identify::{identify_new_tunnel, IdentifyError};
use crate::poller;
use crate::process::{LaunchError, TunnelProcess};
use crate::shutdown::{StopHandle, StopReason};
use sauce_connect_rest::{RestError, SauceRestClient, TunnelId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Start-up errors. All of them are fatal: the host service reports a
/// failed start and an operator intervenes; nothing is retried.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Identification(#[from] IdentifyError),

    #[error("initial tunnel listing failed: {0}")]
    Rest(#[from] RestError),
}

/// Coordinator phase, observable through [`RunningTunnel::phase_watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Starting,
    Identifying,
    Running,
    Stopping,
    Stopped,
}

/// Tunnel lifecycle supervisor.
pub struct Supervisor {
    config: SupervisorConfig,
    api: Arc<dyn TunnelApi>,
}

impl Supervisor {
    /// Supervisor talking to the real Sauce Labs endpoint.
    pub fn new(config: SupervisorConfig) -> Self {
        let mut client =
            SauceRestClient::new(config.account_id.clone(), config.access_key.clone());
        if let Some(base_url) = &config.rest_url {
            client = client.with_base_url(base_url.clone());
        }
        Self {
            api: Arc::new(client),
            config,
        }
    }

    /// Supervisor over a caller-supplied tunnel API.
    pub fn with_api(config: SupervisorConfig, api: Arc<dyn TunnelApi>) -> Self {
        Self { config, api }
    }

    /// Run the start-up sequence: snapshot the existing tunnels, launch
    /// the subprocess, wait for its tunnel id to appear, then hand the
    /// session over to the control loop and the health poller.
    ///
    /// On identification timeout the already-started subprocess is killed
    /// before the error is returned.
    pub async fn start(self) -> Result<RunningTunnel, StartError> {
        let (phase_tx, phase_rx) = watch::channel(Phase::Starting);
        info!(account = %self.config.account_id, "starting tunnel supervisor");

        let existing = self.api.list_tunnels().await?;
        debug!(count = existing.len(), "pre-launch tunnel snapshot");

        let mut process = TunnelProcess::launch(&self.config.program, &self.config.args)?;

        phase_tx.send_replace(Phase::Identifying);
        let tunnel_id = match identify_new_tunnel(
            self.api.as_ref(),
            &existing,
            self.config.identification_timeout,
        )
        .await
        {
            Ok(tunnel_id) => tunnel_id,
            Err(err) => {
                warn!(error = %err, "identification failed, killing tunnel process");
                process.kill().await;
                if let Err(reap) = process.wait().await {
                    warn!(error = %reap, "failed to reap tunnel process");
                }
                return Err(err.into());
            }
        };
        info!(tunnel = %tunnel_id, "tunnel identified");

        let stop = StopHandle::new();
        let poller = tokio::spawn(poller::run(
            Arc::clone(&self.api),
            tunnel_id.clone(),
            self.config.polling_interval,
            stop.clone(),
        ));
        phase_tx.send_replace(Phase::Running);

        let control = ControlLoop {
            process,
            api: self.api,
            tunnel_id: tunnel_id.clone(),
            stop: stop.clone(),
            phase: phase_tx,
            poller,
        };
        let control = tokio::spawn(control.run());

        Ok(RunningTunnel {
            tunnel_id,
            stop,
            phase: phase_rx,
            control,
        })
    }
}

/// Handle to a started tunnel session.
#[derive(Debug)]
pub struct RunningTunnel {
    tunnel_id: TunnelId,
    stop: StopHandle,
    phase: watch::Receiver<Phase>,
    control: JoinHandle<StopReason>,
}

impl RunningTunnel {
    /// The id this session was bound to during identification.
    /// Assigned exactly once per supervisor lifetime.
    pub fn tunnel_id(&self) -> &TunnelId {
        &self.tunnel_id
    }

    /// Handle for requesting a stop from outside.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current coordinator phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Watch the phase transitions.
    pub fn phase_watch(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Completes once teardown has finished, whatever triggered it.
    pub async fn stopped(&mut self) {
        // Err here means the control loop is gone, i.e. already stopped
        let _ = self.phase.wait_for(|phase| *phase == Phase::Stopped).await;
    }

    /// Wait for the session to end and return the recorded stop reason.
    pub async fn wait_stopped(self) -> StopReason {
        match self.control.await {
            Ok(reason) => reason,
            Err(err) => {
                warn!(error = %err, "control task failed");
                self.stop.reason().unwrap_or(StopReason::StopRequested)
            }
        }
    }

    /// Request a stop and wait for teardown to complete.
    pub async fn shutdown(self) -> StopReason {
        self.stop.request_stop(StopReason::StopRequested);
        self.wait_stopped().await
    }
}

/// State owned by the control task for the lifetime of one session.
struct ControlLoop {
    process: TunnelProcess,
    api: Arc<dyn TunnelApi>,
    tunnel_id: TunnelId,
    stop: StopHandle,
    phase: watch::Sender<Phase>,
    poller: JoinHandle<()>,
}

impl ControlLoop {
    async fn run(mut self) -> StopReason {
        let mut shutdown = self.stop.subscribe();

        tokio::select! {
            status = self.process.wait() => {
                match status {
                    Ok(status) => warn!(%status, "tunnel process exited"),
                    Err(err) => warn!(error = %err, "waiting on tunnel process failed"),
                }
                self.stop.request_stop(StopReason::ProcessExited);
            }
            _ = shutdown.wait_for(|stopped| *stopped) => {}
        }

        let reason = self.stop.reason().unwrap_or(StopReason::StopRequested);
        info!(%reason, "stopping tunnel supervisor");
        self.phase.send_replace(Phase::Stopping);

        self.teardown().await;

        self.phase.send_replace(Phase::Stopped);
        info!(tunnel = %self.tunnel_id, "tunnel supervisor stopped");
        reason
    }

    /// Ordered teardown: poller first, then the local process, then the
    /// remote tunnel. Errors here are reported but never block reaching
    /// `Stopped`.
    async fn teardown(&mut self) {
        // The signal is already raised, so the poller exits promptly
        if let Err(err) = (&mut self.poller).await {
            warn!(error = %err, "health poller task failed");
        }

        self.process.kill().await;
        match self.process.wait().await {
            Ok(status) => debug!(%status, "tunnel process reaped"),
            Err(err) => warn!(error = %err, "failed to reap tunnel process"),
        }

        // Delete only if still listed; deleting an already-gone tunnel
        // would surface a spurious error
        match self.api.list_tunnels().await {
            Ok(tunnels) if tunnels.contains(&self.tunnel_id) => {
                match self.api.delete_tunnel(&self.tunnel_id).await {
                    Ok(()) => info!(tunnel = %self.tunnel_id, "remote tunnel deleted"),
                    Err(err) => warn!(error = %err, "failed to delete remote tunnel"),
                }
            }
            Ok(_) => debug!(tunnel = %self.tunnel_id, "remote tunnel already gone"),
            Err(err) => {
                warn!(error = %err, "could not confirm remote tunnel state, skipping delete");
            }
        }
    }
}
