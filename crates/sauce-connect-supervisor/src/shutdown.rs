//! Convergent shutdown signaling
//!
//! Three triggers can end a running tunnel: the subprocess exiting on its
//! own, the health poller losing sight of the tunnel, and an external stop
//! request. All of them funnel into [`StopHandle::request_stop`]; a
//! compare-and-swap on the stopping flag guarantees that exactly one of
//! them wins and exactly one teardown sequence runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

/// Why the supervisor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The tunnel process terminated on its own
    ProcessExited,
    /// A successful listing no longer contained the tunnel id
    TunnelVanished,
    /// The host service asked for a stop
    StopRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::ProcessExited => "tunnel process exited",
            StopReason::TunnelVanished => "tunnel vanished",
            StopReason::StopRequested => "stop requested",
        };
        f.write_str(reason)
    }
}

#[derive(Debug)]
struct StopShared {
    stopping: AtomicBool,
    reason: Mutex<Option<StopReason>>,
    signal: watch::Sender<bool>,
}

/// Shared, clonable handle that raises the one-shot shutdown signal.
///
/// Safe to invoke from any task, any number of times; only the first call
/// records its reason and raises the signal.
#[derive(Clone, Debug)]
pub struct StopHandle {
    inner: Arc<StopShared>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            inner: Arc::new(StopShared {
                stopping: AtomicBool::new(false),
                reason: Mutex::new(None),
                signal,
            }),
        }
    }

    /// Request a stop. The first caller wins; later calls are no-ops.
    pub fn request_stop(&self, reason: StopReason) {
        if self
            .inner
            .stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!(%reason, "stop requested");
            *self.inner.reason.lock().unwrap() = Some(reason);
            // Once raised the signal stays raised
            self.inner.signal.send_replace(true);
        } else {
            debug!(%reason, "stop already in progress");
        }
    }

    /// True once a stop has been requested from any trigger.
    pub fn is_stopping(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// The reason recorded by the winning trigger.
    pub fn reason(&self) -> Option<StopReason> {
        *self.inner.reason.lock().unwrap()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.signal.subscribe()
    }
}
