//! Sauce Connect tunnel supervisor
//!
//! Owns the lifecycle of a Sauce Connect subprocess and of the remote
//! tunnel it creates: launch, identify the tunnel id that appears in the
//! account's listing, health-poll it, and converge on a single teardown
//! (kill the process, delete the remote tunnel) no matter which trigger
//! fires first — subprocess exit, tunnel loss, or an external stop.

pub mod api;
pub mod config;
pub mod identify;
pub mod process;
pub mod shutdown;
pub mod supervisor;

mod poller;

#[cfg(test)]
pub(crate) mod test_api;

pub use api::TunnelApi;
pub use config::{
    java_executable, parse_polling_interval, SupervisorConfig, DEFAULT_IDENTIFICATION_TIMEOUT,
    DEFAULT_POLLING_INTERVAL,
};
pub use identify::{identify_new_tunnel, IdentifyError};
pub use process::{LaunchError, TunnelProcess};
pub use shutdown::{StopHandle, StopReason};
pub use supervisor::{Phase, RunningTunnel, StartError, Supervisor};

pub use sauce_connect_rest::{RestError, SauceRestClient, TunnelId};
