//! Supervisor configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default health polling interval (30 seconds).
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default window to wait for a new tunnel id to appear after launch.
pub const DEFAULT_IDENTIFICATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a tunnel supervisor.
///
/// Credentials are immutable after start; the poller only ever reads them
/// through the REST client.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Sauce Labs account id
    pub account_id: String,

    /// Access key for the account
    pub access_key: String,

    /// Executable that creates the tunnel
    pub program: PathBuf,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Interval between health polls of the tunnel listing
    pub polling_interval: Duration,

    /// How long to wait for a new tunnel id after launching the process
    pub identification_timeout: Duration,

    /// REST base URL override (production endpoint when `None`)
    pub rest_url: Option<String>,
}

impl SupervisorConfig {
    /// Configuration for the stock Sauce Connect jar:
    /// `<java> -jar <jar> <extra args...> <account id> <access key>`.
    pub fn sauce_connect(
        account_id: impl Into<String>,
        access_key: impl Into<String>,
        java_home: &Path,
        jar: &Path,
        extra_args: &[String],
    ) -> Self {
        let account_id = account_id.into();
        let access_key = access_key.into();

        let mut args = vec!["-jar".to_string(), jar.display().to_string()];
        args.extend(extra_args.iter().cloned());
        args.push(account_id.clone());
        args.push(access_key.clone());

        Self {
            account_id,
            access_key,
            program: java_executable(java_home),
            args,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            identification_timeout: DEFAULT_IDENTIFICATION_TIMEOUT,
            rest_url: None,
        }
    }
}

/// Path of the `java` launcher under a JRE/JDK root.
pub fn java_executable(java_home: &Path) -> PathBuf {
    let launcher = if cfg!(windows) { "java.exe" } else { "java" };
    java_home.join("bin").join(launcher)
}

/// Parse a polling interval given in milliseconds.
///
/// Absent or unparsable values silently fall back to the default; a bad
/// interval is never a fatal error.
pub fn parse_polling_interval(value: Option<&str>) -> Duration {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLLING_INTERVAL)
}
