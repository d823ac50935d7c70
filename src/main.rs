//! Sauce Connect supervisor service
//!
//! Launches the Sauce Connect jar, binds it to the tunnel id that appears
//! in the account's listing, keeps polling the tunnel for liveness, and
//! tears down both the process and the remote tunnel on shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use sauce_connect_supervisor::{parse_polling_interval, Supervisor, SupervisorConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sauce Connect supervisor - keeps a Sauce Connect tunnel up and cleans it up on stop
#[derive(Parser, Debug)]
#[command(name = "sauce-connectd")]
#[command(
    about = "Sauce Connect supervisor - keeps a Sauce Connect tunnel up and cleans it up on stop"
)]
#[command(version)]
#[command(long_about = r#"
sauce-connectd launches the Sauce Connect jar for an account, waits until
the tunnel it creates shows up in the Sauce Labs REST listing, and then
supervises it: if the tunnel disappears, the process dies, or the service
is asked to stop, the process is killed and the remote tunnel deleted.

EXAMPLES:
  # Run with credentials from the environment
  SAUCE_CONNECT_ID=my-account SAUCE_CONNECT_KEY=$KEY sauce-connectd

  # Explicit jar and faster health polling
  sauce-connectd --account-id my-account --access-key $KEY \
    --jar /srv/sauce/Sauce-Connect.jar \
    --polling-interval-ms 10000

ENVIRONMENT VARIABLES:
  SAUCE_CONNECT_ID                Sauce Labs account id
  SAUCE_CONNECT_KEY               Access key for the account
  JAVA_HOME                       JRE/JDK root used to find bin/java
  SAUCE_CONNECT_ARGS              Extra arguments appended to the jar invocation
  SAUCE_CONNECT_POLLING_INTERVAL  Health polling interval in milliseconds
"#)]
struct Args {
    /// Sauce Labs account id
    #[arg(long, env = "SAUCE_CONNECT_ID")]
    account_id: String,

    /// Access key for the account
    #[arg(long, env = "SAUCE_CONNECT_KEY")]
    access_key: String,

    /// JRE/JDK root; the tunnel runs under <java-home>/bin/java
    #[arg(long, env = "JAVA_HOME")]
    java_home: PathBuf,

    /// Extra command-line arguments for the jar, whitespace-separated
    #[arg(long, env = "SAUCE_CONNECT_ARGS", allow_hyphen_values = true)]
    extra_args: Option<String>,

    /// Health polling interval in milliseconds (invalid values fall back to 30000)
    #[arg(long, env = "SAUCE_CONNECT_POLLING_INTERVAL")]
    polling_interval_ms: Option<String>,

    /// Path to Sauce-Connect.jar (defaults to resources/Sauce-Connect.jar next to this executable)
    #[arg(long)]
    jar: Option<PathBuf>,

    /// REST base URL override (for testing against a local endpoint)
    #[arg(long, env = "SAUCE_REST_URL")]
    rest_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Setup logging with the specified log level
fn setup_logging(log_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(log_level).with_context(|| format!("Invalid log level: {}", log_level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

/// Default jar location: resources/Sauce-Connect.jar next to the executable
fn default_jar_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to resolve current executable path")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Executable path has no parent directory"))?;
    Ok(dir.join("resources").join("Sauce-Connect.jar"))
}

fn build_config(args: &Args) -> Result<SupervisorConfig> {
    let jar = match &args.jar {
        Some(jar) => jar.clone(),
        None => default_jar_path()?,
    };

    let extra_args: Vec<String> = args
        .extra_args
        .as_deref()
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let mut config = SupervisorConfig::sauce_connect(
        args.account_id.clone(),
        args.access_key.clone(),
        &args.java_home,
        &jar,
        &extra_args,
    );
    config.polling_interval = parse_polling_interval(args.polling_interval_ms.as_deref());
    config.rest_url = args.rest_url.clone();

    Ok(config)
}

/// Wait for a shutdown request from the host (SIGTERM from a service
/// manager or SIGINT from a terminal).
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT (Ctrl+C)"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level)?;

    info!("Sauce Connect supervisor starting...");

    let config = build_config(&args).context("Failed to build supervisor configuration")?;
    info!("Account: {}", config.account_id);
    info!("Tunnel command: {}", config.program.display());
    info!("Polling interval: {}ms", config.polling_interval.as_millis());

    let mut running = Supervisor::new(config)
        .start()
        .await
        .context("Failed to start Sauce Connect tunnel")?;

    info!("Tunnel {} is up", running.tunnel_id());

    tokio::select! {
        result = shutdown_signal() => {
            if let Err(err) = result {
                error!("Signal handler error: {:#}", err);
            }
        }
        _ = running.stopped() => {}
    }

    let reason = running.shutdown().await;
    info!("Supervisor stopped ({})", reason);

    Ok(())
}
