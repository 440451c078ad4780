use anyhow::{Context, Result};
use std::env;
use std::io::stderr;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use account_store::demo::run_demo;
use account_store::{AccountStore, StoreConfig};

const ENV_CONFIG: &str = "ACCOUNT_STORE_CONFIG";

fn main() -> Result<()> {
    // Optional config file: first argument, else ACCOUNT_STORE_CONFIG
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var(ENV_CONFIG).ok())
        .map(PathBuf::from);

    let config = StoreConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    setup_logging(&config.log_level);

    let store = AccountStore::open(&config)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    println!("✓ Connected to {}", config.database.display());

    let report = run_demo(&store);
    if !report.failed_steps.is_empty() {
        warn!(failed = ?report.failed_steps, "Demo finished with failed steps");
    }

    Ok(())
}

fn setup_logging(level: &str) {
    // stdout carries the demo output, logs go to stderr
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", level);
        EnvFilter::new("info")
    });

    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
