//! Tracing setup for the copyfan binary.

use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the `--log-level` flag decides.
/// Load runs can sit in a single COPY for minutes, so events carry an
/// uptime timestamp instead of wall-clock time, which makes it easy to
/// read worker durations straight off the log.
pub fn init(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(uptime())
        .init();
}
