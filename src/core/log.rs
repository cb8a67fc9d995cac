// Define a new module for logging initialization
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,balancer=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` replaces the defaults entirely when set. Otherwise everything
/// logs at warn and `--verbose` raises the `balancer` target to debug.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
