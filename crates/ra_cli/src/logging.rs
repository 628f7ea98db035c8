// Logging setup: tracing + tracing-subscriber, written to stderr so stdout stays
// clean for --print output.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber.
///
/// `RUST_LOG` wins when set (e.g. `RUST_LOG=ra_algo=debug` to see every edge);
/// otherwise `info`, or `warn` with `--quiet`.
pub fn init(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}
