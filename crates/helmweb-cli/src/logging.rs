//! Logging initialization

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "helmweb=info,tower_http=info";
const DEBUG_FILTER: &str = "helmweb=debug,tower_http=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects the verbose
/// filter. Logs go to stderr so command output on stdout stays clean.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug),
        )
        .init();
}
