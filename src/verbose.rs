use std::time::Instant;

use tracing_subscriber::EnvFilter;

/// Install the stderr diagnostics subscriber.
///
/// `DBEXPORT_LOG` takes precedence; otherwise `--verbose` selects `debug`
/// and the default is `warn`. stdout stays reserved for exported data.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env("DBEXPORT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// A timer for measuring durations in diagnostics.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}
