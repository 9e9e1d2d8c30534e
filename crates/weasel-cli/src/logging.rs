//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the stderr subscriber.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` is honoured and the
/// level defaults to `warn`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    let filter_layer = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init_twice_is_harmless() {
        init(false);
        init(true);
        tracing::warn!("logging initialised");
    }
}
