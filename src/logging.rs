//! Tracing subscriber setup for the `intel` binary.
//!
//! Logs go to stderr so stdout stays parseable. `RUST_LOG` wins when set;
//! otherwise `--verbose` selects debug for this crate and its core.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "intel_harness=debug,intel_harness_core=debug,tower_http=debug,warn"
    } else {
        "intel_harness=info,warn"
    }
}

/// Installs the global subscriber. Call once, before config loading.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }
}
