//! Logging setup.
//!
//! Diagnostics go through `tracing` to stderr so the operator progress
//! lines on stdout stay clean enough to pipe.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for filter directives.
pub const LOG_ENV: &str = "FORGECTL_LOG";

/// Install the global subscriber. Called once per binary, before any work.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fallback_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_selects_debug_fallback() {
        assert_eq!(fallback_directive(false), "info");
        assert_eq!(fallback_directive(true), "debug");
    }
}
