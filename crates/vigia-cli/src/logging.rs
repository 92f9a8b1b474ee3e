//! Tracing setup for the CLI.
//!
//! Logs go to stderr so stdout stays clean for the summary line or JSON.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level implied by the verbosity flags, if any were given
#[must_use]
pub const fn flag_level(verbose: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Install the global subscriber
///
/// Explicit `-v`/`-q` flags win over `RUST_LOG`; with neither, only warnings
/// and errors are shown.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = match flag_level(verbose, quiet) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_level() {
        assert_eq!(flag_level(0, false), None);
        assert_eq!(flag_level(1, false), Some("info"));
        assert_eq!(flag_level(2, false), Some("debug"));
        assert_eq!(flag_level(7, false), Some("trace"));
        assert_eq!(flag_level(3, true), Some("error"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(0, true);
        init_tracing(2, false);
    }
}
