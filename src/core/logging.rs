//! Diagnostic logging setup

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides the flags
pub const LOG_ENV: &str = "TAGSCOPE_LOG";

/// Filter directive for the verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "tagscope=debug,warn"
    } else {
        "warn"
    }
}

/// Install the global subscriber, writing to stderr so stdout stays pipeable.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
