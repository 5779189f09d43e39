//! Logger bootstrap for binaries

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` shows debug messages and
/// the default shows info and above.
pub fn init(verbose: bool) {
    // Only fails when a logger is already installed
    let _ = builder(verbose).try_init();
}

fn builder(verbose: bool) -> Builder {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();
    builder
}
