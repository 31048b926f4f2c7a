//! Utilities for setting up logging

use anyhow::Result;
use log::LevelFilter;

fn level_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Sends this crate's log records to stderr, keeping stdout for results.
pub fn set_up_logging(verbose: bool) -> Result<()> {
    fern::Dispatch::new()
        .level(level_filter(verbose))
        .filter(|metadata| metadata.target().starts_with("spec_bundle"))
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{level}] {message}",
                level = record.level(),
                message = message,
            ))
        })
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
