//! Logging utilities and initialization for unoq-link

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;
use std::path::Path;

/// Map `-v` / `-q` flags to a level filter
pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Parse a configured level name, e.g. `log_level = "debug"`
pub fn level_from_name(name: &str) -> Option<LevelFilter> {
    name.parse().ok()
}

/// Initialize logging for the `unoq` CLI.
///
/// Logs go to stderr so command output on stdout stays clean, or to
/// `log_file` when one is given.
pub fn init_cli_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::from_default_env();
    builder.filter_level(level).format_timestamp_secs();

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder.target(Target::Pipe(Box::new(file))).format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    buf.timestamp(),
                    record.level(),
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            });
        }
        None => {
            builder.target(Target::Stderr).format_module_path(false);
        }
    }

    builder.try_init()?;

    #[cfg(debug_assertions)]
    log_panics::init();

    log::debug!("unoq logging initialized with level: {:?}", level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_selection() {
        assert_eq!(level_from_flags(0, true), LevelFilter::Error);
        assert_eq!(level_from_flags(3, true), LevelFilter::Error);
        assert_eq!(level_from_flags(0, false), LevelFilter::Info);
        assert_eq!(level_from_flags(1, false), LevelFilter::Debug);
        assert_eq!(level_from_flags(2, false), LevelFilter::Trace);
    }

    #[test]
    fn test_level_from_config_name() {
        assert_eq!(level_from_name("debug"), Some(LevelFilter::Debug));
        assert_eq!(level_from_name("WARN"), Some(LevelFilter::Warn));
        assert_eq!(level_from_name("chatty"), None);
    }
}
