// src/utils/logger.rs

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Maps `-q` / `-v` counts onto a level filter.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn icon(level: Level) -> &'static str {
    match level {
        Level::Error => "🔴",
        Level::Warn => "🟠",
        Level::Info => "🔵",
        Level::Debug => "⚪",
        Level::Trace => "▫️",
    }
}

/// Installs the stderr logger. `RUST_LOG` takes precedence over the CLI level.
pub fn init(verbosity: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.filter_level(level_for(verbosity, quiet));
    builder.parse_env(Env::default());

    // Format: "🔴  File not found"
    builder.format(|buf, record| writeln!(buf, "{}  {}", icon(record.level()), record.args()));

    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0, false), LevelFilter::Warn);
        assert_eq!(level_for(2, false), LevelFilter::Debug);
        assert_eq!(level_for(7, false), LevelFilter::Trace);
        assert_eq!(level_for(3, true), LevelFilter::Error);
    }
}
