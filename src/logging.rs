//! Logger setup for applications built on the crate.
//!
//! The library itself only emits records through the [`log`] macros; binaries call [`init`] once
//! at startup to route them to stderr.

use crate::error::{Error, ErrorKind, Result};

/// Installs a global [`fern`] logger printing records at `level` and above to stderr.
pub fn init(level: log::LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| Error::new(ErrorKind::Logging, format!("logger already installed: {e}")))
}

/// Parses a level name such as `"info"` or `"debug"`, case insensitive.
pub fn parse_level(name: &str) -> Result<log::LevelFilter> {
    name.parse().map_err(|_| {
        Error::new(
            ErrorKind::InvalidParameter,
            format!("unknown log level `{name}`"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), log::LevelFilter::Info);
        assert_eq!(parse_level("DEBUG").unwrap(), log::LevelFilter::Debug);
        assert_eq!(parse_level("off").unwrap(), log::LevelFilter::Off);
        assert_eq!(
            parse_level("loud").unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
    }

    #[test]
    fn test_second_init_fails() {
        // the first call may race with other tests, the second can never succeed
        let _ = init(log::LevelFilter::Warn);
        let err = init(log::LevelFilter::Warn).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Logging);
    }
}
