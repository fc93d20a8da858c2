use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Severity of a log entry.
///
/// Levels are totally ordered by their `u8` ordinal and filtering only ever
/// compares ordinals. `None` sits above every real level: a logger configured
/// with `Level::None` emits nothing, and no entry is ever tagged with it.
///
/// ```
/// # use pool_logger::Level;
/// assert!(Level::Fine < Level::Info);
/// assert_eq!("trace".parse::<Level>().unwrap(), Level::Fine);
/// assert_eq!(Level::Warn.as_str(), "warn");
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Fine = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    None = 6,
}

impl Level {
    /// Every level an entry can carry, lowest first.
    pub const ALL: [Level; 6] = [
        Level::Fine,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    #[inline(always)]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Lower-case name, as written in the `@lvl` field of JSON lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Fine => "fine",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::None => "none",
        }
    }

    /// Upper-case name used in text headers.
    pub const fn as_upper_str(self) -> &'static str {
        match self {
            Level::Fine => "FINE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::None => "NONE",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    /// Case-insensitive. `trace` and `fine` name the same level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fine" | "trace" => Ok(Level::Fine),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" | "err" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "none" | "off" => Ok(Level::None),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_ordered() {
        for pair in Level::ALL.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
        assert!(Level::Fatal < Level::None);
    }

    #[test]
    fn test_parse_synonyms() {
        assert_eq!("TRACE".parse::<Level>().unwrap(), Level::Fine);
        assert_eq!("fine".parse::<Level>().unwrap(), Level::Fine);
        assert_eq!("Warning".parse::<Level>().unwrap(), Level::Warn);
        assert!(matches!("loud".parse::<Level>(), Err(Error::InvalidLevel(s)) if s == "loud"));
    }

    #[test]
    fn test_display_round_trips() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }
}
