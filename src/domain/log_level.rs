use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;
use thiserror::Error;

/// Severity of a single log record.
///
/// Each severity owns one bit of a [`LogLevel`] mask, so a provider emits a
/// record only when its mask has the record's bit set. Serialized by variant
/// name; deserialized through [`FromStr`], so any casing is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
    Trace,
    Debug,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Fatal,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Trace,
        Severity::Debug,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Severity::Fatal => 1,
            Severity::Error => 1 << 1,
            Severity::Warning => 1 << 2,
            Severity::Info => 1 << 3,
            Severity::Trace => 1 << 4,
            Severity::Debug => 1 << 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Fatal => "Fatal",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Trace => "Trace",
            Severity::Debug => "Debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatal" => Ok(Severity::Fatal),
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            other => Err(LevelParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = LevelParseError;

    fn try_from(value: String) -> Result<Self, <Self as TryFrom<String>>::Error> {
        value.parse()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown log level: '{0}'")]
pub struct LevelParseError(pub String);

/// Bit mask of enabled severities.
///
/// Text form is a `|`-separated list of severities (`"error|fatal"`) or one of
/// the presets `none`, `production`, `development` and `all`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogLevel(u32);

impl LogLevel {
    pub const NONE: LogLevel = LogLevel(0);
    pub const FATAL: LogLevel = LogLevel(Severity::Fatal.bit());
    pub const ERROR: LogLevel = LogLevel(Severity::Error.bit());
    pub const WARNING: LogLevel = LogLevel(Severity::Warning.bit());
    pub const INFO: LogLevel = LogLevel(Severity::Info.bit());
    pub const TRACE: LogLevel = LogLevel(Severity::Trace.bit());
    pub const DEBUG: LogLevel = LogLevel(Severity::Debug.bit());
    pub const PRODUCTION: LogLevel = LogLevel(
        Severity::Fatal.bit() | Severity::Error.bit() | Severity::Warning.bit(),
    );
    pub const ALL: LogLevel = LogLevel(0b11_1111);
    pub const DEVELOPMENT: LogLevel = LogLevel::ALL;

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds a mask from raw bits, discarding bits that name no severity.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        LogLevel(bits & LogLevel::ALL.0)
    }

    pub const fn has(self, severity: Severity) -> bool {
        self.0 & severity.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn with(self, severity: Severity) -> Self {
        LogLevel(self.0 | severity.bit())
    }

    pub fn severities(self) -> impl Iterator<Item = Severity> {
        Severity::ALL.into_iter().filter(move |s| self.has(*s))
    }
}

impl From<Severity> for LogLevel {
    fn from(severity: Severity) -> Self {
        LogLevel(severity.bit())
    }
}

impl BitOr for LogLevel {
    type Output = LogLevel;

    fn bitor(self, rhs: Self) -> Self::Output {
        LogLevel(self.0 | rhs.0)
    }
}

impl BitOr<Severity> for LogLevel {
    type Output = LogLevel;

    fn bitor(self, rhs: Severity) -> Self::Output {
        self.with(rhs)
    }
}

impl BitOrAssign for LogLevel {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LogLevel {
    type Output = LogLevel;

    fn bitand(self, rhs: Self) -> Self::Output {
        LogLevel(self.0 & rhs.0)
    }
}

impl fmt::Debug for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogLevel({self})")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        if *self == LogLevel::ALL {
            return f.write_str("all");
        }
        let names: Vec<String> = self
            .severities()
            .map(|s| s.as_str().to_ascii_lowercase())
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl FromStr for LogLevel {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut level = LogLevel::NONE;
        for part in s.split(['|', ',']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            level |= match part.to_ascii_lowercase().as_str() {
                "none" => LogLevel::NONE,
                "production" => LogLevel::PRODUCTION,
                "development" | "all" => LogLevel::ALL,
                _ => part.parse::<Severity>()?.into(),
            };
        }
        Ok(level)
    }
}

impl TryFrom<String> for LogLevel {
    type Error = LevelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}
