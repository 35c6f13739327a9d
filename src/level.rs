//! Severity levels, event sources and output modes.
//!
//! All three are closed sets: any externally supplied name that does not
//! exactly match a member is rejected at parse time.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a textual name does not match any enum member.
#[derive(Debug, Error)]
#[error("unknown {kind} name: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Ordered log severity.
///
/// `All` and `Off` are sentinels: a minimum level of `All` lets every
/// record through, `Off` suppresses everything.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    All,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
    Off,
}

impl Level {
    /// Numeric rank underlying the ordering; records are emitted only if
    /// their level's rank is at least the configured minimum's rank.
    pub fn rank(self) -> i64 {
        match self {
            Level::All => i64::MIN,
            Level::Debug => 100,
            Level::Info => 200,
            Level::Notice => 300,
            Level::Warning => 400,
            Level::Error => 500,
            Level::Critical => 600,
            Level::Alert => 700,
            Level::Emergency => 800,
            Level::Off => i64::MAX,
        }
    }

    /// Canonical lowercase name, as embedded in record payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::All => "all",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Alert => "alert",
            Level::Emergency => "emergency",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Level::All),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "notice" => Ok(Level::Notice),
            "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" => Ok(Level::Critical),
            "alert" => Ok(Level::Alert),
            "emergency" => Ok(Level::Emergency),
            "off" => Ok(Level::Off),
            _ => Err(ParseEnumError {
                kind: "level",
                value: s.to_string(),
            }),
        }
    }
}

/// Where the emitting client runs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    #[serde(rename = "web")]
    Web,
    #[serde(rename = "web-mobile")]
    WebMobile,
    #[serde(rename = "web-wechat")]
    WebWeChat,
    #[serde(rename = "app")]
    App,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Web => "web",
            Source::WebMobile => "web-mobile",
            Source::WebWeChat => "web-wechat",
            Source::App => "app",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Source::Web),
            "web-mobile" => Ok(Source::WebMobile),
            "web-wechat" => Ok(Source::WebWeChat),
            "app" => Ok(Source::App),
            _ => Err(ParseEnumError {
                kind: "source",
                value: s.to_string(),
            }),
        }
    }
}

/// Output mode: `Console` prints records locally, `Server` feeds them
/// into the batching pipeline.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Console,
    Server,
}

impl FromStr for Mode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Mode::Console),
            "server" => Ok(Mode::Server),
            _ => Err(ParseEnumError {
                kind: "mode",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_strictly_increasing() {
        let levels = [
            Level::All,
            Level::Debug,
            Level::Info,
            Level::Notice,
            Level::Warning,
            Level::Error,
            Level::Critical,
            Level::Alert,
            Level::Emergency,
            Level::Off,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn level_names_round_trip() {
        for level in [Level::Debug, Level::Warning, Level::Emergency] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("verbose".parse::<Level>().is_err());
        assert!("desktop".parse::<Source>().is_err());
        assert!("file".parse::<Mode>().is_err());
        assert_eq!("web-wechat".parse::<Source>().unwrap(), Source::WebWeChat);
    }
}
