pub mod libconfig;

use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;

use crate::error::SwitchError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/mausberry-switch.conf";
pub const CONFIG_PATH_ENV: &str = "MAUSBERRY_SWITCH_CONFIG";

// Line names follow the switch's side: the daemon reads the switch's output
// and drives the switch's input.
pub const SWITCH_OUTPUT_LINE: u32 = 23;
pub const SWITCH_INPUT_LINE: u32 = 24;

#[derive(Debug, Deserialize)]
struct RawSettings {
    delay: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchConfig {
    pub delay: u64,
}

impl SwitchConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SwitchError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            SwitchError::Config(format!("{}:0 - failed to read config: {e}", path.display()))
        })?;
        Self::parse(&contents).map_err(|e| match e {
            ParseFailure::Syntax(e) => {
                SwitchError::Config(format!("{}:{} - {}", path.display(), e.line, e.message))
            }
            ParseFailure::Setting(msg) => SwitchError::Config(msg),
        })
    }

    fn parse(text: &str) -> Result<Self, ParseFailure> {
        let settings = libconfig::parse(text).map_err(ParseFailure::Syntax)?;
        let raw: RawSettings = serde_json::from_value(settings.into())
            .map_err(|e| ParseFailure::Setting(format!("invalid 'delay' setting: {e}")))?;

        match raw.delay {
            None => Err(ParseFailure::Setting("'delay' value not found".into())),
            Some(delay) => u64::try_from(delay)
                .map(|delay| SwitchConfig { delay })
                .map_err(|_| {
                    ParseFailure::Setting(format!("'delay' must not be negative, got {delay}"))
                }),
        }
    }
}

enum ParseFailure {
    Syntax(libconfig::ParseError),
    Setting(String),
}

impl FromStr for SwitchConfig {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).map_err(|e| match e {
            ParseFailure::Syntax(e) => SwitchError::Config(e.to_string()),
            ParseFailure::Setting(msg) => SwitchError::Config(msg),
        })
    }
}
