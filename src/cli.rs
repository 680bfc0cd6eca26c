use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

pub const USAGE: &str = "usage: mausberry-switch [-f|--foreground] [CONFIG]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub foreground: bool,
    pub config_path: PathBuf,
}

impl Options {
    pub fn parse<I>(args: I, env_config: Option<String>) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut foreground = false;
        let mut config_path = None;

        for arg in args {
            match arg.as_str() {
                "-f" | "--foreground" => foreground = true,
                flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
                _ if config_path.is_some() => {
                    return Err(format!("unexpected argument '{arg}'"));
                }
                _ => config_path = Some(arg),
            }
        }

        let config_path = config_path
            .or(env_config)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        Ok(Self {
            foreground,
            config_path: PathBuf::from(config_path),
        })
    }
}
