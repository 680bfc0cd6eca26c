use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Fatal setup error: {0}")]
    FatalSetup(String),
}

impl SwitchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SwitchError::Io {
            path: path.into(),
            source,
        }
    }
}
