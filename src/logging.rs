use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};

use crate::error::SwitchError;

pub const SYSLOG_IDENT: &str = "mausberry-switch";

// Call after detaching so the logged pid is the daemon's.
pub fn init_syslog() -> Result<(), SwitchError> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: SYSLOG_IDENT.into(),
        pid: std::process::id(),
    };
    let logger = syslog::unix(formatter)
        .map_err(|e| SwitchError::FatalSetup(format!("open syslog: {e}")))?;
    log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
        .map(|()| log::set_max_level(LevelFilter::Info))
        .map_err(|e| SwitchError::FatalSetup(format!("install syslog logger: {e}")))
}

pub fn init_stderr() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
