use log::warn;
use std::process::ExitCode;
use std::sync::Arc;

use mausberry_switch::{
    CONFIG_PATH_ENV, ForkRole, Lifecycle, Options, SignalDisposition, SysfsGpioBackend, USAGE,
    detach, logging, signals,
};

fn main() -> ExitCode {
    let options = match Options::parse(
        std::env::args().skip(1),
        std::env::var(CONFIG_PATH_ENV).ok(),
    ) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let terminate_signals = match SignalDisposition::daemon().install() {
        Ok(signals) => Some(signals),
        Err(e) => {
            eprintln!("Failed to install signal handlers: {e}");
            None
        }
    };

    if options.foreground {
        logging::init_stderr();
    } else {
        match detach() {
            Ok(ForkRole::Parent) => return ExitCode::SUCCESS,
            Ok(ForkRole::Daemon) => {}
            Err(_) => return ExitCode::FAILURE,
        }
        // stderr is closed; without syslog the daemon still runs, silently
        let _ = logging::init_syslog();
    }

    if let Some(terminate_signals) = terminate_signals
        && let Err(e) = terminate_signals.spawn_watcher(signals::terminate)
    {
        warn!("Failed to start signal watcher: {e}");
    }

    let backend = Arc::new(SysfsGpioBackend::new());
    Lifecycle::new(backend, options.config_path).run();

    ExitCode::SUCCESS
}
