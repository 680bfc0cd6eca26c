use log::{info, warn};
use std::io;
use std::thread::{self, JoinHandle};

use nix::libc::{self, c_int};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use signal_hook::iterator::Signals;

use crate::error::SwitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    Ignore,
    Terminate,
}

#[derive(Debug, Clone)]
pub struct SignalDisposition {
    table: Vec<(Signal, Disposition)>,
}

impl SignalDisposition {
    pub fn daemon() -> Self {
        let table = Signal::iterator()
            .filter(|sig| !matches!(sig, Signal::SIGKILL | Signal::SIGSTOP))
            .map(|sig| {
                let disposition = match sig {
                    Signal::SIGCHLD => Disposition::Ignore,
                    Signal::SIGHUP | Signal::SIGTERM => Disposition::Terminate,
                    _ => Disposition::Default,
                };
                (sig, disposition)
            })
            .collect();
        Self { table }
    }

    pub fn disposition(&self, signal: Signal) -> Disposition {
        self.table
            .iter()
            .find(|(sig, _)| *sig == signal)
            .map(|(_, d)| *d)
            .unwrap_or(Disposition::Default)
    }

    pub fn terminate_signals(&self) -> Vec<c_int> {
        self.table
            .iter()
            .filter(|(_, d)| *d == Disposition::Terminate)
            .map(|(sig, _)| *sig as c_int)
            .collect()
    }

    /// Terminate signals are queued in a self-pipe until
    /// [`TerminateSignals::spawn_watcher`] is called.
    pub fn install(&self) -> Result<TerminateSignals, SwitchError> {
        for (sig, disposition) in &self.table {
            let handler = match disposition {
                Disposition::Ignore => SigHandler::SigIgn,
                Disposition::Default | Disposition::Terminate => SigHandler::SigDfl,
            };
            let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
            // SAFETY: only the default and ignore dispositions are installed here.
            if let Err(e) = unsafe { sigaction(*sig, &action) } {
                warn!("Failed to reset disposition of {sig}: {e}");
            }
        }
        reset_realtime_signals();

        let signals = Signals::new(self.terminate_signals())
            .map_err(|e| SwitchError::io("signal handlers", e))?;
        Ok(TerminateSignals { signals })
    }
}

// nix's Signal has no real-time variants
#[cfg(target_os = "linux")]
fn reset_realtime_signals() {
    for sig in libc::SIGRTMIN()..=libc::SIGRTMAX() {
        // SAFETY: SIG_DFL installs no handler code.
        if unsafe { libc::signal(sig, libc::SIG_DFL) } == libc::SIG_ERR {
            warn!(
                "Failed to reset disposition of signal {sig}: {}",
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn reset_realtime_signals() {}

pub struct TerminateSignals {
    signals: Signals,
}

impl TerminateSignals {
    /// Must be called after any fork: threads do not survive it, the
    /// registered handlers and queued signals do.
    pub fn spawn_watcher<F>(self, mut on_terminate: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut(c_int) + Send + 'static,
    {
        let mut signals = self.signals;
        thread::Builder::new()
            .name("signal-watcher".into())
            .spawn(move || {
                for sig in signals.forever() {
                    on_terminate(sig);
                }
            })
    }
}

pub fn terminate(sig: c_int) {
    info!("Caught signal {sig}, terminating mausberry-switch daemon.");
    log::logger().flush();
    std::process::exit(0);
}
