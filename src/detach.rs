use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, close, fork, setsid};

use crate::error::SwitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkRole {
    Parent,
    Daemon,
}

/// Must run before any thread is spawned.
pub fn detach() -> Result<ForkRole, SwitchError> {
    // SAFETY: the process is still single-threaded at this point.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => return Ok(ForkRole::Parent),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(SwitchError::FatalSetup(format!("fork failed: {e}"))),
    }

    for fd in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
        let _ = close(fd);
    }

    umask(Mode::empty());

    setsid().map_err(|e| SwitchError::FatalSetup(format!("setsid failed: {e}")))?;
    chdir("/").map_err(|e| SwitchError::FatalSetup(format!("chdir to / failed: {e}")))?;

    Ok(ForkRole::Daemon)
}
