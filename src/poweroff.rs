use log::{info, warn};
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const POWEROFF_COMMAND: &str = "poweroff";

pub trait PowerOff: Send + Sync {
    fn power_off(&self);
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

impl<T: PowerOff + ?Sized> PowerOff for Arc<T> {
    fn power_off(&self) {
        (**self).power_off()
    }
}

impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

pub struct ShellPowerOff {
    command: String,
}

impl Default for ShellPowerOff {
    fn default() -> Self {
        Self::new(POWEROFF_COMMAND)
    }
}

impl ShellPowerOff {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PowerOff for ShellPowerOff {
    fn power_off(&self) {
        // SIGCHLD is ignored, so the child is reaped by the kernel and
        // cannot be waited on
        match Command::new("/bin/sh").arg("-c").arg(&self.command).spawn() {
            Ok(child) => info!("Started '{}' as pid {}", self.command, child.id()),
            Err(e) => warn!("Failed to run '{}': {e}", self.command),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
