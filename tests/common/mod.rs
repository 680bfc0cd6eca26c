#![allow(dead_code)]

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use mausberry_switch::{PowerOff, Sleeper};
use parking_lot::Mutex;
use tempfile::TempDir;

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

#[derive(Default)]
pub struct RecordingPowerOff {
    invocations: Mutex<usize>,
}

impl RecordingPowerOff {
    pub fn invocations(&self) -> usize {
        *self.invocations.lock()
    }
}

impl PowerOff for RecordingPowerOff {
    fn power_off(&self) {
        *self.invocations.lock() += 1;
    }
}

/// Writes `contents` to a config file inside a fresh temporary directory.
pub fn config_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("mausberry-switch.conf");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

const CHILD_TEST_ENV: &str = "MAUSBERRY_SWITCH_CHILD_TEST";

/// True inside the process started by [`rerun_in_child`] for `test`.
pub fn is_child(test: &str) -> bool {
    std::env::var(CHILD_TEST_ENV).as_deref() == Ok(test)
}

/// Runs only `test` from this test binary in a fresh process. Used for
/// tests that change process-wide state or end the process.
pub fn rerun_in_child(test: &str, envs: &[(&str, &OsStr)]) -> ExitStatus {
    let exe = std::env::current_exe().expect("test binary path");
    Command::new(exe)
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_TEST_ENV, test)
        .envs(envs.iter().copied())
        .status()
        .expect("spawn child test process")
}

pub fn wait_for_file(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        thread::sleep(Duration::from_millis(10));
    }
}
