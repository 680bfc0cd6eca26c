mod common;

use std::fs::{self, File};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use mausberry_switch::{ForkRole, detach};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{getpid, getsid};

use common::{is_child, rerun_in_child, wait_for_file};

const REPORT_ENV: &str = "MAUSBERRY_SWITCH_DETACH_REPORT";

// Child side: the launching process exits 0, the daemon records what it sees.
fn detach_and_report() -> ! {
    let report = PathBuf::from(std::env::var_os(REPORT_ENV).expect("report path"));
    match detach() {
        Ok(ForkRole::Parent) => std::process::exit(0),
        Ok(ForkRole::Daemon) => {}
        Err(_) => std::process::exit(1),
    }

    let session_leader = getsid(None).ok() == Some(getpid());
    let cwd = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let mask = umask(Mode::empty()).bits();

    let partial = report.with_extension("partial");
    let Ok(mut file) = File::create(&partial) else {
        std::process::exit(1);
    };
    let first_fd = file.as_raw_fd();
    let _ = write!(
        file,
        "session_leader={session_leader}\ncwd={cwd}\numask={mask:o}\nfirst_fd={first_fd}\n"
    );
    let _ = fs::rename(&partial, &report);
    std::process::exit(0);
}

#[test]
fn detached_daemon_leads_a_new_session_at_root() {
    const TEST: &str = "detached_daemon_leads_a_new_session_at_root";
    if is_child(TEST) {
        detach_and_report();
    }

    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report");
    let status = rerun_in_child(TEST, &[(REPORT_ENV, report.as_os_str())]);
    assert_eq!(status.code(), Some(0), "launching process ended with {status}");

    wait_for_file(&report);
    let lines: Vec<String> = fs::read_to_string(&report)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(
        lines,
        vec![
            "session_leader=true",
            "cwd=/",
            "umask=0",
            // stdin was closed, so the first new descriptor reuses it
            "first_fd=0",
        ]
    );
}
