mod common;

use std::sync::Arc;
use std::time::Duration;

use mausberry_switch::{
    Direction, EdgeDetect, GpioCall, Level, Lifecycle, MockGpioBackend, RunReport,
    SWITCH_INPUT_LINE, SWITCH_OUTPUT_LINE,
};

use common::{RecordingPowerOff, RecordingSleeper, config_file};

struct Harness {
    backend: Arc<MockGpioBackend>,
    sleeper: Arc<RecordingSleeper>,
    power: Arc<RecordingPowerOff>,
}

impl Harness {
    fn new(backend: MockGpioBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            sleeper: Arc::new(RecordingSleeper::default()),
            power: Arc::new(RecordingPowerOff::default()),
        }
    }

    fn run(&self, config_path: &std::path::Path) -> RunReport {
        Lifecycle::new(self.backend.clone(), config_path)
            .with_sleeper(self.sleeper.clone())
            .with_power_off(self.power.clone())
            .run()
    }
}

#[test]
fn full_sequence_from_press_to_power_off() {
    let (_dir, path) = config_file("delay = 3;\n");
    let harness = Harness::new(MockGpioBackend::new());
    harness
        .backend
        .push_readings(SWITCH_OUTPUT_LINE, [Level::Low, Level::High]);

    let report = harness.run(&path);

    assert_eq!(
        report,
        RunReport {
            delay: 3,
            wait_code: 1
        }
    );
    assert_eq!(
        harness.backend.calls(),
        vec![
            GpioCall::Unexport(SWITCH_OUTPUT_LINE),
            GpioCall::Unexport(SWITCH_INPUT_LINE),
            GpioCall::Export(SWITCH_OUTPUT_LINE),
            GpioCall::Export(SWITCH_INPUT_LINE),
            GpioCall::SetDirection(SWITCH_OUTPUT_LINE, Direction::In),
            GpioCall::SetDirection(SWITCH_INPUT_LINE, Direction::Out),
            GpioCall::WriteLevel(SWITCH_INPUT_LINE, Level::High),
            GpioCall::SetEdge(SWITCH_OUTPUT_LINE, EdgeDetect::Both),
            GpioCall::WaitForHigh(SWITCH_OUTPUT_LINE),
            GpioCall::Unexport(SWITCH_OUTPUT_LINE),
            GpioCall::Unexport(SWITCH_INPUT_LINE),
        ]
    );
    assert_eq!(harness.backend.notifications(SWITCH_OUTPUT_LINE), 2);
    assert!(!harness.backend.is_exported(SWITCH_OUTPUT_LINE));
    assert!(!harness.backend.is_exported(SWITCH_INPUT_LINE));
    assert_eq!(harness.sleeper.sleeps(), vec![Duration::from_secs(3)]);
    assert_eq!(harness.power.invocations(), 1);
}

#[test]
fn stale_exports_are_reset_before_setup() {
    let (_dir, path) = config_file("delay = 0;");
    let backend = MockGpioBackend::new()
        .with_exported(SWITCH_OUTPUT_LINE)
        .with_exported(SWITCH_INPUT_LINE);
    let harness = Harness::new(backend);
    harness.backend.push_readings(SWITCH_OUTPUT_LINE, [Level::High]);

    let report = harness.run(&path);

    assert_eq!(report.wait_code, 1);
    let calls = harness.backend.calls();
    assert_eq!(calls[0], GpioCall::Unexport(SWITCH_OUTPUT_LINE));
    assert_eq!(calls[2], GpioCall::Export(SWITCH_OUTPUT_LINE));
    assert_eq!(harness.power.invocations(), 1);
}

#[test]
fn failed_export_still_reaches_power_off() {
    let (_dir, path) = config_file("delay = 1;");
    let harness = Harness::new(MockGpioBackend::new());
    harness.backend.fail_on(GpioCall::Export(SWITCH_INPUT_LINE));
    harness
        .backend
        .push_readings(SWITCH_OUTPUT_LINE, [Level::Low, Level::High]);

    let report = harness.run(&path);

    assert_eq!(report.wait_code, 1);
    let calls = harness.backend.calls();
    for expected in [
        GpioCall::SetDirection(SWITCH_INPUT_LINE, Direction::Out),
        GpioCall::WriteLevel(SWITCH_INPUT_LINE, Level::High),
        GpioCall::SetEdge(SWITCH_OUTPUT_LINE, EdgeDetect::Both),
        GpioCall::WaitForHigh(SWITCH_OUTPUT_LINE),
    ] {
        assert!(calls.contains(&expected), "missing {expected:?}");
    }
    assert_eq!(calls.last(), Some(&GpioCall::Unexport(SWITCH_INPUT_LINE)));
    assert_eq!(harness.sleeper.sleeps(), vec![Duration::from_secs(1)]);
    assert_eq!(harness.power.invocations(), 1);
}

#[test]
fn failed_wait_logs_sentinel_and_still_powers_off() {
    let (_dir, path) = config_file("delay = 2;");
    let harness = Harness::new(MockGpioBackend::new());
    harness
        .backend
        .fail_on(GpioCall::SetEdge(SWITCH_OUTPUT_LINE, EdgeDetect::Both));

    let report = harness.run(&path);

    assert_eq!(
        report,
        RunReport {
            delay: 2,
            wait_code: -1
        }
    );
    assert_eq!(harness.power.invocations(), 1);
}

#[test]
fn unreadable_config_defaults_to_no_delay() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(MockGpioBackend::new());
    harness.backend.push_readings(SWITCH_OUTPUT_LINE, [Level::High]);

    let report = harness.run(&dir.path().join("missing.conf"));

    assert_eq!(report.delay, 0);
    assert_eq!(harness.sleeper.sleeps(), vec![Duration::ZERO]);
    assert_eq!(harness.power.invocations(), 1);
}

#[test]
fn input_line_is_an_output_before_it_is_driven() {
    let (_dir, path) = config_file("delay = 0;");
    let harness = Harness::new(MockGpioBackend::new());
    harness.backend.push_readings(SWITCH_OUTPUT_LINE, [Level::High]);

    harness.run(&path);

    let calls = harness.backend.calls();
    let position = |call: GpioCall| calls.iter().position(|c| *c == call).unwrap();
    assert!(
        position(GpioCall::SetDirection(SWITCH_INPUT_LINE, Direction::Out))
            < position(GpioCall::WriteLevel(SWITCH_INPUT_LINE, Level::High))
    );
    assert!(
        position(GpioCall::SetEdge(SWITCH_OUTPUT_LINE, EdgeDetect::Both))
            < position(GpioCall::WaitForHigh(SWITCH_OUTPUT_LINE))
    );
}
