use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SWITCH_INPUT_LINE, SWITCH_OUTPUT_LINE, SwitchConfig};
use crate::error::SwitchError;
use crate::gpio::{Direction, EdgeDetect, GpioBackend, Level, wait_result_code};
use crate::poweroff::{PowerOff, ShellPowerOff, Sleeper, ThreadSleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub delay: u64,
    pub wait_code: i32,
}

/// No step aborts the run: failures are logged and the next step runs.
pub struct Lifecycle<B: GpioBackend> {
    backend: Arc<B>,
    config_path: PathBuf,
    sleeper: Box<dyn Sleeper>,
    power: Box<dyn PowerOff>,
}

impl<B: GpioBackend> Lifecycle<B> {
    pub fn new(backend: Arc<B>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            config_path: config_path.into(),
            sleeper: Box::new(ThreadSleeper),
            power: Box::new(ShellPowerOff::default()),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_power_off(mut self, power: impl PowerOff + 'static) -> Self {
        self.power = Box::new(power);
        self
    }

    pub fn run(&self) -> RunReport {
        info!(
            "Mausberry switch daemon started. Config file: {}",
            self.config_path.display()
        );

        let config = self.load_config();
        self.reset_pins();
        self.setup_pins();
        let wait_code = self.wait_for_trigger();
        self.teardown_pins();
        self.delayed_shutdown(config.delay);

        RunReport {
            delay: config.delay,
            wait_code,
        }
    }

    fn load_config(&self) -> SwitchConfig {
        match SwitchConfig::load_from_file(&self.config_path) {
            Ok(config) => {
                info!("Mausberry switch shutdown delay: {} seconds", config.delay);
                config
            }
            Err(e) => {
                error!("Mausberry switch configuration error: {e}");
                warn!("Mausberry switch 'delay' value not found. Defaulting to 0 seconds.");
                SwitchConfig::default()
            }
        }
    }

    fn reset_pins(&self) {
        if !self.unexport_both() {
            warn!("GPIO pins not reset.");
        }
    }

    fn setup_pins(&self) {
        let exported = [SWITCH_OUTPUT_LINE, SWITCH_INPUT_LINE]
            .map(|line| logged(self.backend.export(line)));
        if exported.contains(&false) {
            warn!("GPIO pins not exported.");
        }

        let directions = [
            logged(self.backend.set_direction(SWITCH_OUTPUT_LINE, Direction::In)),
            logged(self.backend.set_direction(SWITCH_INPUT_LINE, Direction::Out)),
        ];
        if directions.contains(&false) {
            warn!("GPIO directions not set.");
        }

        if !logged(self.backend.write_level(SWITCH_INPUT_LINE, Level::High)) {
            warn!("GPIO not initialized.");
        }

        if !logged(self.backend.set_edge(SWITCH_OUTPUT_LINE, EdgeDetect::Both)) {
            warn!("GPIO not configured as interrupt.");
        }
    }

    fn wait_for_trigger(&self) -> i32 {
        let result = self.backend.wait_for_high(SWITCH_OUTPUT_LINE);
        if let Err(e) = &result {
            warn!("Waiting for the switch failed: {e}");
        }
        let code = wait_result_code(&result);
        info!("Received a {code} from gpiowait!");
        code
    }

    fn teardown_pins(&self) {
        if !self.unexport_both() {
            warn!("Could not unexport gpio pins before shutting down.");
        }
    }

    fn delayed_shutdown(&self, delay: u64) {
        info!("Waiting {delay} seconds before shutting down.");
        self.sleeper.sleep(Duration::from_secs(delay));
        info!("Shutting down.");
        self.power.power_off();
    }

    fn unexport_both(&self) -> bool {
        let results = [SWITCH_OUTPUT_LINE, SWITCH_INPUT_LINE]
            .map(|line| logged(self.backend.unexport(line)));
        !results.contains(&false)
    }
}

fn logged(result: Result<(), SwitchError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("{e}");
            false
        }
    }
}
