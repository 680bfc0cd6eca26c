pub mod backend;
pub mod cli;
pub mod config;
pub mod detach;
pub mod error;
pub mod gpio;
pub mod lifecycle;
pub mod logging;
pub mod poweroff;
pub mod signals;

pub use backend::{GpioCall, MockGpioBackend, SysfsGpioBackend};
pub use cli::{Options, USAGE};
pub use config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, SWITCH_INPUT_LINE, SWITCH_OUTPUT_LINE, SwitchConfig,
};
pub use detach::{ForkRole, detach};
pub use error::SwitchError;
pub use gpio::{
    Direction, EdgeDetect, EdgeSource, GpioBackend, Level, WAIT_FAILED, wait_result_code,
    wait_until_high,
};
pub use lifecycle::{Lifecycle, RunReport};
pub use poweroff::{PowerOff, ShellPowerOff, Sleeper, ThreadSleeper};
pub use signals::{Disposition, SignalDisposition, TerminateSignals};
