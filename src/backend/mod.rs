pub mod mock;
pub mod sysfs;

pub use mock::{GpioCall, MockGpioBackend, MockLineState};
pub use sysfs::{SYSFS_GPIO_ROOT, SysfsGpioBackend, ValueFile};
