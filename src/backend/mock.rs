use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::sysfs::SYSFS_GPIO_ROOT;
use crate::error::SwitchError;
use crate::gpio::{Direction, EdgeDetect, GpioBackend, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioCall {
    Export(u32),
    Unexport(u32),
    SetDirection(u32, Direction),
    SetEdge(u32, EdgeDetect),
    WriteLevel(u32, Level),
    WaitForHigh(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLineState {
    pub direction: Direction,
    pub edge: EdgeDetect,
    pub level: Level,
}

impl Default for MockLineState {
    fn default() -> Self {
        Self {
            direction: Direction::In,
            edge: EdgeDetect::None,
            level: Level::Low,
        }
    }
}

#[derive(Default)]
struct MockState {
    lines: FxHashMap<u32, MockLineState>, // keyed by exported line id
    calls: Vec<GpioCall>,
    failures: FxHashSet<GpioCall>,
    readings: FxHashMap<u32, VecDeque<Level>>,
    notifications: FxHashMap<u32, usize>,
}

#[derive(Default)]
pub struct MockGpioBackend {
    state: Mutex<MockState>,
    readings_ready: Condvar,
}

impl MockGpioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exported(self, line: u32) -> Self {
        self.state.lock().lines.insert(line, MockLineState::default());
        self
    }

    pub fn fail_on(&self, call: GpioCall) {
        self.state.lock().failures.insert(call);
    }

    pub fn push_readings<I: IntoIterator<Item = Level>>(&self, line: u32, readings: I) {
        let mut state = self.state.lock();
        state.readings.entry(line).or_default().extend(readings);
        self.readings_ready.notify_all();
    }

    pub fn calls(&self) -> Vec<GpioCall> {
        self.state.lock().calls.clone()
    }

    pub fn line(&self, line: u32) -> Option<MockLineState> {
        self.state.lock().lines.get(&line).copied()
    }

    pub fn is_exported(&self, line: u32) -> bool {
        self.state.lock().lines.contains_key(&line)
    }

    pub fn notifications(&self, line: u32) -> usize {
        self.state.lock().notifications.get(&line).copied().unwrap_or(0)
    }

    fn begin(&self, call: GpioCall) -> Result<MutexGuard<'_, MockState>, SwitchError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failures.contains(&call) {
            return Err(SwitchError::io(
                call_path(call),
                io::Error::other("injected failure"),
            ));
        }
        Ok(state)
    }
}

fn call_path(call: GpioCall) -> PathBuf {
    let root = PathBuf::from(SYSFS_GPIO_ROOT);
    match call {
        GpioCall::Export(_) => root.join("export"),
        GpioCall::Unexport(_) => root.join("unexport"),
        GpioCall::SetDirection(line, _) => root.join(format!("gpio{line}/direction")),
        GpioCall::SetEdge(line, _) => root.join(format!("gpio{line}/edge")),
        GpioCall::WriteLevel(line, _) | GpioCall::WaitForHigh(line) => {
            root.join(format!("gpio{line}/value"))
        }
    }
}

fn os_error(call: GpioCall, errno: Errno) -> SwitchError {
    SwitchError::io(call_path(call), io::Error::from(errno))
}

fn exported_line(
    state: &mut MockState,
    call: GpioCall,
    line: u32,
) -> Result<&mut MockLineState, SwitchError> {
    state
        .lines
        .get_mut(&line)
        .ok_or_else(|| os_error(call, Errno::ENOENT))
}

impl GpioBackend for MockGpioBackend {
    fn export(&self, line: u32) -> Result<(), SwitchError> {
        let call = GpioCall::Export(line);
        let mut state = self.begin(call)?;
        if state.lines.contains_key(&line) {
            return Err(os_error(call, Errno::EBUSY));
        }
        state.lines.insert(line, MockLineState::default());
        Ok(())
    }

    fn unexport(&self, line: u32) -> Result<(), SwitchError> {
        let call = GpioCall::Unexport(line);
        let mut state = self.begin(call)?;
        state
            .lines
            .remove(&line)
            .map(|_| ())
            .ok_or_else(|| os_error(call, Errno::EINVAL))
    }

    fn set_direction(&self, line: u32, direction: Direction) -> Result<(), SwitchError> {
        let call = GpioCall::SetDirection(line, direction);
        let mut state = self.begin(call)?;
        let pin = exported_line(&mut state, call, line)?;
        pin.direction = direction;
        if direction == Direction::Out {
            pin.edge = EdgeDetect::None;
        }
        Ok(())
    }

    fn set_edge(&self, line: u32, edge: EdgeDetect) -> Result<(), SwitchError> {
        let call = GpioCall::SetEdge(line, edge);
        let mut state = self.begin(call)?;
        let pin = exported_line(&mut state, call, line)?;
        if pin.direction == Direction::Out && edge != EdgeDetect::None {
            return Err(os_error(call, Errno::EIO));
        }
        pin.edge = edge;
        Ok(())
    }

    fn write_level(&self, line: u32, level: Level) -> Result<(), SwitchError> {
        let call = GpioCall::WriteLevel(line, level);
        let mut state = self.begin(call)?;
        let pin = exported_line(&mut state, call, line)?;
        if pin.direction != Direction::Out {
            return Err(os_error(call, Errno::EPERM));
        }
        pin.level = level;
        Ok(())
    }

    fn wait_for_high(&self, line: u32) -> Result<Level, SwitchError> {
        let call = GpioCall::WaitForHigh(line);
        let mut state = self.begin(call)?;
        let pin = exported_line(&mut state, call, line)?;
        if pin.edge == EdgeDetect::None {
            return Err(os_error(call, Errno::EINVAL));
        }

        loop {
            let next = state.readings.get_mut(&line).and_then(VecDeque::pop_front);
            let Some(level) = next else {
                self.readings_ready.wait(&mut state);
                continue;
            };

            *state.notifications.entry(line).or_default() += 1;
            if let Some(pin) = state.lines.get_mut(&line) {
                pin.level = level;
            }
            if level == Level::High {
                return Ok(level);
            }
        }
    }
}
