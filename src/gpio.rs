use std::fmt;
use std::io;
use std::path::Path;

use log::{debug, warn};
use nix::errno::Errno;
use nix::poll::PollFlags;

use crate::error::SwitchError;

pub const WAIT_FAILED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDetect {
    None,
    Rising,
    Falling,
    Both,
}

impl EdgeDetect {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeDetect::None => "none",
            EdgeDetect::Rising => "rising",
            EdgeDetect::Falling => "falling",
            EdgeDetect::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn value(&self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    pub fn as_byte(&self) -> u8 {
        b'0' + self.value()
    }

    // Non-numeric text reads as zero, like atoi.
    pub fn parse_reading(text: &str) -> Option<Level> {
        match leading_int(text) {
            0 => Some(Level::Low),
            1 => Some(Level::High),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative { -value } else { value }
}

pub trait GpioBackend: Send + Sync {
    fn export(&self, line: u32) -> Result<(), SwitchError>;
    fn unexport(&self, line: u32) -> Result<(), SwitchError>;
    fn set_direction(&self, line: u32, direction: Direction) -> Result<(), SwitchError>;
    fn set_edge(&self, line: u32, edge: EdgeDetect) -> Result<(), SwitchError>;
    fn write_level(&self, line: u32, level: Level) -> Result<(), SwitchError>;
    /// Blocks until the line reads HIGH. Never returns on a LOW reading.
    fn wait_for_high(&self, line: u32) -> Result<Level, SwitchError>;
}

pub fn wait_result_code(result: &Result<Level, SwitchError>) -> i32 {
    match result {
        Ok(level) => i32::from(level.value()),
        Err(_) => WAIT_FAILED,
    }
}

pub trait EdgeSource {
    fn path(&self) -> &Path;
    fn wait(&mut self) -> Result<PollFlags, Errno>;
    fn read_from_start(&mut self) -> io::Result<String>;
}

fn is_transient(errno: Errno) -> bool {
    matches!(errno, Errno::EAGAIN | Errno::EINTR | Errno::EINVAL)
}

pub fn wait_until_high<S: EdgeSource>(source: &mut S) -> Result<Level, SwitchError> {
    loop {
        let events = match source.wait() {
            Ok(events) => events,
            Err(errno) if is_transient(errno) => {
                debug!("transient poll error on {}: {errno}", source.path().display());
                continue;
            }
            Err(errno) => {
                warn!("An error occurred while polling the switch: {errno}");
                return Err(SwitchError::io(source.path(), io::Error::from(errno)));
            }
        };

        if !events.contains(PollFlags::POLLPRI) {
            continue;
        }

        let text = source.read_from_start().map_err(|e| {
            warn!("Failed to read switch value: {e}");
            SwitchError::io(source.path(), e)
        })?;

        match Level::parse_reading(&text) {
            Some(Level::High) => return Ok(Level::High),
            Some(Level::Low) => debug!("switch reads low, waiting"),
            None => debug!("ignoring switch reading {:?}", text.trim()),
        }
    }
}
