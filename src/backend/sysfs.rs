use log::warn;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use crate::error::SwitchError;
use crate::gpio::{Direction, EdgeDetect, EdgeSource, GpioBackend, Level, wait_until_high};

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

const SYSFS_VALUE_BUFFER_SIZE: usize = 64;

pub struct SysfsGpioBackend {
    root: PathBuf,
}

impl Default for SysfsGpioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpioBackend {
    pub fn new() -> Self {
        Self::with_root(SYSFS_GPIO_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_attr(&self, line: u32, attr: &str) -> PathBuf {
        self.root.join(format!("gpio{line}")).join(attr)
    }

    fn write_control(&self, path: &Path, token: &[u8], what: &str) -> Result<(), SwitchError> {
        let mut file = OpenOptions::new().write(true).open(path).map_err(|e| {
            warn!("Failed to open {what} for writing: {e}");
            SwitchError::io(path, e)
        })?;

        let written = file.write(token).map_err(|e| {
            warn!("Failed to write {what}: {e}");
            SwitchError::io(path, e)
        })?;
        if written != token.len() {
            warn!("Short write to {what}: {written} of {} bytes", token.len());
            return Err(SwitchError::io(
                path,
                io::Error::new(io::ErrorKind::WriteZero, "short write"),
            ));
        }
        Ok(())
    }
}

impl GpioBackend for SysfsGpioBackend {
    fn export(&self, line: u32) -> Result<(), SwitchError> {
        let path = self.root.join("export");
        self.write_control(&path, line.to_string().as_bytes(), "export")
    }

    fn unexport(&self, line: u32) -> Result<(), SwitchError> {
        let path = self.root.join("unexport");
        self.write_control(&path, line.to_string().as_bytes(), "unexport")
    }

    fn set_direction(&self, line: u32, direction: Direction) -> Result<(), SwitchError> {
        let path = self.line_attr(line, "direction");
        self.write_control(&path, direction.as_str().as_bytes(), "gpio direction")
    }

    fn set_edge(&self, line: u32, edge: EdgeDetect) -> Result<(), SwitchError> {
        let path = self.line_attr(line, "edge");
        self.write_control(&path, edge.as_str().as_bytes(), "gpio edge")
    }

    fn write_level(&self, line: u32, level: Level) -> Result<(), SwitchError> {
        let path = self.line_attr(line, "value");
        self.write_control(&path, &[level.as_byte()], "gpio value")
    }

    fn wait_for_high(&self, line: u32) -> Result<Level, SwitchError> {
        let mut source = ValueFile::open(self.line_attr(line, "value"))?;
        wait_until_high(&mut source)
    }
}

pub struct ValueFile {
    path: PathBuf,
    file: File,
}

impl ValueFile {
    pub fn open(path: PathBuf) -> Result<Self, SwitchError> {
        let file = File::open(&path).map_err(|e| {
            warn!("Failed to open gpio value for reading: {e}");
            SwitchError::io(&path, e)
        })?;
        Ok(Self { path, file })
    }
}

impl EdgeSource for ValueFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn wait(&mut self) -> Result<PollFlags, Errno> {
        let mut fds = [PollFd::new(
            self.file.as_fd(),
            PollFlags::POLLPRI | PollFlags::POLLERR,
        )];
        poll(&mut fds, PollTimeout::NONE)?;
        Ok(fds[0].revents().unwrap_or_else(PollFlags::empty))
    }

    fn read_from_start(&mut self) -> io::Result<String> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buffer = [0u8; SYSFS_VALUE_BUFFER_SIZE];
        let n = self.file.read(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    }
}
