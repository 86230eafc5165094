//! The tty a Minitel hangs off, configured for 7E1 raw I/O.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::sys::termios::{
    self, BaudRate as TermiosSpeed, ControlFlags, FlushArg, InputFlags, SetArg,
    SpecialCharacterIndices,
};

use crate::link::{BaudRate, LinkPort};

/// A tty device configured for the Minitel: raw, 7 data bits, even parity,
/// one stop bit, no flow control, fully blocking reads.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open and configure the device at `path`.
    pub fn open(path: impl AsRef<Path>, rate: BaudRate) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(nix::libc::O_NOCTTY)
            .open(path)?;

        let mut tio = termios::tcgetattr(&file)?;
        termios::cfmakeraw(&mut tio);
        tio.control_flags &= !(ControlFlags::CSIZE
            | ControlFlags::PARODD
            | ControlFlags::CSTOPB
            | ControlFlags::CRTSCTS);
        tio.control_flags |=
            ControlFlags::CS7 | ControlFlags::PARENB | ControlFlags::CREAD | ControlFlags::CLOCAL;
        // Parity is checked by the driver; hand us the 7 data bits only.
        tio.input_flags |= InputFlags::INPCK | InputFlags::ISTRIP;
        tio.input_flags &= !(InputFlags::IXON | InputFlags::IXOFF);
        tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::cfsetspeed(&mut tio, termios_speed(rate))?;
        termios::tcsetattr(&file, SetArg::TCSANOW, &tio)?;

        log::info!("opened {} at {} bit/s, 7E1", path.display(), rate.bits_per_second());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn termios_speed(rate: BaudRate) -> TermiosSpeed {
    match rate {
        BaudRate::B300 => TermiosSpeed::B300,
        BaudRate::B1200 => TermiosSpeed::B1200,
        BaudRate::B4800 => TermiosSpeed::B4800,
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    /// Block until every queued byte has left the UART.
    fn flush(&mut self) -> io::Result<()> {
        termios::tcdrain(&self.file)?;
        Ok(())
    }
}

impl LinkPort for SerialPort {
    fn set_baud_rate(&mut self, rate: BaudRate) -> io::Result<()> {
        termios::tcdrain(&self.file)?;
        let mut tio = termios::tcgetattr(&self.file)?;
        termios::cfsetspeed(&mut tio, termios_speed(rate))?;
        termios::tcsetattr(&self.file, SetArg::TCSANOW, &tio)?;
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        termios::tcflush(&self.file, FlushArg::TCIFLUSH)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let result = SerialPort::open("/nonexistent/ttyMINITEL", BaudRate::B1200);
        let err = result.err().expect("opening a missing device should fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_open_non_tty_fails() {
        // /dev/null is not a terminal: tcgetattr rejects it.
        let result = SerialPort::open("/dev/null", BaudRate::B1200);
        assert!(result.is_err(), "configuring a non-tty should fail");
    }

    #[test]
    fn test_termios_speed_mapping() {
        assert_eq!(termios_speed(BaudRate::B300), TermiosSpeed::B300);
        assert_eq!(termios_speed(BaudRate::B4800), TermiosSpeed::B4800);
    }
}
