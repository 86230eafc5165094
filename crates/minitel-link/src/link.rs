//! A live connection to one terminal and the commands it accepts.

use std::io::{self, Read, Write};
use std::path::Path;

use minitel_vt::attr::{CharSize, Color, INVERSE_OFF, INVERSE_ON};
use minitel_vt::codec::{self, CodecError};
use minitel_vt::control::{self, COFF, CON, FF, PRO2, PRO3, PROG};
use minitel_vt::keys::{FunctionKey, KeyDecoder, KeyEvent};

use crate::serial::SerialPort;

/// Errors from link operations.
#[derive(Debug)]
pub enum LinkError {
    /// The terminal only switches to 300, 1200 or 4800 bit/s.
    UnsupportedBaudRate(u32),
    /// The link was closed.
    LinkClosed,
    Codec(CodecError),
    Io(io::Error),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::UnsupportedBaudRate(rate) => write!(
                f,
                "baud rate cannot be set to {rate}, valid values are 300, 1200 and 4800"
            ),
            LinkError::LinkClosed => write!(f, "link is closed"),
            LinkError::Codec(err) => write!(f, "encoding error: {err}"),
            LinkError::Io(err) => write!(f, "link I/O error: {err}"),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Codec(err) => Some(err),
            LinkError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        LinkError::Io(err)
    }
}

impl From<CodecError> for LinkError {
    fn from(err: CodecError) -> Self {
        LinkError::Codec(err)
    }
}

/// Serial speeds the terminal can be switched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaudRate {
    B300,
    B1200,
    B4800,
}

impl BaudRate {
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B300 => 300,
            BaudRate::B1200 => 1200,
            BaudRate::B4800 => 4800,
        }
    }

    /// 3-bit speed code used by the `PROG` command.
    pub const fn code(self) -> u8 {
        match self {
            BaudRate::B300 => 2,
            BaudRate::B1200 => 4,
            BaudRate::B4800 => 6,
        }
    }

    /// Argument byte of the `PROG` command: the code sits in both the
    /// emission and reception nibbles.
    pub const fn control_byte(self) -> u8 {
        let code = self.code();
        (1 << 6) | (code << 3) | code
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = LinkError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        match rate {
            300 => Ok(BaudRate::B300),
            1200 => Ok(BaudRate::B1200),
            4800 => Ok(BaudRate::B4800),
            other => Err(LinkError::UnsupportedBaudRate(other)),
        }
    }
}

/// The duplex byte stream under a [`TerminalLink`].
pub trait LinkPort: Read + Write + Send {
    /// Switch the local side of the line to a new speed.
    fn set_baud_rate(&mut self, rate: BaudRate) -> io::Result<()>;

    /// Drop bytes received but not read yet.
    fn discard_input(&mut self) -> io::Result<()>;
}

/// Owns the connection to one Minitel.
///
/// Every write is flushed before returning: at these speeds a byte left in a
/// buffer is a visible delay on screen.
pub struct TerminalLink {
    port: Option<Box<dyn LinkPort>>,
    baud_rate: BaudRate,
}

impl TerminalLink {
    /// Open the serial device at `path`, already set to `rate` on both ends.
    pub fn open(path: impl AsRef<Path>, rate: BaudRate) -> Result<Self, LinkError> {
        let port = SerialPort::open(path, rate)?;
        Ok(Self::with_port(Box::new(port), rate))
    }

    /// Wrap an already configured port.
    pub fn with_port(port: Box<dyn LinkPort>, baud_rate: BaudRate) -> Self {
        Self {
            port: Some(port),
            baud_rate,
        }
    }

    fn port(&mut self) -> Result<&mut (dyn LinkPort + 'static), LinkError> {
        self.port.as_deref_mut().ok_or(LinkError::LinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.port.is_none()
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.baud_rate
    }

    /// Switch the terminal and then the local port to `rate` bit/s.
    ///
    /// A closed link reports [`LinkError::LinkClosed`] first; an unsupported
    /// rate is then rejected before anything is sent.
    pub fn set_baud_rate(&mut self, rate: u32) -> Result<(), LinkError> {
        self.port()?;
        let rate = BaudRate::try_from(rate)?;
        let mut command = PRO2.to_vec();
        command.extend_from_slice(&[PROG, rate.control_byte()]);
        self.write_bytes(&command)?;

        self.port()?.set_baud_rate(rate)?;
        self.baud_rate = rate;
        log::info!("link speed set to {} bit/s", rate.bits_per_second());
        Ok(())
    }

    /// Write raw bytes and flush them.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        log::trace!("sent {} bytes", bytes.len());
        Ok(())
    }

    /// Encode and write text. Nothing is sent if any character is
    /// unsupported.
    pub fn write_text(&mut self, text: &str) -> Result<(), LinkError> {
        self.port()?;
        let bytes = codec::encode(text)?;
        self.write_bytes(&bytes)
    }

    pub fn cursor_visible(&mut self, visible: bool) -> Result<(), LinkError> {
        self.write_bytes(&[if visible { CON } else { COFF }])
    }

    /// Turn the terminal's local echo of typed keys on or off.
    pub fn local_echo(&mut self, enabled: bool) -> Result<(), LinkError> {
        let mut command = PRO3.to_vec();
        command.extend_from_slice(&[if enabled { 0x61 } else { 0x60 }, 0x5A, 0x51]);
        self.write_bytes(&command)
    }

    pub fn clear_screen(&mut self) -> Result<(), LinkError> {
        self.write_bytes(&[FF])
    }

    /// Move the cursor to a 1-indexed cell.
    pub fn move_cursor(&mut self, column: u8, row: u8) -> Result<(), LinkError> {
        self.write_bytes(&control::cursor_position(column, row))
    }

    pub fn set_foreground(&mut self, color: Color) -> Result<(), LinkError> {
        self.write_bytes(&color.foreground())
    }

    pub fn set_char_size(&mut self, size: CharSize) -> Result<(), LinkError> {
        self.write_bytes(&size.sequence())
    }

    pub fn inverse(&mut self, enabled: bool) -> Result<(), LinkError> {
        self.write_bytes(if enabled { &INVERSE_ON } else { &INVERSE_OFF })
    }

    /// Drop keys typed before the caller was ready for them.
    pub fn discard_input(&mut self) -> Result<(), LinkError> {
        self.port()?.discard_input()?;
        Ok(())
    }

    /// Block until the next key event.
    pub fn next_event(&mut self) -> Result<KeyEvent, LinkError> {
        let port = self.port()?;
        Ok(KeyDecoder::new(port).next_event()?)
    }

    /// Read raw bytes up to the ENVOI key, which is not included.
    pub fn read_until_send(&mut self) -> Result<Vec<u8>, LinkError> {
        let terminator = FunctionKey::SEND.code();
        let port = self.port()?;
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        while !bytes.ends_with(&terminator) {
            port.read_exact(&mut byte)?;
            bytes.push(byte[0]);
        }
        bytes.truncate(bytes.len() - terminator.len());
        Ok(bytes)
    }

    /// Release the port. Every later operation fails with
    /// [`LinkError::LinkClosed`].
    pub fn close(&mut self) -> Result<(), LinkError> {
        let mut port = self.port.take().ok_or(LinkError::LinkClosed)?;
        port.flush()?;
        log::info!("link closed");
        Ok(())
    }
}
