//! Classification of keyboard bytes into key events.

use std::io::{self, Read};

use crate::codec::{self, DIACRITICS};
use crate::control::{ESC, SEP, SS2};

/// A Minitel function key, identified by the byte that follows `SEP`.
///
/// Any byte is accepted; the associated constants name the keys found on
/// the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionKey(pub u8);

impl FunctionKey {
    /// ENVOI.
    pub const SEND: Self = Self(0x41);
    /// RETOUR.
    pub const BACK: Self = Self(0x42);
    /// REPETITION.
    pub const REPEAT: Self = Self(0x43);
    /// GUIDE.
    pub const GUIDE: Self = Self(0x44);
    /// ANNULATION.
    pub const CANCEL: Self = Self(0x45);
    /// SOMMAIRE.
    pub const INDEX: Self = Self(0x46);
    /// CORRECTION.
    pub const CORRECTION: Self = Self(0x47);
    /// SUITE.
    pub const NEXT: Self = Self(0x48);
    /// CONNEXION/FIN.
    pub const HANGUP: Self = Self(0x59);

    /// The two bytes the keyboard sends for this key.
    pub const fn code(self) -> [u8; 2] {
        [SEP, self.0]
    }
}

/// One decoded keyboard input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    /// A displayable character, accented letters already composed.
    Printable(char),
    Function(FunctionKey),
    Escape,
    /// Line noise or a code with no meaning; callers drop it.
    Invalid,
}

/// Reads key events from a blocking byte source, one byte at a time.
pub struct KeyDecoder<R> {
    source: R,
}

impl<R: Read> KeyDecoder<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Block until the next complete key event.
    ///
    /// Only I/O failures (including end of input) are errors; unknown codes
    /// come back as [`KeyEvent::Invalid`].
    pub fn next_event(&mut self) -> io::Result<KeyEvent> {
        let first = self.read_byte()?;
        if let Some(c) = codec::decode_glyph(&[first]) {
            return Ok(KeyEvent::Printable(c));
        }

        match first {
            SS2 => self.next_shifted(),
            SEP => Ok(KeyEvent::Function(FunctionKey(self.read_byte()?))),
            ESC => Ok(KeyEvent::Escape),
            other => {
                log::trace!("dropping unknown key byte {other:#04x}");
                Ok(KeyEvent::Invalid)
            }
        }
    }

    /// Decode what follows an `SS2` introducer.
    fn next_shifted(&mut self) -> io::Result<KeyEvent> {
        let second = self.read_byte()?;
        if let Some(c) = codec::decode_glyph(&[SS2, second]) {
            return Ok(KeyEvent::Printable(c));
        }
        if !DIACRITICS.contains(&second) {
            log::trace!("dropping unknown shifted code {second:#04x}");
            return Ok(KeyEvent::Invalid);
        }

        // An accent the base letter cannot take still yields the letter.
        let base = self.read_byte()?;
        let event = codec::decode_glyph(&[SS2, second, base])
            .or_else(|| codec::decode_glyph(&[base]))
            .map_or(KeyEvent::Invalid, KeyEvent::Printable);
        Ok(event)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.source.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}
