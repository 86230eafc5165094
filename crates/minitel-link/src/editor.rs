//! Bounded input field edited on the remote screen.
//!
//! The terminal has no notion of a field: it only shows what it is sent.
//! Placeholders, corrections and cancellation are all drawn from here by
//! overwriting cells, and the cursor is always brought back to where the
//! next character goes.

use minitel_vt::codec::{self, CodecError};
use minitel_vt::control::{BS, COFF, CON};
use minitel_vt::keys::{FunctionKey, KeyEvent};

use crate::link::{LinkError, TerminalLink};

pub const DEFAULT_PLACEHOLDER: char = '.';

const CR: u8 = 0x0D;

/// How an editing session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminator {
    /// ENVOI: accept the field.
    Send,
    /// Carriage return: accept and move on to the next field.
    Enter,
    /// RETOUR: abandon the field and go back.
    Back,
    /// CONNEXION/FIN: abandon the whole session.
    Hangup,
}

impl Terminator {
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        match event {
            KeyEvent::Printable('\r') => Some(Terminator::Enter),
            KeyEvent::Function(FunctionKey::SEND) => Some(Terminator::Send),
            KeyEvent::Function(FunctionKey::BACK) => Some(Terminator::Back),
            KeyEvent::Function(FunctionKey::HANGUP) => Some(Terminator::Hangup),
            _ => None,
        }
    }

    /// The bytes the keyboard sent for this terminator.
    pub fn code(self) -> &'static [u8] {
        const SEND: [u8; 2] = FunctionKey::SEND.code();
        const BACK: [u8; 2] = FunctionKey::BACK.code();
        const HANGUP: [u8; 2] = FunctionKey::HANGUP.code();
        match self {
            Terminator::Send => &SEND,
            Terminator::Enter => &[CR],
            Terminator::Back => &BACK,
            Terminator::Hangup => &HANGUP,
        }
    }

    pub fn is_abort(self) -> bool {
        matches!(self, Terminator::Back | Terminator::Hangup)
    }
}

/// Characters accepted so far, never more than `max_len` of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldBuffer {
    text: String,
    len: usize,
    max_len: usize,
}

impl FieldBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            text: String::new(),
            len: 0,
            max_len,
        }
    }

    /// Append `c` unless the buffer is full.
    pub fn push(&mut self, c: char) -> bool {
        if self.len >= self.max_len {
            return false;
        }
        self.text.push(c);
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> Option<char> {
        let c = self.text.pop()?;
        self.len -= 1;
        Some(c)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.len = 0;
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// An input field starting at the current cursor position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputField {
    max_len: usize,
    placeholder: char,
}

impl InputField {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            placeholder: DEFAULT_PLACEHOLDER,
        }
    }

    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Run the field until a terminator key and return what was typed.
    ///
    /// Blocks on the link; there is no timeout and no other way out.
    pub fn read(&self, link: &mut TerminalLink) -> Result<(String, Terminator), LinkError> {
        if link.is_closed() {
            return Err(LinkError::LinkClosed);
        }
        let placeholder = codec::glyph(self.placeholder)
            .ok_or(CodecError::UnsupportedCharacter(self.placeholder))?;

        link.discard_input()?;
        let mut prelude = vec![COFF];
        prelude.extend(self.blank_field(placeholder));
        prelude.push(CON);
        link.write_bytes(&prelude)?;

        let mut buffer = FieldBuffer::new(self.max_len);
        loop {
            let event = link.next_event()?;
            if let Some(terminator) = Terminator::from_event(event) {
                log::debug!("field ended by {terminator:?} with {} chars", buffer.len());
                return Ok((buffer.into_string(), terminator));
            }

            match event {
                KeyEvent::Function(FunctionKey::CORRECTION) => {
                    if buffer.pop().is_some() {
                        let mut erase = vec![BS];
                        erase.extend_from_slice(placeholder);
                        erase.push(BS);
                        link.write_bytes(&erase)?;
                    }
                }
                KeyEvent::Function(FunctionKey::CANCEL) => {
                    let mut rewind = vec![BS; buffer.len()];
                    rewind.extend(self.blank_field(placeholder));
                    link.write_bytes(&rewind)?;
                    buffer.clear();
                }
                KeyEvent::Printable(c) => {
                    if let Some(code) = codec::glyph(c) {
                        if buffer.push(c) {
                            link.write_bytes(code)?;
                        }
                    }
                }
                KeyEvent::Function(_) | KeyEvent::Escape | KeyEvent::Invalid => {}
            }
        }
    }

    /// `max_len` placeholders, then back to the first of them.
    fn blank_field(&self, placeholder: &[u8]) -> Vec<u8> {
        let mut bytes = placeholder.repeat(self.max_len);
        bytes.extend(std::iter::repeat(BS).take(self.max_len));
        bytes
    }
}
