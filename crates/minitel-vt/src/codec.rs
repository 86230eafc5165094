//! Transcoding between Unicode text and the Minitel character set.
//!
//! Most characters travel as their single ASCII byte. Accented letters are
//! composed on the terminal from three bytes (`SS2`, a diacritic class, the
//! base letter) and a few symbols from two (`SS2`, a code). Decoding always
//! prefers the longest matching sequence, so a composed letter is never split
//! into an introducer followed by its base letter.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::control::SS2;

/// Longest on-wire sequence of a single character.
pub const MAX_GLYPH_LEN: usize = 3;

/// Replacement used by [`sanitize`] when the requested one is unmappable.
pub const DEFAULT_PLACEHOLDER: char = '_';

/// Diacritic classes following `SS2` in a composed sequence.
pub const GRAVE: u8 = 0x41;
pub const ACUTE: u8 = 0x42;
pub const CIRCUMFLEX: u8 = 0x43;
pub const DIAERESIS: u8 = 0x48;
pub const CEDILLA: u8 = 0x4B;

pub const DIACRITICS: [u8; 5] = [GRAVE, ACUTE, CIRCUMFLEX, DIAERESIS, CEDILLA];

const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]_| ";

const COMPOSED: [(char, u8, u8); 15] = [
    ('à', GRAVE, b'a'),
    ('è', GRAVE, b'e'),
    ('ù', GRAVE, b'u'),
    ('é', ACUTE, b'e'),
    ('â', CIRCUMFLEX, b'a'),
    ('ê', CIRCUMFLEX, b'e'),
    ('î', CIRCUMFLEX, b'i'),
    ('ô', CIRCUMFLEX, b'o'),
    ('û', CIRCUMFLEX, b'u'),
    ('ä', DIAERESIS, b'a'),
    ('ë', DIAERESIS, b'e'),
    ('ï', DIAERESIS, b'i'),
    ('ö', DIAERESIS, b'o'),
    ('ü', DIAERESIS, b'u'),
    ('ç', CEDILLA, b'c'),
];

const SPECIAL: [(char, u8); 15] = [
    ('œ', 0x7A),
    ('Œ', 0x6A),
    ('ß', 0x7B),
    ('£', 0x23),
    ('§', 0x27),
    ('←', 0x2C),
    ('↑', 0x2D),
    ('→', 0x2E),
    ('↓', 0x2F),
    ('°', 0x30),
    ('±', 0x31),
    ('÷', 0x38),
    ('¼', 0x3C),
    ('½', 0x3D),
    ('¾', 0x3E),
];

const CONTROL: [(char, u8); 3] = [('\r', 0x0D), ('\t', 0x09), ('\n', 0x0A)];

/// Errors from encoding or decoding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The character has no representation on the terminal.
    UnsupportedCharacter(char),
    /// No character matches the bytes at `offset`; `bytes` holds up to three
    /// of them.
    MalformedSequence { offset: usize, bytes: Vec<u8> },
    /// Input given as bytes was not valid UTF-8.
    InvalidUtf8(std::str::Utf8Error),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::UnsupportedCharacter(c) => {
                write!(f, "character {c:?} cannot be displayed on the Minitel")
            }
            CodecError::MalformedSequence { offset, bytes } => {
                write!(f, "byte sequence {bytes:02x?} at offset {offset} is not a known character")
            }
            CodecError::InvalidUtf8(err) => write!(f, "invalid UTF-8 input: {err}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::InvalidUtf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::str::Utf8Error> for CodecError {
    fn from(err: std::str::Utf8Error) -> Self {
        CodecError::InvalidUtf8(err)
    }
}

struct Tables {
    encode: HashMap<char, Vec<u8>>,
    decode: HashMap<Vec<u8>, char>,
}

impl Tables {
    fn build() -> Self {
        let ascii = ('A'..='Z')
            .chain('a'..='z')
            .chain('0'..='9')
            .chain(PUNCTUATION.chars())
            .map(|c| (c, vec![c as u8]));
        let composed = COMPOSED
            .iter()
            .map(|&(c, class, base)| (c, vec![SS2, class, base]));
        let special = SPECIAL.iter().map(|&(c, code)| (c, vec![SS2, code]));
        let control = CONTROL.iter().map(|&(c, byte)| (c, vec![byte]));

        let encode: HashMap<char, Vec<u8>> =
            ascii.chain(composed).chain(special).chain(control).collect();
        let decode = encode.iter().map(|(&c, bytes)| (bytes.clone(), c)).collect();

        Self { encode, decode }
    }
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(Tables::build)
}

/// On-wire bytes for a single character, if it has any.
pub fn glyph(c: char) -> Option<&'static [u8]> {
    tables().encode.get(&c).map(Vec::as_slice)
}

/// The character whose complete encoding is exactly `bytes`.
pub fn decode_glyph(bytes: &[u8]) -> Option<char> {
    tables().decode.get(bytes).copied()
}

pub fn is_supported(c: char) -> bool {
    tables().encode.contains_key(&c)
}

/// Every character the terminal can display or receive.
pub fn supported_chars() -> impl Iterator<Item = char> {
    tables().encode.keys().copied()
}

/// Encode text for the terminal, failing on the first unmappable character.
pub fn encode(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = glyph(c).ok_or(CodecError::UnsupportedCharacter(c))?;
        bytes.extend_from_slice(code);
    }
    Ok(bytes)
}

/// Encode UTF-8 bytes for the terminal.
pub fn transcode(utf8: &[u8]) -> Result<Vec<u8>, CodecError> {
    encode(std::str::from_utf8(utf8)?)
}

/// Decode terminal bytes, trying 3-, 2- then 1-byte matches at each position.
pub fn decode(bytes: &[u8]) -> Result<String, CodecError> {
    let mut text = String::with_capacity(bytes.len());
    let mut offset = 0;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        let longest = rest.len().min(MAX_GLYPH_LEN);
        let hit = (1..=longest)
            .rev()
            .find_map(|n| decode_glyph(&rest[..n]).map(|c| (c, n)));

        match hit {
            Some((c, n)) => {
                text.push(c);
                offset += n;
            }
            None => {
                return Err(CodecError::MalformedSequence {
                    offset,
                    bytes: rest[..longest].to_vec(),
                });
            }
        }
    }

    Ok(text)
}

/// Replace every unmappable character with `placeholder`.
///
/// Meant for text of untrusted origin. Falls back to
/// [`DEFAULT_PLACEHOLDER`] if `placeholder` itself cannot be displayed.
pub fn sanitize(text: &str, placeholder: char) -> String {
    let placeholder = if is_supported(placeholder) {
        placeholder
    } else {
        DEFAULT_PLACEHOLDER
    };
    text.chars()
        .map(|c| if is_supported(c) { c } else { placeholder })
        .collect()
}
