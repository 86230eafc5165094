//! Display attributes: colors, character sizes, inverse video and mosaic cells.

use bitflags::bitflags;

use crate::control::ESC;

/// One of the eight Minitel colors, numbered as the terminal expects them.
///
/// Monochrome sets render these as gray levels, which is why the mosaic
/// encoder picks them through [`Color::from_luminance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    /// Colors ordered from darkest to brightest gray on a monochrome screen.
    pub const BY_LUMINANCE: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Red,
        Color::Magenta,
        Color::Green,
        Color::Cyan,
        Color::Yellow,
        Color::White,
    ];

    /// The color whose gray level is closest to an 8-bit luminance value.
    pub const fn from_luminance(level: u8) -> Self {
        Self::BY_LUMINANCE[(level >> 5) as usize]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// `ESC` + `0x40 + color`.
    pub const fn foreground(self) -> [u8; 2] {
        [ESC, 0x40 + self.index()]
    }

    /// `ESC` + `0x50 + color`.
    pub const fn background(self) -> [u8; 2] {
        [ESC, 0x50 + self.index()]
    }
}

/// Glyph size attribute for alphanumeric text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharSize {
    Normal,
    DoubleHeight,
    DoubleWidth,
    DoubleSize,
}

impl CharSize {
    pub const fn sequence(self) -> [u8; 2] {
        let code = match self {
            CharSize::Normal => 0x4C,
            CharSize::DoubleHeight => 0x4D,
            CharSize::DoubleWidth => 0x4E,
            CharSize::DoubleSize => 0x4F,
        };
        [ESC, code]
    }
}

/// Start and stop inverse video.
pub const INVERSE_ON: [u8; 2] = [ESC, 0x5D];
pub const INVERSE_OFF: [u8; 2] = [ESC, 0x5C];

bitflags! {
    /// Lit sub-cells of a 2x3 mosaic character.
    ///
    /// Each flag's value is the power of two the terminal assigns to that
    /// sub-cell; bit 5 is skipped because `0x20` is the mosaic base itself.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MosaicCell: u8 {
        const TOP_LEFT      = 1 << 0;
        const TOP_RIGHT     = 1 << 1;
        const MIDDLE_LEFT   = 1 << 2;
        const MIDDLE_RIGHT  = 1 << 3;
        const BOTTOM_LEFT   = 1 << 4;
        const BOTTOM_RIGHT  = 1 << 6;
    }
}

impl MosaicCell {
    /// Bit weight of each sub-cell, in row-major pixel order.
    pub const WEIGHTS: [u8; 6] = [0, 1, 2, 3, 4, 6];

    /// Build a cell from a 6-bit row-major pixel mask (bit `i` = pixel `i`).
    pub fn from_mask(mask: u8) -> Self {
        Self::WEIGHTS
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1 << i) != 0)
            .fold(Self::empty(), |cell, (_, &weight)| {
                cell | Self::from_bits_retain(1 << weight)
            })
    }

    /// Wire byte: `32 + sum of the lit sub-cells' weights`.
    pub const fn to_byte(self) -> u8 {
        0x20 | self.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_attribute_bytes() {
        assert_eq!(Color::Black.foreground(), [0x1B, 0x40]);
        assert_eq!(Color::White.foreground(), [0x1B, 0x47]);
        assert_eq!(Color::Black.background(), [0x1B, 0x50]);
        assert_eq!(Color::Cyan.background(), [0x1B, 0x56]);
    }

    #[test]
    fn test_luminance_permutation() {
        let indices: Vec<u8> = (0..8u8)
            .map(|step| Color::from_luminance(step << 5).index())
            .collect();
        assert_eq!(indices, vec![0, 4, 1, 5, 2, 6, 3, 7]);
        // Low bits are ignored.
        assert_eq!(Color::from_luminance(0x1F), Color::Black);
        assert_eq!(Color::from_luminance(0xFF), Color::White);
    }

    #[test]
    fn test_empty_mosaic_is_space() {
        assert_eq!(MosaicCell::from_mask(0).to_byte(), 32);
    }

    #[test]
    fn test_full_mosaic() {
        let cell = MosaicCell::from_mask(0b11_1111);
        assert_eq!(cell, MosaicCell::all());
        assert_eq!(cell.to_byte(), 32 + 1 + 2 + 4 + 8 + 16 + 64);
    }

    #[test]
    fn test_bottom_right_skips_bit_five() {
        let cell = MosaicCell::from_mask(1 << 5);
        assert_eq!(cell, MosaicCell::BOTTOM_RIGHT);
        assert_eq!(cell.to_byte(), 0x60);
    }

    #[test]
    fn test_char_size_sequences() {
        assert_eq!(CharSize::Normal.sequence(), [0x1B, 0x4C]);
        assert_eq!(CharSize::DoubleSize.sequence(), [0x1B, 0x4F]);
    }
}
