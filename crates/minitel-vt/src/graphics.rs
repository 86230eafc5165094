//! Conversion of grayscale images to mosaic characters.
//!
//! Each character cell covers 2x3 source pixels and shows exactly two
//! colors. Color attributes cost two bytes each on a link that may run at
//! 300 bit/s, so they are only sent when they differ from what the terminal
//! already has.

use crate::attr::{Color, MosaicCell};
use crate::control::{self, SO};

pub const BLOCK_WIDTH: usize = 2;
pub const BLOCK_HEIGHT: usize = 3;
pub const BLOCK_PIXELS: usize = BLOCK_WIDTH * BLOCK_HEIGHT;

/// A single-channel 8-bit image, expected to be posterized beforehand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LumaImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl LumaImage {
    /// Wrap row-major pixels. Returns `None` if the buffer size does not
    /// match the dimensions.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if width.checked_mul(height)? != pixels.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image of uniform luminance.
    pub fn filled(width: usize, height: usize, level: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![level; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`; outside the image reads as black.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y * self.width + x]
    }

    /// Number of mosaic cells per row and rows of cells.
    pub fn cells(&self) -> (usize, usize) {
        (
            self.width.div_ceil(BLOCK_WIDTH),
            self.height.div_ceil(BLOCK_HEIGHT),
        )
    }

    /// The six pixels of the block whose top-left pixel is `(x, y)`,
    /// row-major.
    fn block(&self, x: usize, y: usize) -> [u8; BLOCK_PIXELS] {
        let mut levels = [0u8; BLOCK_PIXELS];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = self.pixel(x + i % BLOCK_WIDTH, y + i / BLOCK_WIDTH);
        }
        levels
    }
}

/// Colors the terminal was last told to use. `None` means unknown, which
/// forces the next block to send its attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttributeState {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl AttributeState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Six pixels reduced to two levels and the mask of pixels nearer the
/// foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBlock {
    pub fg: u8,
    pub bg: u8,
    pub cell: MosaicCell,
}

impl PixelBlock {
    /// Reduce a block to its two most frequent levels.
    ///
    /// Equal counts are ranked by first appearance. A uniform block uses its
    /// level for both colors and lights no sub-cell.
    pub fn from_levels(levels: [u8; BLOCK_PIXELS]) -> Self {
        let mut counts: Vec<(u8, usize)> = Vec::with_capacity(BLOCK_PIXELS);
        for &level in &levels {
            match counts.iter_mut().find(|(l, _)| *l == level) {
                Some((_, n)) => *n += 1,
                None => counts.push((level, 1)),
            }
        }
        // Stable sort keeps first-appearance order among ties.
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let fg = counts[0].0;
        let bg = counts.get(1).map_or(fg, |&(level, _)| level);

        let mask = levels
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v.abs_diff(fg) < v.abs_diff(bg))
            .fold(0u8, |mask, (i, _)| mask | (1 << i));

        Self {
            fg,
            bg,
            cell: MosaicCell::from_mask(mask),
        }
    }

    pub fn fg_color(&self) -> Color {
        Color::from_luminance(self.fg)
    }

    pub fn bg_color(&self) -> Color {
        Color::from_luminance(self.bg)
    }
}

/// Append one block, preceded by whichever color attributes changed.
pub fn encode_block(block: &PixelBlock, state: &mut AttributeState, out: &mut Vec<u8>) {
    let fg = block.fg_color();
    if state.fg != Some(fg) {
        out.extend_from_slice(&fg.foreground());
        state.fg = Some(fg);
    }

    let bg = block.bg_color();
    if state.bg != Some(bg) {
        out.extend_from_slice(&bg.background());
        state.bg = Some(bg);
    }

    out.push(block.cell.to_byte());
}

/// Encode an image whose top-left cell lands at 1-indexed `(column, row)`.
///
/// Every row of cells starts with its own cursor position and mosaic
/// switch, and with fresh attribute state.
pub fn encode(image: &LumaImage, origin: (u8, u8)) -> Vec<u8> {
    let (column, row) = origin;
    let (cols, rows) = image.cells();
    let mut out = Vec::with_capacity(rows * (4 + cols * 3));
    let mut state = AttributeState::default();

    for cell_row in 0..rows {
        state.reset();
        let position = control::cursor_position(column, row.saturating_add(cell_row as u8));
        out.extend_from_slice(&position);
        out.push(SO);

        for cell_col in 0..cols {
            let levels = image.block(cell_col * BLOCK_WIDTH, cell_row * BLOCK_HEIGHT);
            encode_block(&PixelBlock::from_levels(levels), &mut state, &mut out);
        }
    }

    log::debug!(
        "encoded {}x{} image into {} mosaic bytes",
        image.width,
        image.height,
        out.len()
    );
    out
}
