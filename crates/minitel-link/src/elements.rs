//! Fixed-position widgets redrawn in place.

use minitel_vt::control::{SI, SO};

use crate::link::{LinkError, TerminalLink};

/// Full mosaic block in the semigraphic set, underscore in the text set.
const BAR_CELL: u8 = 0x5F;

/// A text slot of fixed width, blank-padded on every update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdatableText {
    column: u8,
    row: u8,
    width: usize,
}

impl UpdatableText {
    pub fn new(column: u8, row: u8, width: usize) -> Self {
        Self { column, row, width }
    }

    /// Replace the slot's content. Longer values are cut to the width.
    pub fn update(&self, link: &mut TerminalLink, value: &str) -> Result<(), LinkError> {
        let shown: String = value.chars().take(self.width).collect();
        let padding = self.width - shown.chars().count();
        let text = format!("{shown}{}", " ".repeat(padding));

        link.cursor_visible(false)?;
        link.move_cursor(self.column, self.row)?;
        link.write_text(&text)
    }
}

/// A horizontal gauge drawn with mosaic blocks over an underscore track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressBar {
    column: u8,
    row: u8,
    width: usize,
}

impl ProgressBar {
    pub fn new(column: u8, row: u8, width: usize) -> Self {
        Self { column, row, width }
    }

    /// Redraw for `fraction` in `0.0..=1.0`; out-of-range values are clamped.
    pub fn update(&self, link: &mut TerminalLink, fraction: f64) -> Result<(), LinkError> {
        let bytes = self.render(fraction);
        link.cursor_visible(false)?;
        link.move_cursor(self.column, self.row)?;
        link.write_bytes(&bytes)
    }

    fn render(&self, fraction: f64) -> Vec<u8> {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let filled = ((fraction * self.width as f64) as usize).min(self.width);

        let mut bytes = Vec::with_capacity(self.width + 2);
        bytes.push(SO);
        bytes.extend(std::iter::repeat(BAR_CELL).take(filled));
        bytes.push(SI);
        bytes.extend(std::iter::repeat(b'_').take(self.width - filled));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPort;

    #[test]
    fn test_text_is_padded() {
        let port = MockPort::new();
        let mut link = port.link();
        UpdatableText::new(32, 18, 8).update(&mut link, "42.00%").unwrap();
        let mut expected = vec![0x14, 0x1F, 0x40 | 18, 0x40 | 32];
        expected.extend_from_slice(b"42.00%  ");
        assert_eq!(port.output(), expected);
    }

    #[test]
    fn test_text_is_truncated_by_characters() {
        let port = MockPort::new();
        let mut link = port.link();
        UpdatableText::new(1, 1, 3).update(&mut link, "éété").unwrap();
        let output = port.output();
        assert_eq!(&output[4..], &[0x19, 0x42, b'e', 0x19, 0x42, b'e', b't']);
    }

    #[test]
    fn test_text_rejects_unsupported_characters() {
        let port = MockPort::new();
        let mut link = port.link();
        let err = UpdatableText::new(1, 1, 3).update(&mut link, "a~").unwrap_err();
        assert!(matches!(err, LinkError::Codec(_)));
    }

    #[test]
    fn test_progress_bar_half() {
        let port = MockPort::new();
        let mut link = port.link();
        ProgressBar::new(18, 18, 12).update(&mut link, 0.5).unwrap();
        let output = port.output();
        assert_eq!(&output[..4], &[0x14, 0x1F, 0x40 | 18, 0x40 | 18]);
        let mut bar = vec![0x0E];
        bar.extend([0x5F; 6]);
        bar.push(0x0F);
        bar.extend([b'_'; 6]);
        assert_eq!(&output[4..], bar.as_slice());
    }

    #[test]
    fn test_progress_bar_clamps() {
        let bar = ProgressBar::new(1, 1, 4);
        assert_eq!(bar.render(-1.0), vec![0x0E, 0x0F, b'_', b'_', b'_', b'_']);
        assert_eq!(bar.render(2.0), vec![0x0E, 0x5F, 0x5F, 0x5F, 0x5F, 0x0F]);
        assert_eq!(bar.render(f64::NAN), bar.render(0.0));
    }

    #[test]
    fn test_progress_bar_rounds_down() {
        let bar = ProgressBar::new(1, 1, 12);
        let bytes = bar.render(0.99);
        let shift_in = bytes.iter().position(|&b| b == 0x0F).unwrap();
        assert_eq!(shift_in, 1 + 11, "0.99 of 12 cells fills 11");
        assert_eq!(bytes.len(), 12 + 2);
    }
}
