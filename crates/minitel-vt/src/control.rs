//! Single-byte control codes and fixed command sequences of the Minitel
//! videotex protocol.

/// Cursor left one cell.
pub const BS: u8 = 0x08;
/// Clear the screen and home the cursor.
pub const FF: u8 = 0x0C;
/// Shift out: switch to the semi-graphic (mosaic) character set.
pub const SO: u8 = 0x0E;
/// Shift in: switch back to the alphanumeric character set.
pub const SI: u8 = 0x0F;
/// Show the cursor.
pub const CON: u8 = 0x11;
/// Function-key introducer on input.
pub const SEP: u8 = 0x13;
/// Hide the cursor.
pub const COFF: u8 = 0x14;
/// Single shift 2: introduces special and accented characters.
pub const SS2: u8 = 0x19;
/// Escape.
pub const ESC: u8 = 0x1B;
/// Unit separator: introduces an absolute cursor position.
pub const US: u8 = 0x1F;

/// Protocol command prefixes (`PRO2` takes two argument bytes, `PRO3` three).
pub const PRO2: [u8; 2] = [ESC, 0x3A];
pub const PRO3: [u8; 2] = [ESC, 0x3B];

/// `PROG` opcode: program the serial speed.
pub const PROG: u8 = 0x6B;

/// Offset added to each coordinate of a cursor position.
pub const POSITION_OFFSET: u8 = 0x40;

/// Largest column number.
pub const LAST_COLUMN: u8 = 40;
/// Largest row number; row 0 is the status row.
pub const LAST_ROW: u8 = 24;

/// Build the 3-byte absolute positioning command for a 1-indexed cell.
///
/// The row byte comes first on the wire. Debug builds reject cells off the
/// screen; release builds mask coordinates to 6 bits.
pub fn cursor_position(column: u8, row: u8) -> [u8; 3] {
    debug_assert!(
        (1..=LAST_COLUMN).contains(&column),
        "column {column} is off the screen"
    );
    debug_assert!(row <= LAST_ROW, "row {row} is off the screen");
    [
        US,
        POSITION_OFFSET | (row & 0x3F),
        POSITION_OFFSET | (column & 0x3F),
    ]
}
