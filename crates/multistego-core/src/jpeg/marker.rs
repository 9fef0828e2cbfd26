//! JPEG marker words (ITU T.81 Table B.1), as 16-bit values.

/// Start of Image.
pub const SOI: u16 = 0xFFD8;
/// End of Image.
pub const EOI: u16 = 0xFFD9;
/// Start of Scan.
pub const SOS: u16 = 0xFFDA;
/// Define Huffman Table.
pub const DHT: u16 = 0xFFC4;
/// Start of Frame, baseline sequential DCT.
pub const SOF0: u16 = 0xFFC0;
/// Start of Frame, progressive DCT. Recognized but not decodable here.
pub const SOF2: u16 = 0xFFC2;
/// Define Quantization Table.
pub const DQT: u16 = 0xFFDB;
/// Define Restart Interval.
pub const DRI: u16 = 0xFFDD;
/// First application segment (APP0).
pub const APP_FIRST: u16 = 0xFFE0;
/// Last application segment consumed by the original format (APP13).
pub const APP_LAST: u16 = 0xFFED;
/// Restart marker range. Not expected mid-scan; left unhandled.
pub const RST_FIRST: u16 = 0xFFD0;
pub const RST_LAST: u16 = 0xFFD7;

/// Whether a marker word introduces a length-prefixed segment.
pub fn has_length(word: u16) -> bool {
    !matches!(word, SOI | EOI) && !(RST_FIRST..=RST_LAST).contains(&word)
}
