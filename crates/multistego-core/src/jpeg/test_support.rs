//! Hand-assembled grayscale baseline JPEG fixtures for unit tests.
//!
//! The AC table defines every symbol at code length 8 so fixture scans stay
//! easy to reason about; the DC table is the default luminance table from
//! Annex K.

use crate::jpeg::headers::{self, JpegHeaders};
use crate::jpeg::scan::{DctBlock, DctCoefficient};

pub const GRAY_DC_TABLE: u8 = 0x00;
pub const GRAY_AC_TABLE: u8 = 0x10;

fn push_segment(out: &mut Vec<u8>, word: u16, body: &[u8]) {
    out.extend(word.to_be_bytes());
    out.extend(((body.len() + 2) as u16).to_be_bytes());
    out.extend(body);
}

fn dht_dc() -> Vec<u8> {
    let mut body = vec![GRAY_DC_TABLE];
    body.extend([0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]);
    body.extend(0..=11u8);
    body
}

/// AC table with all 98 symbols (EOB, ZRL, runs 0..16 at categories 1..7)
/// assigned code length 8.
fn dht_ac() -> Vec<u8> {
    let mut body = vec![GRAY_AC_TABLE];
    let mut counts = [0u8; 16];
    counts[7] = 98;
    body.extend(counts);
    body.push(0x00);
    body.push(0xF0);
    for category in 1..=6u8 {
        for run in 0..16u8 {
            body.push((run << 4) | category);
        }
    }
    body
}

/// A single-component baseline file with the given entropy-coded scan bytes.
pub fn minimal_jpeg(scan: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(0xFFD8u16.to_be_bytes());
    push_segment(&mut out, 0xFFC4, &dht_dc());
    push_segment(&mut out, 0xFFC4, &dht_ac());
    // SOF0: 8-bit precision, 16x16, one component, 1x1 sampling.
    push_segment(
        &mut out,
        0xFFC0,
        &[0x08, 0x00, 0x10, 0x00, 0x10, 0x01, 0x01, 0x11, 0x00],
    );
    push_segment(&mut out, 0xFFDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out.extend(scan);
    out.extend(0xFFD9u16.to_be_bytes());
    out
}

pub fn fixture_headers() -> JpegHeaders {
    headers::parse(&minimal_jpeg(&[])).expect("fixture headers parse")
}

/// A block whose nonzero coefficients are given as `(zigzag index, value)`.
/// Index 0 is the DC coefficient. Magnitudes must stay below 64 to fit the
/// fixture AC table.
pub fn block_with(coefficients: &[(usize, i16)]) -> DctBlock {
    let mut block = DctBlock {
        dc_table: GRAY_DC_TABLE,
        ac_table: GRAY_AC_TABLE,
        coefficients: [DctCoefficient::default(); 64],
    };
    for &(index, value) in coefficients {
        block.coefficients[index].value = value;
    }
    block
}
