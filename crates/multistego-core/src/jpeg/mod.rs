//! Baseline JPEG carrier support.
//!
//! Payload bits ride in the low magnitude bit of quantized DCT coefficients
//! taken straight from the entropy-coded scan. Coefficients with value 0, 1
//! or -1 never carry a bit: zeroes are structural (their runs are part of
//! the entropy coding itself) and clearing the bit of a unit value would
//! zero it, corrupting the run-length structure. Writes keep the sign and
//! adjust the magnitude, so an eligible coefficient always stays eligible.

pub mod category;
pub mod headers;
pub mod huffman;
pub mod marker;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_support;

use log::debug;

use crate::error::{Result, StegoError};
use crate::payload::{self, LsbBits};
use self::scan::ScanBlocks;

#[inline]
fn eligible(value: i16) -> bool {
    value != 0 && value != 1 && value != -1
}

fn decode_carrier(data: &[u8]) -> Result<(headers::JpegHeaders, ScanBlocks)> {
    let parsed = headers::parse(data)?;
    if parsed.progressive {
        return Err(StegoError::UnsupportedFormat);
    }
    let blocks = scan::decode(data, &parsed)?;
    Ok((parsed, blocks))
}

/// Number of whole payload bytes this carrier can hold, frame included.
pub fn capacity(data: &[u8]) -> Result<usize> {
    let (_, scan) = decode_carrier(data)?;
    let bits = scan
        .blocks
        .iter()
        .flat_map(|b| b.coefficients.iter())
        .filter(|c| eligible(c.value))
        .count();
    Ok(bits / 8)
}

/// Write a framed payload into the carrier and rebuild it around the
/// modified blocks.
pub fn embed(data: &[u8], framed: &[u8]) -> Result<Vec<u8>> {
    let (parsed, mut scan) = decode_carrier(data)?;

    let available = scan
        .blocks
        .iter()
        .flat_map(|b| b.coefficients.iter())
        .filter(|c| eligible(c.value))
        .count();
    if framed.len() * 8 > available {
        return Err(StegoError::TruncatedPayload);
    }

    let mut bits = LsbBits::new(framed);
    let mut blocks_used = 0usize;
    'blocks: for (index, block) in scan.blocks.iter_mut().enumerate() {
        for coefficient in block.coefficients.iter_mut() {
            if !eligible(coefficient.value) {
                continue;
            }
            let Some(bit) = bits.next() else {
                break 'blocks;
            };
            let magnitude = (coefficient.value.unsigned_abs() & !1) | bit as u16;
            coefficient.value = if coefficient.value < 0 {
                -(magnitude as i16)
            } else {
                magnitude as i16
            };
            blocks_used = index + 1;
        }
    }
    debug!(
        "embedded {} bytes into {blocks_used} of {} blocks",
        framed.len(),
        scan.blocks.len()
    );

    scan::encode(data, &parsed, &scan, blocks_used)
}

/// Read one framed payload back out of the carrier.
pub fn extract(data: &[u8]) -> Result<Vec<u8>> {
    let (_, scan) = decode_carrier(data)?;
    let bits: Vec<u8> = scan
        .blocks
        .iter()
        .flat_map(|b| b.coefficients.iter())
        .filter(|c| eligible(c.value))
        .map(|c| (c.value & 1) as u8)
        .collect();
    payload::collect_frame(bits.into_iter())
}
