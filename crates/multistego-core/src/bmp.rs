//! BMP carrier support.
//!
//! Every byte of the pixel array is a carrier slot: payload bits replace the
//! least significant bit of each byte starting at the pixel data offset the
//! file header declares. Headers, palettes and any gap before the pixel
//! array stay untouched.

use byteorder::{ByteOrder as _, LittleEndian};
use log::debug;

use crate::error::{Result, StegoError};
use crate::payload::{self, LsbBits};

/// Offset of the u32 pixel-array offset field in the file header.
const PIXEL_OFFSET_FIELD: usize = 10;
/// File header plus the smallest info header.
const MIN_HEADER_LEN: usize = 54;

/// Byte offset where the pixel array starts.
fn pixel_data_offset(data: &[u8]) -> Result<usize> {
    if data.len() < MIN_HEADER_LEN || !data.starts_with(b"BM") {
        return Err(StegoError::UnsupportedFormat);
    }
    let offset = LittleEndian::read_u32(&data[PIXEL_OFFSET_FIELD..PIXEL_OFFSET_FIELD + 4]) as usize;
    if offset < MIN_HEADER_LEN || offset > data.len() {
        return Err(StegoError::UnsupportedFormat);
    }
    Ok(offset)
}

/// Number of whole payload bytes this carrier can hold, frame included.
pub fn capacity(data: &[u8]) -> Result<usize> {
    let offset = pixel_data_offset(data)?;
    Ok((data.len() - offset) / 8)
}

/// Write a framed payload into the low bits of the pixel array.
pub fn embed(data: &[u8], framed: &[u8]) -> Result<Vec<u8>> {
    let offset = pixel_data_offset(data)?;
    if framed.len() * 8 > data.len() - offset {
        return Err(StegoError::TruncatedPayload);
    }

    let mut out = data.to_vec();
    for (slot, bit) in out[offset..].iter_mut().zip(LsbBits::new(framed)) {
        *slot = (*slot & !1) | bit;
    }
    debug!("embedded {} bytes into pixel data at {offset}", framed.len());
    Ok(out)
}

/// Read one framed payload back out of the pixel array.
pub fn extract(data: &[u8]) -> Result<Vec<u8>> {
    let offset = pixel_data_offset(data)?;
    let bits = data[offset..].iter().map(|&b| b & 1);
    payload::collect_frame(bits)
}


#[cfg(test)]
mod tests {
    use super::test_support::minimal_bmp;
    use super::*;

    #[test]
    fn payload_round_trip() {
        let carrier = minimal_bmp(400);
        let framed = payload::frame(b"under the pixels");
        let loaded = embed(&carrier, &framed).unwrap();

        assert_eq!(extract(&loaded).unwrap(), b"under the pixels");
        // Headers are untouched.
        assert_eq!(&loaded[..54], &carrier[..54]);
    }

    #[test]
    fn capacity_is_pixel_bytes_over_eight() {
        assert_eq!(capacity(&minimal_bmp(400)).unwrap(), 50);
        assert_eq!(capacity(&minimal_bmp(7)).unwrap(), 0);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let carrier = minimal_bmp(64);
        assert!(matches!(
            embed(&carrier, &payload::frame(&[0u8; 32])),
            Err(StegoError::TruncatedPayload)
        ));
    }

    #[test]
    fn non_bmp_data_is_rejected() {
        assert!(matches!(
            capacity(b"PNG not really"),
            Err(StegoError::UnsupportedFormat)
        ));
        assert!(matches!(
            capacity(b"BM"),
            Err(StegoError::UnsupportedFormat)
        ));
    }

    #[test]
    fn bogus_pixel_offset_is_rejected() {
        let mut carrier = minimal_bmp(64);
        carrier[10..14].copy_from_slice(&10_000u32.to_le_bytes());
        assert!(extract(&carrier).is_err());
    }

    #[test]
    fn untouched_carrier_yields_an_error_not_garbage() {
        // All-even slots read a zero length, all-odd slots an absurd one.
        let even = minimal_bmp(96);
        assert!(matches!(extract(&even), Err(StegoError::TruncatedPayload)));

        let mut odd = minimal_bmp(96);
        for slot in odd[54..].iter_mut() {
            *slot = 0xAB;
        }
        assert!(matches!(extract(&odd), Err(StegoError::TruncatedPayload)));
    }
}
