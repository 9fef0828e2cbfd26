//! Payload framing shared by every carrier format.
//!
//! A payload travels as a little-endian u64 byte length followed by the raw
//! bytes. Embedders consume the frame LSB-first bit by bit; extractors
//! rebuild it from whatever bit source the carrier provides.

use byteorder::{ByteOrder as _, LittleEndian};

use crate::error::{Result, StegoError};

/// Length prefix size in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

/// Prepend the 8-byte little-endian length to `data`.
pub fn frame(data: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(FRAME_HEADER_LEN + data.len());
    let mut header = [0u8; FRAME_HEADER_LEN];
    LittleEndian::write_u64(&mut header, data.len() as u64);
    framed.extend(header);
    framed.extend_from_slice(data);
    framed
}

/// Iterator over the bits of a byte slice, least significant bit of each
/// byte first. This is the order in which frames enter and leave carriers.
pub struct LsbBits<'a> {
    data: &'a [u8],
    index: usize,
    bit: u8,
}

impl<'a> LsbBits<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        LsbBits {
            data,
            index: 0,
            bit: 0,
        }
    }
}

impl Iterator for LsbBits<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.index)?;
        let bit = (byte >> self.bit) & 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.index += 1;
        }
        Some(bit)
    }
}

fn collect_bytes(bits: &mut impl Iterator<Item = u8>, count: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut byte = 0u8;
        for position in 0..8 {
            let bit = bits.next().ok_or(StegoError::TruncatedPayload)?;
            byte |= (bit & 1) << position;
        }
        bytes.push(byte);
    }
    Ok(bytes)
}

/// Read one length-prefixed frame out of a carrier's bit sequence.
///
/// Fails with [`StegoError::TruncatedPayload`] when the carrier holds fewer
/// bits than the declared length requires, or when the declared length is
/// zero. No frame is ever written empty, so both cases mean the carrier was
/// never encoded; reading one produces this error instead of garbage.
pub fn collect_frame(mut bits: impl Iterator<Item = u8>) -> Result<Vec<u8>> {
    let header = collect_bytes(&mut bits, FRAME_HEADER_LEN)?;
    let declared = LittleEndian::read_u64(&header);
    if declared == 0 {
        return Err(StegoError::TruncatedPayload);
    }

    let (_, upper) = bits.size_hint();
    if let Some(remaining_bits) = upper {
        if declared > (remaining_bits / 8) as u64 {
            return Err(StegoError::TruncatedPayload);
        }
    }
    collect_bytes(&mut bits, declared as usize)
}

/// Terminal text payloads are NUL-terminated inside their frame.
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Recover a NUL-terminated string from a terminal payload.
pub fn decode_text(data: &[u8]) -> Result<String> {
    let end = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(StegoError::TruncatedPayload)?;
    Ok(String::from_utf8(data[..end].to_vec())?)
}
