//! Bit-level access to carrier byte streams.
//!
//! [`BitReader`] is an endian-aware byte/bit cursor over an in-memory buffer
//! with JPEG byte-stuffing and End-Of-Image awareness. [`BitWriter`] packs
//! bits MSB-first into bytes and re-inserts stuffing bytes on output.

use crate::error::{Result, StegoError};
use crate::jpeg::marker;

/// Byte order of multi-byte integers in a carrier stream.
///
/// JPEG markers are big-endian per the standard, but the header parser
/// auto-detects files whose markers only read correctly byte-swapped and
/// carries that decision through the whole stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Cursor over an in-memory buffer that serves whole bytes, aligned
/// integers, or individual bits.
///
/// Bits are produced MSB-first from each consumed byte. Inside entropy-coded
/// data every consumed 0xFF must be followed by a 0x00 stuffing byte, which
/// is silently dropped; any other follower is a [`StegoError::MalformedStream`].
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Byte currently being served bit-wise, if any.
    current: Option<u8>,
    /// Number of bits already served from `current`.
    served: u8,
    byte_order: ByteOrder,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], byte_order: ByteOrder) -> Self {
        BitReader {
            data,
            pos: 0,
            current: None,
            served: 0,
            byte_order,
        }
    }

    /// Current aligned byte position. Any partially served byte has already
    /// been consumed from the stream.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Move the aligned cursor, discarding any partially served byte.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
        self.current = None;
        self.served = 0;
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(StegoError::UnsupportedFormat);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Ok(match self.byte_order {
            ByteOrder::Big => u16::from_be_bytes([hi, lo]),
            ByteOrder::Little => u16::from_le_bytes([hi, lo]),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        for b in raw.iter_mut() {
            *b = self.read_u8()?;
        }
        Ok(match self.byte_order {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut raw = [0u8; 8];
        for b in raw.iter_mut() {
            *b = self.read_u8()?;
        }
        Ok(match self.byte_order {
            ByteOrder::Big => u64::from_be_bytes(raw),
            ByteOrder::Little => u64::from_le_bytes(raw),
        })
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            return Err(StegoError::UnsupportedFormat);
        }
        self.pos += n;
        Ok(())
    }

    /// Look ahead two aligned bytes for the End-Of-Image marker without
    /// advancing. Running out of buffer counts as end of image.
    pub fn peek_end_marker(&self) -> bool {
        if self.pos >= self.data.len() {
            return true;
        }
        if self.pos + 2 > self.data.len() {
            return false;
        }
        let raw = [self.data[self.pos], self.data[self.pos + 1]];
        let word = match self.byte_order {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        };
        word == marker::EOI
    }

    /// Consume the End-Of-Image marker if it is next; returns whether it was.
    pub fn consume_end_marker(&mut self) -> bool {
        if self.peek_end_marker() {
            if self.pos + 2 <= self.data.len() {
                self.pos += 2;
            }
            true
        } else {
            false
        }
    }

    /// Read up to `n` individual bits (0/1), consuming whole bytes lazily.
    ///
    /// Returns fewer than `n` bits if the End-Of-Image marker (or the end of
    /// the buffer) is reached first; callers must treat a short read as "no
    /// more data", not as an error.
    pub fn read_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);

        while out.len() < n {
            match self.current {
                None => {
                    if self.peek_end_marker() {
                        break;
                    }
                    let byte = self.data[self.pos];
                    self.pos += 1;
                    if byte == 0xFF {
                        // Entropy data escapes literal 0xFF with a stuffed
                        // 0x00 that is dropped here.
                        if self.pos >= self.data.len() || self.data[self.pos] != 0x00 {
                            return Err(StegoError::MalformedStream);
                        }
                        self.pos += 1;
                    }
                    self.current = Some(byte);
                    self.served = 0;
                }
                Some(byte) => {
                    while self.served < 8 && out.len() < n {
                        out.push((byte >> (7 - self.served)) & 1);
                        self.served += 1;
                    }
                    if self.served == 8 {
                        self.current = None;
                        self.served = 0;
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Packs bits MSB-first into bytes, injecting a 0x00 stuffing byte after
/// every literal 0xFF.
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    /// Accumulator for the byte under construction.
    acc: u8,
    filled: u8,
    bits_written: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Total number of payload bits written so far (stuffing excluded).
    #[inline]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    #[inline]
    pub fn write_bit(&mut self, bit: u8) {
        self.acc = (self.acc << 1) | (bit & 1);
        self.filled += 1;
        self.bits_written += 1;
        if self.filled == 8 {
            self.push_byte();
        }
    }

    /// Write the `len` low bits of `value`, most significant first.
    pub fn write_code(&mut self, value: u16, len: u8) {
        for i in (0..len).rev() {
            self.write_bit(((value >> i) & 1) as u8);
        }
    }

    pub fn write_bit_slice(&mut self, bits: &[u8]) {
        for &b in bits {
            self.write_bit(b);
        }
    }

    fn push_byte(&mut self) {
        self.data.push(self.acc);
        if self.acc == 0xFF {
            self.data.push(0x00);
        }
        self.acc = 0;
        self.filled = 0;
    }

    /// Pad the final byte with 1-bits (JPEG convention) and return the
    /// stuffed byte stream.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            let padding = 8 - self.filled;
            self.acc = (self.acc << padding) | ((1u8 << padding) - 1);
            self.filled = 8;
            self.push_byte();
        }
        self.data
    }
}
