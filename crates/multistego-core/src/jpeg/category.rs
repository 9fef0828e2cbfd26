//! JPEG Annex F magnitude-category coding.
//!
//! A nonzero coefficient is stored as a bit-length category plus that many
//! extra bits selecting the value inside the category. For each length k the
//! 2^(k-1) most negative values map to codes 0.., the positive half to codes
//! 2^(k-1)..; the empty code maps to 0.

use std::collections::HashMap;

use crate::error::{Result, StegoError};

/// Largest magnitude representable by baseline DCT coefficients.
const RANGE_MAX: i16 = 2047;

/// Bidirectional map between signed magnitudes in [-2047, 2047] and their
/// fixed-width category codes, keyed by packed `(length, bits)` pairs.
pub struct CategoryCodeTable {
    value_to_code: HashMap<i16, (u8, u16)>,
    code_to_value: HashMap<(u8, u16), i16>,
}

impl CategoryCodeTable {
    pub fn new() -> Self {
        let mut table = CategoryCodeTable {
            value_to_code: HashMap::new(),
            code_to_value: HashMap::new(),
        };
        table.insert(0, 0, 0);

        let mut starting_min: i16 = -1;
        let mut covered_min: i16 = 0;
        let mut covered_max: i16 = 0;
        let mut length: u8 = 1;

        while covered_min > -RANGE_MAX && covered_max < RANGE_MAX {
            let half = 1i16 << (length - 1);

            for i in 0..half {
                covered_min = starting_min + i;
                table.insert(covered_min, length, i as u16);
            }
            for i in 0..half {
                covered_max = half + i;
                table.insert(covered_max, length, (half + i) as u16);
            }

            starting_min -= 1i16 << length;
            length += 1;
        }

        table
    }

    fn insert(&mut self, value: i16, length: u8, bits: u16) {
        self.value_to_code.insert(value, (length, bits));
        self.code_to_value.insert((length, bits), value);
    }

    /// Category length and extra bits for a signed value.
    pub fn code_for(&self, value: i16) -> Result<(u8, u16)> {
        self.value_to_code
            .get(&value)
            .copied()
            .ok_or(StegoError::UnknownHuffmanSymbol(value as i32))
    }

    /// Signed value for a category code.
    pub fn value_for(&self, length: u8, bits: u16) -> Result<i16> {
        self.code_to_value
            .get(&(length, bits))
            .copied()
            .ok_or(StegoError::UnknownHuffmanSymbol(bits as i32))
    }

    /// Decode a code given as individual 0/1 bits.
    pub fn value_for_bits(&self, bits: &[u8]) -> Result<i16> {
        let mut packed: u16 = 0;
        for &b in bits {
            packed = (packed << 1) | b as u16;
        }
        self.value_for(bits.len() as u8, packed)
    }
}

impl Default for CategoryCodeTable {
    fn default() -> Self {
        Self::new()
    }
}
