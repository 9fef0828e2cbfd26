//! Canonical Huffman decode tree for JPEG DHT tables.
//!
//! The tree is rebuilt from the 16 per-length symbol counts plus the symbol
//! bytes in file order, reproducing canonical JPEG code assignment without
//! explicit numeric code values: open leaf slots at each depth are filled in
//! file order, and every slot left unfilled is split into two children for
//! the next depth.
//!
//! Nodes live in an arena addressed by index with explicit parent links, so
//! a leaf can be unwound to the root to produce its code bit sequence.

use std::collections::{HashMap, VecDeque};

use crate::error::{Result, StegoError};

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    symbol: u8,
    is_left: bool,
}

/// A decoded Huffman symbol together with the count of unconsumed trailing
/// input bits, which the caller carries into the next decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedSymbol {
    pub symbol: u8,
    pub overflow: usize,
}

#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
    max_code_length: u8,
    /// Symbol to code bits (MSB first), for the encode path.
    codes: HashMap<u8, Vec<u8>>,
}

impl HuffmanTree {
    /// Build from 16 per-length counts and symbol values in file order.
    ///
    /// Fails with [`StegoError::UnsupportedFormat`] if the counts
    /// over-subscribe a depth (the table would not be a prefix code) or if
    /// `symbols` does not hold exactly the declared number of values.
    pub fn build(counts: &[u8; 16], symbols: &[u8]) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if symbols.len() != total {
            return Err(StegoError::UnsupportedFormat);
        }

        let mut tree = HuffmanTree {
            nodes: vec![Node::default()],
            root: 0,
            max_code_length: 0,
            codes: HashMap::new(),
        };

        let mut open: VecDeque<usize> = VecDeque::new();
        open.push_back(tree.add_child(tree.root, true));
        open.push_back(tree.add_child(tree.root, false));

        let mut next_symbol = 0usize;
        for length in 1..=16u8 {
            for _ in 0..counts[length as usize - 1] {
                let slot = open.pop_front().ok_or(StegoError::UnsupportedFormat)?;
                let symbol = symbols[next_symbol];
                next_symbol += 1;

                tree.nodes[slot].symbol = symbol;
                tree.codes.insert(symbol, tree.unwind(slot));
                tree.max_code_length = length;
            }

            // Every slot left unfilled at this depth becomes an internal
            // node one level down.
            let mut deeper = VecDeque::with_capacity(open.len() * 2);
            while let Some(slot) = open.pop_front() {
                deeper.push_back(tree.add_child(slot, true));
                deeper.push_back(tree.add_child(slot, false));
            }
            open = deeper;
        }

        Ok(tree)
    }

    fn add_child(&mut self, parent: usize, is_left: bool) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            is_left,
            ..Node::default()
        });
        if is_left {
            self.nodes[parent].left = Some(idx);
        } else {
            self.nodes[parent].right = Some(idx);
        }
        idx
    }

    /// Root-to-leaf path as code bits, left = 0, right = 1.
    fn unwind(&self, mut idx: usize) -> Vec<u8> {
        let mut bits = Vec::new();
        while let Some(parent) = self.nodes[idx].parent {
            bits.push(if self.nodes[idx].is_left { 0 } else { 1 });
            idx = parent;
        }
        bits.reverse();
        bits
    }

    #[inline]
    pub fn max_code_length(&self) -> u8 {
        self.max_code_length
    }

    /// Walk from the root consuming one bit per internal node until a leaf.
    ///
    /// Returns `None` if `bits` runs out before a leaf is reached, which can
    /// only happen when the stream truncated at End-Of-Image.
    pub fn match_prefix(&self, bits: &[u8]) -> Option<MatchedSymbol> {
        let mut idx = self.root;
        let mut consumed = 0usize;

        while let (Some(left), Some(right)) = (self.nodes[idx].left, self.nodes[idx].right) {
            let bit = *bits.get(consumed)?;
            idx = if bit == 0 { left } else { right };
            consumed += 1;
        }

        Some(MatchedSymbol {
            symbol: self.nodes[idx].symbol,
            overflow: bits.len() - consumed,
        })
    }

    /// Code bits for a symbol, for re-encoding.
    pub fn code_for(&self, symbol: u8) -> Result<&[u8]> {
        self.codes
            .get(&symbol)
            .map(|v| v.as_slice())
            .ok_or(StegoError::UnknownHuffmanSymbol(symbol as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Standard JPEG default luminance DC table (Annex K.3.1).
    pub(crate) const STD_DC_COUNTS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
    pub(crate) const STD_DC_SYMBOLS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

    #[test]
    fn canonical_assignment_matches_spec_tables() {
        let tree = HuffmanTree::build(&STD_DC_COUNTS, &STD_DC_SYMBOLS).unwrap();
        assert_eq!(tree.max_code_length(), 9);

        // Canonical codes for the default luminance DC table.
        assert_eq!(tree.code_for(0).unwrap(), &[0, 0]);
        assert_eq!(tree.code_for(1).unwrap(), &[0, 1, 0]);
        assert_eq!(tree.code_for(2).unwrap(), &[0, 1, 1]);
        assert_eq!(tree.code_for(3).unwrap(), &[1, 0, 0]);
        assert_eq!(tree.code_for(4).unwrap(), &[1, 0, 1]);
        assert_eq!(tree.code_for(5).unwrap(), &[1, 1, 0]);
        assert_eq!(tree.code_for(6).unwrap(), &[1, 1, 1, 0]);
        assert_eq!(tree.code_for(11).unwrap(), &[1, 1, 1, 1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn every_code_decodes_to_its_symbol_with_zero_overflow() {
        let tree = HuffmanTree::build(&STD_DC_COUNTS, &STD_DC_SYMBOLS).unwrap();
        for symbol in STD_DC_SYMBOLS {
            let code = tree.code_for(symbol).unwrap().to_vec();
            let matched = tree.match_prefix(&code).unwrap();
            assert_eq!(matched.symbol, symbol);
            assert_eq!(matched.overflow, 0);
        }
    }

    #[test]
    fn overflow_counts_unconsumed_bits() {
        let tree = HuffmanTree::build(&STD_DC_COUNTS, &STD_DC_SYMBOLS).unwrap();
        let mut input = tree.code_for(4).unwrap().to_vec();
        input.extend([1, 0, 1, 1]);
        let matched = tree.match_prefix(&input).unwrap();
        assert_eq!(matched.symbol, 4);
        assert_eq!(matched.overflow, 4);
    }

    #[test]
    fn truncated_input_yields_no_match() {
        let tree = HuffmanTree::build(&STD_DC_COUNTS, &STD_DC_SYMBOLS).unwrap();
        assert_eq!(tree.match_prefix(&[1]), None);
        assert_eq!(tree.match_prefix(&[]), None);
    }

    #[test]
    fn leaf_counts_match_declared_counts() {
        let tree = HuffmanTree::build(&STD_DC_COUNTS, &STD_DC_SYMBOLS).unwrap();
        for (i, &count) in STD_DC_COUNTS.iter().enumerate() {
            let depth = i + 1;
            let leaves = STD_DC_SYMBOLS
                .iter()
                .filter(|&&s| tree.code_for(s).unwrap().len() == depth)
                .count();
            assert_eq!(leaves, count as usize, "leaves at depth {depth}");
        }
    }

    #[test]
    fn oversubscribed_depth_is_rejected() {
        // Three codes of length 1 cannot exist.
        let mut counts = [0u8; 16];
        counts[0] = 3;
        assert!(HuffmanTree::build(&counts, &[1, 2, 3]).is_err());
    }
}
