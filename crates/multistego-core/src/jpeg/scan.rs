//! Entropy-coded scan decoding and re-encoding.
//!
//! The decoder expands the scan into zigzag blocks of quantized DCT
//! coefficients without touching the pixel domain: no dequantization, no
//! inverse DCT, and no DC prediction. Each stored DC value is the raw
//! category-coded differential exactly as it sits in the stream, so writing
//! the same values back reproduces the same bits.
//!
//! Re-encoding splices: only the leading run of blocks an embedder touched
//! is serialized again, then the untouched remainder of the original scan is
//! realigned bit-by-bit behind it. The remainder usually lands on a
//! different bit phase than it had before, which is why it is copied through
//! a destuffing reader instead of as raw bytes.

use log::{debug, trace};

use crate::bits::{BitReader, BitWriter};
use crate::error::{Result, StegoError};
use crate::jpeg::headers::JpegHeaders;

/// End-of-block and zero-run-length AC symbols.
const EOB: u8 = 0x00;
const ZRL: u8 = 0xF0;

/// One quantized coefficient plus the number of scan bits that produced it
/// (Huffman code bits plus magnitude bits). The bit count is what the
/// re-encoder uses to skip the coefficient's original encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DctCoefficient {
    pub value: i16,
    pub coded_len: u16,
}

/// One data unit in zigzag order, index 0 being the DC coefficient.
#[derive(Debug, Clone)]
pub struct DctBlock {
    /// Key of the DC Huffman table this block was coded with.
    pub dc_table: u8,
    /// Key of the AC Huffman table this block was coded with.
    pub ac_table: u8,
    pub coefficients: [DctCoefficient; 64],
}

impl DctBlock {
    /// Scan bits spent on this block's coefficients, excluding the EOB and
    /// ZRL codes shared by any re-encoding of the same zero structure.
    fn coefficient_bits(&self) -> u64 {
        self.coefficients.iter().map(|c| c.coded_len as u64).sum()
    }
}

/// The decoded scan: every complete block plus the offset of whatever
/// followed the entropy-coded data (normally the EOI marker).
pub struct ScanBlocks {
    pub blocks: Vec<DctBlock>,
    pub eoi_offset: usize,
}

/// Decode the whole scan of `data` into blocks.
///
/// Decoding is dimension-agnostic: blocks are consumed MCU by MCU until the
/// End-Of-Image marker, and a block truncated by it is dropped.
pub fn decode(data: &[u8], headers: &JpegHeaders) -> Result<ScanBlocks> {
    let max_len = headers.max_code_length();
    let mut reader = BitReader::new(data, headers.byte_order);
    reader.seek(headers.scan_start);

    // Bits over-fetched by the previous symbol match, carried into the next.
    let mut carry: Vec<u8> = Vec::with_capacity(max_len);
    let mut blocks = Vec::new();

    'scan: loop {
        if carry.is_empty() && reader.peek_end_marker() {
            break;
        }
        for component in &headers.components {
            for _ in 0..component.repeat_count {
                match decode_block(&mut reader, &mut carry, headers, component.dc_table, component.ac_table, max_len)? {
                    Some(block) => blocks.push(block),
                    // Out of bits mid-block: what remained was padding.
                    None => break 'scan,
                }
            }
        }
    }

    let eoi_offset = reader.position();
    debug!("decoded {} blocks, scan ends at {eoi_offset}", blocks.len());
    Ok(ScanBlocks { blocks, eoi_offset })
}

/// Top `carry` up to `want` bits from the stream, stopping early at EOI.
fn refill(reader: &mut BitReader, carry: &mut Vec<u8>, want: usize) -> Result<()> {
    if carry.len() < want {
        let fresh = reader.read_bits(want - carry.len())?;
        carry.extend(fresh);
    }
    Ok(())
}

/// Take exactly `n` bits, or `None` if the stream cannot supply them.
fn take(
    reader: &mut BitReader,
    carry: &mut Vec<u8>,
    n: usize,
) -> Result<Option<Vec<u8>>> {
    refill(reader, carry, n)?;
    if carry.len() < n {
        return Ok(None);
    }
    Ok(carry.drain(..n).collect::<Vec<u8>>().into())
}

/// Match one Huffman symbol against the carried bits, refilling up to the
/// longest defined code first. `None` means the stream ran dry.
fn next_symbol(
    reader: &mut BitReader,
    carry: &mut Vec<u8>,
    tree: &crate::jpeg::huffman::HuffmanTree,
    max_len: usize,
) -> Result<Option<(u8, u16)>> {
    refill(reader, carry, max_len)?;
    if carry.is_empty() {
        return Ok(None);
    }
    let Some(matched) = tree.match_prefix(carry) else {
        return Ok(None);
    };
    let consumed = carry.len() - matched.overflow;
    carry.drain(..consumed);
    Ok(Some((matched.symbol, consumed as u16)))
}

fn decode_block(
    reader: &mut BitReader,
    carry: &mut Vec<u8>,
    headers: &JpegHeaders,
    dc_table: u8,
    ac_table: u8,
    max_len: usize,
) -> Result<Option<DctBlock>> {
    let dc_tree = headers.tree(dc_table)?;
    let ac_tree = headers.tree(ac_table)?;

    let mut block = DctBlock {
        dc_table,
        ac_table,
        coefficients: [DctCoefficient::default(); 64],
    };

    // DC: the symbol is the magnitude category, followed by that many bits.
    let Some((category, code_bits)) = next_symbol(reader, carry, dc_tree, max_len)? else {
        return Ok(None);
    };
    let Some(magnitude) = take(reader, carry, category as usize)? else {
        return Ok(None);
    };
    block.coefficients[0] = DctCoefficient {
        value: headers.category.value_for_bits(&magnitude)?,
        coded_len: code_bits + category as u16,
    };

    // AC: run/category symbols until EOB or coefficient 63.
    let mut index = 1usize;
    while index < 64 {
        let Some((symbol, code_bits)) = next_symbol(reader, carry, ac_tree, max_len)? else {
            return Ok(None);
        };
        match symbol {
            EOB => break,
            ZRL => {
                index += 16;
                if index > 64 {
                    return Err(StegoError::MalformedStream);
                }
            }
            _ => {
                let run = (symbol >> 4) as usize;
                let category = symbol & 0x0F;
                index += run;
                if index >= 64 {
                    return Err(StegoError::MalformedStream);
                }
                let Some(magnitude) = take(reader, carry, category as usize)? else {
                    return Ok(None);
                };
                block.coefficients[index] = DctCoefficient {
                    value: headers.category.value_for_bits(&magnitude)?,
                    coded_len: code_bits + category as u16,
                };
                index += 1;
            }
        }
    }

    trace!("block decoded, {index} zigzag positions consumed");
    Ok(Some(block))
}

/// Serialize one block, returning the number of structural bits emitted
/// (EOB and ZRL codes, identical for every encoding of this zero layout).
fn encode_block(block: &DctBlock, headers: &JpegHeaders, writer: &mut BitWriter) -> Result<u64> {
    let dc_tree = headers.tree(block.dc_table)?;
    let ac_tree = headers.tree(block.ac_table)?;
    let mut structural: u64 = 0;

    let (category, bits) = headers.category.code_for(block.coefficients[0].value)?;
    writer.write_bit_slice(dc_tree.code_for(category)?);
    writer.write_code(bits, category);

    let mut zero_run = 0usize;
    for coefficient in &block.coefficients[1..] {
        if coefficient.value == 0 {
            zero_run += 1;
            continue;
        }
        while zero_run >= 16 {
            let code = ac_tree.code_for(ZRL)?;
            structural += code.len() as u64;
            writer.write_bit_slice(code);
            zero_run -= 16;
        }
        let (category, bits) = headers.category.code_for(coefficient.value)?;
        writer.write_bit_slice(ac_tree.code_for((zero_run as u8) << 4 | category)?);
        writer.write_code(bits, category);
        zero_run = 0;
    }
    if zero_run > 0 {
        let code = ac_tree.code_for(EOB)?;
        structural += code.len() as u64;
        writer.write_bit_slice(code);
    }

    Ok(structural)
}

/// Serialize blocks into a complete stuffed, padded scan byte stream.
pub fn write_blocks(blocks: &[DctBlock], headers: &JpegHeaders) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    for block in blocks {
        encode_block(block, headers, &mut writer)?;
    }
    Ok(writer.finish())
}

/// Rebuild the carrier around a partially rewritten scan.
///
/// The first `blocks_used` blocks of `scan` are re-encoded from their
/// current coefficient values; the rest of the original entropy-coded data
/// is shifted onto the new bit phase unchanged. Everything before the scan
/// and from the EOI marker on is copied verbatim.
pub fn encode(
    data: &[u8],
    headers: &JpegHeaders,
    scan: &ScanBlocks,
    blocks_used: usize,
) -> Result<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(data.len() - headers.scan_start);

    // How many bits of the original scan the re-encoded prefix replaces:
    // the stored per-coefficient bit counts plus the structural codes, which
    // the fresh encoding reproduces at identical length.
    let mut old_bits: u64 = 0;
    for block in &scan.blocks[..blocks_used] {
        old_bits += encode_block(block, headers, &mut writer)? + block.coefficient_bits();
    }
    debug!(
        "spliced {blocks_used} blocks: {old_bits} old bits replaced by {} new bits",
        writer.bits_written()
    );

    // Realign the untouched remainder behind the new prefix.
    let mut reader = BitReader::new(data, headers.byte_order);
    reader.seek(headers.scan_start);
    let mut to_skip = old_bits;
    while to_skip > 0 {
        let chunk = to_skip.min(4096) as usize;
        let skipped = reader.read_bits(chunk)?;
        if skipped.is_empty() {
            return Err(StegoError::MalformedStream);
        }
        to_skip -= skipped.len() as u64;
    }
    loop {
        let bits = reader.read_bits(4096)?;
        if bits.is_empty() {
            break;
        }
        writer.write_bit_slice(&bits);
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..headers.scan_start]);
    out.extend(writer.finish());
    out.extend_from_slice(&data[scan.eoi_offset..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::test_support::{block_with, fixture_headers, minimal_jpeg};

    fn values(block: &DctBlock) -> Vec<(usize, i16)> {
        block
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| c.value != 0)
            .map(|(i, c)| (i, c.value))
            .collect()
    }

    #[test]
    fn round_trips_a_single_block() {
        let headers = fixture_headers();
        let original = block_with(&[(0, 12), (1, -5), (3, 7), (20, -33)]);
        let scan_bytes = write_blocks(&[original.clone()], &headers).unwrap();
        let file = minimal_jpeg(&scan_bytes);

        let decoded = decode(&file, &headers).unwrap();
        assert_eq!(decoded.blocks.len(), 1);
        assert_eq!(values(&decoded.blocks[0]), values(&original));
        assert_eq!(decoded.eoi_offset, file.len() - 2);
    }

    #[test]
    fn round_trips_many_blocks_with_runs() {
        let headers = fixture_headers();
        let originals = vec![
            block_with(&[(0, 0), (63, 1)]),
            block_with(&[(0, -63), (17, 2), (35, -2)]),
            block_with(&[(0, 3)]),
            block_with(&[(0, 1), (1, 1), (2, -1), (40, 5)]),
        ];
        let file = minimal_jpeg(&write_blocks(&originals, &headers).unwrap());

        let decoded = decode(&file, &headers).unwrap();
        assert_eq!(decoded.blocks.len(), originals.len());
        for (decoded, original) in decoded.blocks.iter().zip(&originals) {
            assert_eq!(values(decoded), values(original));
        }
    }

    #[test]
    fn coded_len_accounts_for_every_scan_bit() {
        let headers = fixture_headers();
        // Zero runs stay below 16 so the only structural codes are the EOBs.
        let blocks = vec![
            block_with(&[(0, 12), (5, -7), (15, 3)]),
            block_with(&[(0, -2), (10, 4)]),
        ];
        let scan_bytes = write_blocks(&blocks, &headers).unwrap();
        let file = minimal_jpeg(&scan_bytes);
        let decoded = decode(&file, &headers).unwrap();

        // Re-derive the structural bits and compare against the scan length
        // minus padding. Every AC code in the fixture table is 8 bits.
        let mut accounted: u64 = 0;
        for block in &decoded.blocks {
            accounted += block.coefficient_bits();
            let last_nonzero = (1..64).filter(|&i| block.coefficients[i].value != 0).max();
            if last_nonzero.unwrap_or(0) < 63 {
                accounted += 8; // EOB
            }
        }
        let total_bits = (scan_bytes.len() as u64) * 8;
        assert!(accounted <= total_bits);
        assert!(total_bits - accounted < 8, "only padding may be left over");
    }

    #[test]
    fn splice_keeps_untouched_remainder_intact() {
        let headers = fixture_headers();
        // The -31 values cross into category 6 when their low bit clears.
        let originals: Vec<DctBlock> = (0..12)
            .map(|i| block_with(&[(0, 10 + i), (2, -20 - i), (9, 2), (33, -31)]))
            .collect();
        let file = minimal_jpeg(&write_blocks(&originals, &headers).unwrap());

        let mut scan = decode(&file, &headers).unwrap();
        assert_eq!(scan.blocks.len(), 12);

        // Mutate the first three blocks the way an embedder would: flip the
        // low bit of values, moving some across a category boundary.
        for block in scan.blocks.iter_mut().take(3) {
            for coefficient in block.coefficients.iter_mut() {
                let v = coefficient.value;
                if v != 0 && v != 1 && v != -1 {
                    coefficient.value = (v & !1) | ((v ^ 1) & 1);
                }
            }
        }
        let mutated: Vec<DctBlock> = scan.blocks.clone();

        let rebuilt = encode(&file, &headers, &scan, 3).unwrap();
        let reparsed_headers = crate::jpeg::headers::parse(&rebuilt).unwrap();
        let redecoded = decode(&rebuilt, &reparsed_headers).unwrap();

        assert_eq!(redecoded.blocks.len(), 12);
        for (redecoded, expected) in redecoded.blocks.iter().zip(&mutated) {
            assert_eq!(values(redecoded), values(expected));
        }
    }

    #[test]
    fn splice_with_zero_blocks_preserves_all_values() {
        let headers = fixture_headers();
        let originals = vec![
            block_with(&[(0, 9), (4, -6)]),
            block_with(&[(0, -11), (50, 2)]),
        ];
        let file = minimal_jpeg(&write_blocks(&originals, &headers).unwrap());

        let scan = decode(&file, &headers).unwrap();
        let rebuilt = encode(&file, &headers, &scan, 0).unwrap();
        let redecoded = decode(&rebuilt, &headers).unwrap();
        assert_eq!(redecoded.blocks.len(), 2);
        for (redecoded, original) in redecoded.blocks.iter().zip(&originals) {
            assert_eq!(values(redecoded), values(original));
        }
    }

    #[test]
    fn full_rewrite_equals_fresh_serialization() {
        let headers = fixture_headers();
        let originals = vec![
            block_with(&[(0, 5), (1, 2), (2, -3)]),
            block_with(&[(0, -40), (60, 7)]),
        ];
        let file = minimal_jpeg(&write_blocks(&originals, &headers).unwrap());
        let scan = decode(&file, &headers).unwrap();

        let rebuilt = encode(&file, &headers, &scan, scan.blocks.len()).unwrap();
        assert_eq!(rebuilt, file);
    }

    #[test]
    fn decoder_stops_cleanly_on_empty_scan() {
        let headers = fixture_headers();
        let file = minimal_jpeg(&[]);
        let decoded = decode(&file, &headers).unwrap();
        assert!(decoded.blocks.is_empty());
        assert_eq!(decoded.eoi_offset, file.len() - 2);
    }

    #[test]
    fn truncated_block_is_dropped() {
        let headers = fixture_headers();
        let whole = write_blocks(
            &[
                block_with(&[(0, 12), (1, -5)]),
                block_with(&[(0, 30), (2, 8)]),
            ],
            &headers,
        )
        .unwrap();
        // Chop mid-way through the second block.
        let file = minimal_jpeg(&whole[..whole.len() - 1]);
        let decoded = decode(&file, &headers).unwrap();
        assert_eq!(decoded.blocks.len(), 1);
        assert_eq!(values(&decoded.blocks[0]), vec![(0, 12), (1, -5)]);
    }
}
