//! JPEG header segment parsing up to the start of the entropy-coded scan.
//!
//! The walk collects everything the scan codec needs: Huffman tables keyed
//! by their class/destination byte, the frame components with their sampling
//! repeat counts, and the byte offset where entropy-coded data begins.

use std::collections::HashMap;

use log::{debug, trace};

use crate::bits::{BitReader, ByteOrder};
use crate::error::{Result, StegoError};
use crate::jpeg::category::CategoryCodeTable;
use crate::jpeg::huffman::HuffmanTree;
use crate::jpeg::marker;

/// One scan component, in Start-Of-Scan order.
#[derive(Debug, Clone, Copy)]
pub struct JpegComponent {
    /// Component identifier from the frame header.
    pub selector: u8,
    /// Data units per MCU, horizontal times vertical sampling factor.
    pub repeat_count: usize,
    /// Key of the DC Huffman table in [`JpegHeaders::trees`].
    pub dc_table: u8,
    /// Key of the AC Huffman table in [`JpegHeaders::trees`].
    pub ac_table: u8,
}

/// Everything parsed out of the segments preceding the scan.
pub struct JpegHeaders {
    pub byte_order: ByteOrder,
    /// Offset of the first entropy-coded byte, right after the SOS segment.
    pub scan_start: usize,
    /// Huffman tables keyed by class/destination: DC tables at `0x0n`,
    /// AC tables at `0x1n`.
    pub trees: HashMap<u8, HuffmanTree>,
    pub category: CategoryCodeTable,
    pub components: Vec<JpegComponent>,
    /// Set when the frame is progressive (SOF2). Such files are recognized
    /// but cannot carry or reveal payloads here.
    pub progressive: bool,
}

impl JpegHeaders {
    pub fn tree(&self, key: u8) -> Result<&HuffmanTree> {
        self.trees.get(&key).ok_or(StegoError::MissingHuffmanTable(key))
    }

    /// Longest code length over all defined tables. Bounds the speculative
    /// read the scan decoder performs per symbol.
    pub fn max_code_length(&self) -> usize {
        self.trees
            .values()
            .map(|t| t.max_code_length() as usize)
            .max()
            .unwrap_or(0)
    }
}

/// Decide the stream byte order from the Start-Of-Image marker.
///
/// A stream whose first word only reads as SOI byte-swapped is treated as a
/// little-endian variant and every multi-byte field follows suit.
pub fn detect_byte_order(data: &[u8]) -> Result<ByteOrder> {
    let mut be = BitReader::new(data, ByteOrder::Big);
    if be.read_u16()? == marker::SOI {
        return Ok(ByteOrder::Big);
    }
    let mut le = BitReader::new(data, ByteOrder::Little);
    if le.read_u16()? == marker::SOI {
        return Ok(ByteOrder::Little);
    }
    Err(StegoError::UnsupportedFormat)
}

/// Walk the marker segments of `data` until the scan begins.
pub fn parse(data: &[u8]) -> Result<JpegHeaders> {
    let byte_order = detect_byte_order(data)?;
    let mut reader = BitReader::new(data, byte_order);
    reader.skip(2)?;

    let mut trees = HashMap::new();
    let mut frame: Vec<(u8, usize)> = Vec::new();
    let mut progressive = false;

    loop {
        let word = reader.read_u16()?;
        trace!("marker {word:#06x} at {}", reader.position() - 2);

        match word {
            marker::SOS => {
                let components = parse_sos(&mut reader, &frame)?;
                let headers = JpegHeaders {
                    byte_order,
                    scan_start: reader.position(),
                    trees,
                    category: CategoryCodeTable::new(),
                    components,
                    progressive,
                };
                debug!(
                    "scan starts at {}, {} huffman tables, {} components",
                    headers.scan_start,
                    headers.trees.len(),
                    headers.components.len()
                );
                return Ok(headers);
            }
            marker::DHT => {
                parse_dht(&mut reader, &mut trees)?;
            }
            marker::SOF0 | marker::SOF2 => {
                progressive = word == marker::SOF2;
                frame = parse_sof(&mut reader)?;
            }
            marker::EOI => return Err(StegoError::UnsupportedFormat),
            _ if marker::has_length(word) => {
                let length = reader.read_u16()? as usize;
                if length < 2 {
                    return Err(StegoError::UnsupportedFormat);
                }
                reader.skip(length - 2)?;
            }
            _ => return Err(StegoError::UnsupportedFormat),
        }
    }
}

/// One DHT segment can define several tables back to back.
fn parse_dht(reader: &mut BitReader, trees: &mut HashMap<u8, HuffmanTree>) -> Result<()> {
    let length = reader.read_u16()? as usize;
    if length < 2 {
        return Err(StegoError::UnsupportedFormat);
    }
    let segment_end = reader.position() + length - 2;

    while reader.position() < segment_end {
        let key = reader.read_u8()?;
        let mut counts = [0u8; 16];
        for c in counts.iter_mut() {
            *c = reader.read_u8()?;
        }
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        let mut symbols = Vec::with_capacity(total);
        for _ in 0..total {
            symbols.push(reader.read_u8()?);
        }
        debug!("huffman table {key:#04x}: {total} symbols");
        trees.insert(key, HuffmanTree::build(&counts, &symbols)?);
    }
    Ok(())
}

/// Frame header: returns `(component id, data units per MCU)` in file order.
fn parse_sof(reader: &mut BitReader) -> Result<Vec<(u8, usize)>> {
    let _length = reader.read_u16()?;
    let _precision = reader.read_u8()?;
    let _height = reader.read_u16()?;
    let _width = reader.read_u16()?;
    let component_count = reader.read_u8()?;

    let mut frame = Vec::with_capacity(component_count as usize);
    for _ in 0..component_count {
        let id = reader.read_u8()?;
        let sampling = reader.read_u8()?;
        let _quant = reader.read_u8()?;
        let repeat = ((sampling >> 4) & 0x0F) as usize * (sampling & 0x0F) as usize;
        if repeat == 0 {
            return Err(StegoError::UnsupportedFormat);
        }
        frame.push((id, repeat));
    }
    Ok(frame)
}

fn parse_sos(reader: &mut BitReader, frame: &[(u8, usize)]) -> Result<Vec<JpegComponent>> {
    let _length = reader.read_u16()?;
    let component_count = reader.read_u8()?;

    let mut components = Vec::with_capacity(component_count as usize);
    for index in 0..component_count as usize {
        let selector = reader.read_u8()?;
        let tables = reader.read_u8()?;

        // Match the frame component by id, falling back to position.
        let repeat_count = frame
            .iter()
            .find(|&&(id, _)| id == selector)
            .or_else(|| frame.get(index))
            .map(|&(_, repeat)| repeat)
            .ok_or(StegoError::UnsupportedFormat)?;

        components.push(JpegComponent {
            selector,
            repeat_count,
            dc_table: (tables >> 4) & 0x0F,
            ac_table: 0x10 | (tables & 0x0F),
        });
    }
    if components.is_empty() {
        return Err(StegoError::UnsupportedFormat);
    }

    // Spectral selection and successive approximation, fixed for baseline.
    reader.skip(3)?;
    Ok(components)
}
