//! Carrier fixtures assembled byte by byte.

use multistego_core::jpeg::scan::{self, DctBlock, DctCoefficient};
use multistego_core::jpeg::headers;

/// A 24-bit BMP with `pixels` bytes of pixel data.
pub fn minimal_bmp(pixels: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(54 + pixels);
    out.extend(b"BM");
    out.extend(((54 + pixels) as u32).to_le_bytes());
    out.extend([0u8; 4]);
    out.extend(54u32.to_le_bytes());
    out.extend(40u32.to_le_bytes());
    out.extend(4i32.to_le_bytes());
    out.extend(4i32.to_le_bytes());
    out.extend(1u16.to_le_bytes());
    out.extend(24u16.to_le_bytes());
    out.extend([0u8; 24]);
    out.resize(54 + pixels, 0xAA);
    out
}

fn push_segment(out: &mut Vec<u8>, word: u16, body: &[u8]) {
    out.extend(word.to_be_bytes());
    out.extend(((body.len() + 2) as u16).to_be_bytes());
    out.extend(body);
}

/// Single-component grayscale baseline headers: the default luminance DC
/// table plus an AC table holding all 98 symbols at code length 8.
fn jpeg_headers() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(0xFFD8u16.to_be_bytes());

    let mut dc = vec![0x00];
    dc.extend([0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]);
    dc.extend(0..=11u8);
    push_segment(&mut out, 0xFFC4, &dc);

    let mut ac = vec![0x10];
    let mut counts = [0u8; 16];
    counts[7] = 98;
    ac.extend(counts);
    ac.push(0x00);
    ac.push(0xF0);
    for category in 1..=6u8 {
        for run in 0..16u8 {
            ac.push((run << 4) | category);
        }
    }
    push_segment(&mut out, 0xFFC4, &ac);

    push_segment(
        &mut out,
        0xFFC0,
        &[0x08, 0x00, 0x10, 0x00, 0x10, 0x01, 0x01, 0x11, 0x00],
    );
    push_segment(&mut out, 0xFFDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out
}

fn block_with(coefficients: &[(usize, i16)]) -> DctBlock {
    let mut block = DctBlock {
        dc_table: 0x00,
        ac_table: 0x10,
        coefficients: [DctCoefficient::default(); 64],
    };
    for &(index, value) in coefficients {
        block.coefficients[index].value = value;
    }
    block
}

/// A baseline JPEG with `blocks` data units, each holding eight coefficients
/// that can carry a payload bit.
pub fn jpeg_carrier(blocks: usize) -> Vec<u8> {
    let mut file = jpeg_headers();
    let parsed = headers::parse(&file).expect("fixture headers");
    let blocks: Vec<DctBlock> = (0..blocks)
        .map(|i| {
            block_with(&[
                (0, 10 + (i % 40) as i16),
                (1, -8),
                (5, 13),
                (12, -27),
                (20, 4),
                (31, -4),
                (44, 55),
                (60, -2),
            ])
        })
        .collect();
    file.extend(scan::write_blocks(&blocks, &parsed).expect("fixture scan"));
    file.extend(0xFFD9u16.to_be_bytes());
    file
}
