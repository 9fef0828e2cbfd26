//! Multistage assembly and disassembly of nested carriers.
//!
//! A chain is built innermost-out: the terminal payload (text or a raw
//! file) is framed and hidden in the innermost carrier image, the resulting
//! image becomes the payload of the next carrier, and so on until the
//! outermost carrier. Disassembly walks the other way, peeling one layer at
//! a time for as long as what comes out still looks like a carrier image.

use log::{debug, info};

use crate::error::{Result, StegoError};
use crate::jpeg::headers::detect_byte_order;
use crate::{bmp, jpeg, payload};

/// Carrier formats a chain layer can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierKind {
    Bmp,
    Jpeg,
}

impl CarrierKind {
    pub fn extension(&self) -> &'static str {
        match self {
            CarrierKind::Bmp => "bmp",
            CarrierKind::Jpeg => "jpg",
        }
    }
}

/// Classify a byte buffer by its magic bytes.
pub fn sniff(data: &[u8]) -> Option<CarrierKind> {
    if data.starts_with(b"BM") {
        return Some(CarrierKind::Bmp);
    }
    if detect_byte_order(data).is_ok() {
        return Some(CarrierKind::Jpeg);
    }
    None
}

/// One step of a chain, outermost first. The last layer is the terminal
/// payload; every other layer is a carrier image that swallows everything
/// after it.
pub enum Layer {
    Text(String),
    File(Vec<u8>),
}

/// One recovered step of a chain, innermost last.
#[derive(Debug, PartialEq, Eq)]
pub enum Unveiled {
    Image { kind: CarrierKind, bytes: Vec<u8> },
    Text(String),
}

fn embed_into(kind: CarrierKind, carrier: &[u8], framed: &[u8]) -> Result<Vec<u8>> {
    match kind {
        CarrierKind::Bmp => bmp::embed(carrier, framed),
        CarrierKind::Jpeg => jpeg::embed(carrier, framed),
    }
}

fn extract_from(kind: CarrierKind, carrier: &[u8]) -> Result<Vec<u8>> {
    match kind {
        CarrierKind::Bmp => bmp::extract(carrier),
        CarrierKind::Jpeg => jpeg::extract(carrier),
    }
}

/// Framed payload bytes the carrier can hold.
pub fn capacity(data: &[u8]) -> Result<usize> {
    match sniff(data).ok_or(StegoError::UnsupportedFormat)? {
        CarrierKind::Bmp => bmp::capacity(data),
        CarrierKind::Jpeg => jpeg::capacity(data),
    }
}

/// Nest `layers` (outermost first) inside the outer `carrier`.
///
/// Intermediate layers must themselves be carrier images; only the last
/// layer may be text or an arbitrary file.
pub fn assemble(carrier: &[u8], layers: &[Layer]) -> Result<Vec<u8>> {
    let (terminal, intermediates) = layers.split_last().ok_or(StegoError::MissingPayload)?;

    let mut current = match terminal {
        Layer::Text(text) => payload::encode_text(text),
        Layer::File(bytes) => bytes.clone(),
    };

    for layer in intermediates.iter().rev() {
        let Layer::File(bytes) = layer else {
            return Err(StegoError::MissingPayload);
        };
        let kind = sniff(bytes).ok_or(StegoError::UnsupportedMedia)?;
        debug!("nesting {} bytes inside a {kind:?} layer", current.len());
        current = embed_into(kind, bytes, &payload::frame(&current))?;
    }

    let kind = sniff(carrier).ok_or(StegoError::UnsupportedMedia)?;
    info!("assembled {} layers into a {kind:?} carrier", layers.len());
    embed_into(kind, carrier, &payload::frame(&current))
}

/// Peel every layer out of `carrier`, innermost last.
///
/// Extraction failure on the outermost carrier is an error; deeper down it
/// just means the previous image was the terminal layer.
pub fn disassemble(carrier: &[u8]) -> Result<Vec<Unveiled>> {
    let kind = sniff(carrier).ok_or(StegoError::UnsupportedFormat)?;
    let mut current = extract_from(kind, carrier)?;

    let mut unveiled = Vec::new();
    loop {
        match sniff(&current) {
            Some(kind) => match extract_from(kind, &current) {
                Ok(next) => {
                    debug!("peeled a {kind:?} layer of {} bytes", current.len());
                    unveiled.push(Unveiled::Image {
                        kind,
                        bytes: current,
                    });
                    current = next;
                }
                Err(err) => {
                    debug!("image layer carries nothing further: {err}");
                    unveiled.push(Unveiled::Image {
                        kind,
                        bytes: current,
                    });
                    break;
                }
            },
            None => {
                unveiled.push(Unveiled::Text(payload::decode_text(&current)?));
                break;
            }
        }
    }
    info!("recovered {} layers", unveiled.len());
    Ok(unveiled)
}
