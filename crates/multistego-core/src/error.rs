//! Error types for multistego operations.

use std::string::FromUtf8Error;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StegoError>;

/// Errors that can occur while hiding or unveiling data.
///
/// Every failure is surfaced immediately to the caller; no operation commits
/// a partial mutation to persistent storage.
#[derive(Error, Debug)]
pub enum StegoError {
    /// An 0xFF byte inside entropy-coded data was not followed by the
    /// mandatory 0x00 stuffing byte.
    #[error("malformed entropy-coded stream: 0xFF not followed by stuffing 0x00")]
    MalformedStream,

    /// Neither byte order yields a valid Start-Of-Image marker, the file is
    /// too short for a BMP header, or the frame type is not baseline DCT.
    #[error("carrier is not a supported BMP or baseline JPEG file")]
    UnsupportedFormat,

    /// The declared payload length exceeds the remaining carrier capacity.
    #[error("payload does not fit the carrier capacity")]
    TruncatedPayload,

    /// A category or Huffman table lookup failed during encoding. This is an
    /// internal inconsistency, not a user error.
    #[error("value {0} has no entry in the built Huffman/category tables")]
    UnknownHuffmanSymbol(i32),

    /// The scan header references a Huffman table that was never defined.
    #[error("missing Huffman table {0:#04x} referenced by scan")]
    MissingHuffmanTable(u8),

    /// A terminal text payload contained invalid UTF-8.
    #[error("invalid text data found inside a payload")]
    InvalidTextData(#[from] FromUtf8Error),

    /// A carrier file extension other than .bmp/.jpg/.jpeg was supplied.
    #[error("media format is not supported")]
    UnsupportedMedia,

    #[error("no carrier media set")]
    CarrierNotSet,

    #[error("no target file set")]
    TargetNotSet,

    #[error("no payload layers given")]
    MissingPayload,

    /// All other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
