//! # Multistego Core API
//!
//! Hides payloads in the least significant bits of image carriers and nests
//! carriers inside each other to arbitrary depth. Two formats are
//! supported:
//!
//! - **BMP**: payload bits replace the low bit of each pixel-array byte.
//! - **Baseline JPEG**: payload bits replace the low bit of quantized DCT
//!   coefficients, rewritten directly in the entropy-coded scan without
//!   ever leaving the frequency domain.
//!
//! # Usage Examples
//!
//! ## Hide a message behind two carrier layers
//!
//! ```no_run
//! multistego_core::api::hide::prepare()
//!     .with_message("Hello, World!")          // innermost payload
//!     .through_image("inner-carrier.bmp")     // hidden inside this image...
//!     .with_image("outer-carrier.jpg")        // ...which hides in this one
//!     .with_output("loaded.jpg")
//!     .execute()
//!     .expect("Failed to hide message");
//! ```
//!
//! ## Unveil every layer again
//!
//! ```no_run
//! multistego_core::api::unveil::prepare()
//!     .from_secret_file("loaded.jpg")
//!     .into_output_folder("recovered/")
//!     .execute()
//!     .expect("Failed to unveil layers");
//! ```

#![warn(clippy::redundant_else)]

pub mod api;
pub mod bits;
pub mod bmp;
pub mod chain;
pub mod error;
pub mod jpeg;
pub mod payload;

pub use crate::chain::{CarrierKind, Layer, Unveiled};
pub use crate::error::{Result, StegoError};
