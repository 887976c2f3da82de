//! # qrstamp
//!
//! Turn arbitrary user text into a scannable QR code image, optionally stamped with a round logo,
//! at any resolution.
//!
//! `qrstamp` is the part between the text box and the symbol encoder: it cleans the input,
//! picks the smallest symbol version that will hold it, and composites the encoded matrix onto a
//! canvas with a quiet zone and an optional icon. The matrix itself comes from any
//! [`SymbolEncoder`](encoder::SymbolEncoder); the bundled [`QrEncoder`](encoder::QrEncoder) uses
//! the `qrcode` crate.
//!
//! ## Features
//!
//! - Strip byte-order marks, control characters and zero-width codepoints from the input.
//! - Size the symbol up front from a capacity table at one of four error correction levels.
//! - Render at a fixed preview size and re-render at any export size from the same input.
//! - Overlay a logo clipped to a circle on a light halo.
//! - Export as PNG with a `qrcode-{size}x{size}.png` file name.
//!
//! ## Example
//!
//! ```rust
//! use qrstamp::capacity::ErrorCorrectionLevel;
//! use qrstamp::helper::Studio;
//!
//! let mut studio = Studio::new();
//! studio.generate("\u{FEFF}https://example.com", ErrorCorrectionLevel::High).unwrap();
//!
//! let export = studio.export(1024).unwrap();
//! let path = export.save_to(std::env::temp_dir()).unwrap();
//! assert!(path.ends_with("qrcode-1024x1024.png"));
//! ```
//!
//! ## Modules
//!
//! - [`sanitize`]: input cleaning.
//! - [`capacity`]: error correction levels, capacity table and version selection.
//! - [`encoder`]: the symbol matrix and the encoder boundary.
//! - [`compose`]: rasterizing with quiet zone and icon.
//! - [`icon`]: decoding logos, optionally in the background.
//! - [`session`]: the last generation and the current icon.
//! - [`helper`]: the generate/export pipeline and PNG output.
//! - [`config`]: TOML configuration.

#![forbid(unsafe_code)]

pub mod capacity;
pub mod compose;
pub mod config;
pub mod encoder;
pub mod error;
pub mod helper;
pub mod icon;
pub mod sanitize;
pub mod session;

pub use error::{Error, Result};
