//! # qrsmith
//!
//! A Rust library for encoding text and binary data into QR Code Model 2 symbols.
//!
//! `qrsmith` covers the whole encoding pipeline: segmentation into character modes,
//! version and error correction selection, Reed-Solomon error correction, function
//! pattern and data placement, and automatic mask selection by penalty score. It
//! supports versions 1 to 40, all four error correction levels, and the numeric,
//! alphanumeric, byte, Kanji, ECI and structured append modes.
//!
//! ## Features
//!
//! - Encode data in numeric, alphanumeric, byte, Kanji or ECI modes.
//! - Bit-optimal mixed-mode segmentation with [`planner::make_segments_optimally`].
//! - Split long payloads across up to 16 symbols with structured append.
//! - Render QR codes as console text, PNG images, SVG documents or SVG paths.
//! - Evaluate the eight mask candidates in parallel (`parallel` feature, on by default).
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrsmith = "0.2" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! ```rust
//! use qrsmith::{helper::to_svg_string, QrCode, QrCodeEcc};
//!
//! let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Medium).unwrap();
//! assert_eq!(qr.version().value(), 1);
//! let svg = to_svg_string(&qr, 4, "#000000", "#FFFFFF").unwrap();
//! assert!(svg.contains("<path"));
//! ```
//!
//! Full control over segments and parameters:
//!
//! ```rust
//! use qrsmith::{EncodeOptions, Mask, QrCode, QrCodeEcc, QrSegment};
//!
//! let segs = vec![
//!     QrSegment::make_alphanumeric("THE ANSWER IS ").unwrap(),
//!     QrSegment::make_numeric("42").unwrap(),
//! ];
//! let options = EncodeOptions::new().ecl(QrCodeEcc::High).mask(Some(Mask::new(3).unwrap()));
//! let qr = QrCode::encode_segments_with(&segs, &options).unwrap();
//! assert_eq!(qr.mask().value(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: Core QR code encoding functionality.
//! - [`segment`]: Data segments and character modes.
//! - [`planner`]: Optimal segmentation and structured append splitting.
//! - [`helper`]: Utilities for rendering QR codes in various formats.
#![forbid(unsafe_code)]

pub mod bit_buffer;
pub mod error;
mod grid;
pub mod helper;
mod penalty;
pub mod planner;
pub mod qrcode;
pub mod reed_solomon;
pub mod segment;

pub use bit_buffer::BitBuffer;
pub use error::{DataTooLong, QrError};
pub use qrcode::{EncodeOptions, Mask, QrCode, QrCodeEcc, Version};
pub use segment::{QrSegment, QrSegmentMode};
