/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A spiffy DEFLATE compressor and decompressor.
//!
//! This crate implements RFC 1951 in both directions together with
//! the gzip (RFC 1952) container, in 100% safe Rust.
//!
//! Use it if
//! - You want a self-contained gzip codec with no C dependencies
//! - You want typed errors that say what actually went wrong
//! - You want the decoder to hand back whatever it produced before
//!   an error, not just the error
//!
//! # Usage
//!
//! Decoding gzip data
//! ```no_run
//! use zune_deflate::DeflateDecoder;
//! let totally_valid_data = [0; 23];
//! let mut decoder = DeflateDecoder::new(&totally_valid_data);
//!
//! let decompressed = decoder.decode_gzip();
//! ```
//!
//! Encoding a gzip member with a recorded file name
//! ```
//! use zune_deflate::{DeflateEncodeOptions, DeflateEncoder};
//!
//! let options = DeflateEncodeOptions::default().set_filename("hello.txt".to_string());
//! let mut encoder = DeflateEncoder::new_with_options(b"hello", options);
//! let compressed = encoder.encode_gzip().unwrap();
//! ```
//!
//! Decoding deflate data without verifying any checksum, there is
//! none in a bare deflate stream
//! ```no_run
//! use zune_deflate::DeflateDecoder;
//! use zune_deflate::DeflateOptions;
//! let totally_valid_data = [0; 23];
//! let options = DeflateOptions::default().set_limit(1 << 20);
//! let mut decoder = DeflateDecoder::new_with_options(&totally_valid_data, options);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
extern crate core;

pub use crate::decoder::DeflateDecoder;
pub use crate::encoder::DeflateEncoder;
#[cfg(feature = "gzip")]
pub use crate::gzip::GzipHeader;
pub use crate::options::{DeflateEncodeOptions, DeflateEncodingStrategy, DeflateOptions};

mod bitstream;
mod constants;
pub mod crc32;
mod decoder;
mod encoder;
pub mod errors;
#[cfg(feature = "gzip")]
mod gzip;
mod huffman;
mod lz77;
mod options;
mod window;
