/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The gzip (RFC 1952) member framing around a deflate payload.
//!
//! A member is a fixed ten byte header, optional FEXTRA/FNAME/
//! FCOMMENT/FHCRC fields in that order, the deflate stream, then an
//! eight byte trailer holding the CRC-32 and the uncompressed size
//! modulo 2³². Name and comment travel as NUL-terminated ISO-8859-1.

use alloc::string::String;
use alloc::vec::Vec;

use crate::crc32::crc32;
use crate::errors::{DecodeErrorStatus, DeflateEncodeErrors};
use crate::options::DeflateEncodeOptions;

pub(crate) const GZIP_ID1: u8 = 0x1F;
pub(crate) const GZIP_ID2: u8 = 0x8B;
pub(crate) const GZIP_CM_DEFLATE: u8 = 8;

const GZIP_FTEXT: u8 = 1 << 0;
const GZIP_FHCRC: u8 = 1 << 1;
const GZIP_FEXTRA: u8 = 1 << 2;
const GZIP_FNAME: u8 = 1 << 3;
const GZIP_FCOMMENT: u8 = 1 << 4;
const GZIP_FRESERVED: u8 = 0xE0;

/// Everything a gzip member header said about its payload.
#[derive(Debug, Clone, Default)]
pub struct GzipHeader {
    /// Modification time, seconds since the Unix epoch, 0 if unset.
    pub mtime:    u32,
    /// Compression level hint, 2 = best, 4 = fastest.
    pub xfl:      u8,
    /// Originating operating system, 255 = unknown.
    pub os:       u8,
    /// Original file name, if recorded.
    pub filename: Option<String>,
    /// File comment, if recorded.
    pub comment:  Option<String>,
    /// Raw FEXTRA payload, if present.
    pub extra:    Option<Vec<u8>>,
    /// The FTEXT hint, the producer believed the data to be text.
    pub is_text:  bool
}

/// Parse a member header from the front of `data`.
///
/// Returns the parsed header and the number of bytes it occupied.
pub(crate) fn parse_header(data: &[u8]) -> Result<(GzipHeader, usize), DecodeErrorStatus> {
    if data.len() < 10 {
        return Err(DecodeErrorStatus::InsufficientData);
    }
    if data[0] != GZIP_ID1 || data[1] != GZIP_ID2 {
        return Err(DecodeErrorStatus::InvalidHeader("not a gzip stream, bad magic"));
    }
    if data[2] != GZIP_CM_DEFLATE {
        return Err(DecodeErrorStatus::InvalidHeader("unknown compression method"));
    }

    let flags = data[3];

    if flags & GZIP_FRESERVED != 0 {
        return Err(DecodeErrorStatus::InvalidHeader("reserved flag bits set"));
    }

    let mut header = GzipHeader {
        mtime: u32::from_le_bytes(data[4..8].try_into().unwrap()),
        xfl: data[8],
        os: data[9],
        is_text: flags & GZIP_FTEXT != 0,
        ..GzipHeader::default()
    };

    let mut position = 10;

    if flags & GZIP_FEXTRA != 0 {
        if data.len() < position + 2 {
            return Err(DecodeErrorStatus::InsufficientData);
        }

        let xlen = usize::from(u16::from_le_bytes(data[position..position + 2].try_into().unwrap()));

        position += 2;

        if data.len() < position + xlen {
            return Err(DecodeErrorStatus::InvalidExtraField);
        }
        header.extra = Some(data[position..position + xlen].to_vec());
        position += xlen;
    }

    if flags & GZIP_FNAME != 0 {
        let (name, consumed) = read_latin1_string(&data[position..])
            .ok_or(DecodeErrorStatus::TruncatedHeaderFname)?;

        header.filename = Some(name);
        position += consumed;
    }

    if flags & GZIP_FCOMMENT != 0 {
        let (comment, consumed) = read_latin1_string(&data[position..])
            .ok_or(DecodeErrorStatus::TruncatedHeaderComment)?;

        header.comment = Some(comment);
        position += consumed;
    }

    if flags & GZIP_FHCRC != 0 {
        if data.len() < position + 2 {
            return Err(DecodeErrorStatus::InsufficientData);
        }

        let stored = u16::from_le_bytes(data[position..position + 2].try_into().unwrap());
        let computed = (crc32(&data[..position]) & 0xFFFF) as u16;

        if stored != computed {
            return Err(DecodeErrorStatus::MismatchedCRC(
                u32::from(stored),
                u32::from(computed)
            ));
        }
        position += 2;
    }

    Ok((header, position))
}

/// Write a member header for `options` into `out`.
pub(crate) fn write_header(
    out: &mut Vec<u8>, options: &DeflateEncodeOptions
) -> Result<(), DeflateEncodeErrors> {
    let start = out.len();
    let mut flags = 0_u8;

    if options.extra().is_some() {
        flags |= GZIP_FEXTRA;
    }
    if options.filename().is_some() {
        flags |= GZIP_FNAME;
    }
    if options.comment().is_some() {
        flags |= GZIP_FCOMMENT;
    }
    if options.header_crc() {
        flags |= GZIP_FHCRC;
    }

    out.extend_from_slice(&[GZIP_ID1, GZIP_ID2, GZIP_CM_DEFLATE, flags]);
    out.extend_from_slice(&options.mtime().to_le_bytes());
    out.push(options.strategy().xfl());
    out.push(options.os());

    if let Some(extra) = options.extra() {
        if extra.len() > usize::from(u16::MAX) {
            return Err(DeflateEncodeErrors::Generic("extra field longer than 65535 bytes"));
        }
        out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        out.extend_from_slice(extra);
    }

    if let Some(name) = options.filename() {
        write_latin1_string(out, name, "file name")?;
    }
    if let Some(comment) = options.comment() {
        write_latin1_string(out, comment, "comment")?;
    }

    if options.header_crc() {
        let crc16 = (crc32(&out[start..]) & 0xFFFF) as u16;

        out.extend_from_slice(&crc16.to_le_bytes());
    }
    Ok(())
}

/// Append the member trailer, CRC-32 then ISIZE, both little endian.
pub(crate) fn write_trailer(out: &mut Vec<u8>, crc: u32, input_size: usize) {
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(input_size as u32).to_le_bytes());
}

/// Read a NUL-terminated ISO-8859-1 field.
///
/// Returns the decoded string and bytes consumed including the NUL,
/// or `None` when the terminator is missing.
fn read_latin1_string(data: &[u8]) -> Option<(String, usize)> {
    let nul = data.iter().position(|byte| *byte == 0)?;
    // ISO-8859-1 bytes map one to one onto the first Unicode block
    let value = data[..nul].iter().map(|byte| char::from(*byte)).collect();

    Some((value, nul + 1))
}

/// Append `value` as NUL-terminated ISO-8859-1.
///
/// Characters outside Latin-1 are dropped, the way gzip drops what
/// it cannot store. An embedded NUL would terminate the field early
/// and is rejected instead.
fn write_latin1_string(
    out: &mut Vec<u8>, value: &str, field: &'static str
) -> Result<(), DeflateEncodeErrors> {
    if value.contains('\0') {
        return Err(DeflateEncodeErrors::InvalidHeaderField(field));
    }

    for ch in value.chars() {
        let code = u32::from(ch);

        if code <= 0xFF {
            out.push(code as u8);
        }
    }
    out.push(0);
    Ok(())
}
