/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{Debug, Display, Formatter};

/// A struct returned when decompression fails
pub struct InflateDecodeErrors {
    /// reason why decompression fails
    pub error: DecodeErrorStatus,
    /// Decoded data up until that decompression error
    pub data:  Vec<u8>
}

impl InflateDecodeErrors {
    /// Create a new decode wrapper with `data` being
    /// the bytes decoded before the error was hit
    pub fn new(error: DecodeErrorStatus, data: Vec<u8>) -> InflateDecodeErrors {
        InflateDecodeErrors { error, data }
    }

    /// Create a new decode wrapper with an empty vector
    pub fn new_with_error(error: DecodeErrorStatus) -> InflateDecodeErrors {
        InflateDecodeErrors::new(error, Vec::new())
    }
}

impl Debug for InflateDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self.error)
    }
}

impl Display for InflateDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self.error)
    }
}

/// Reasons a DEFLATE or gzip stream fails to decode.
pub enum DecodeErrorStatus {
    /// The input ended before the structure it was carrying did
    InsufficientData,
    /// The gzip magic, compression method or flag byte is wrong
    ///
    /// Carries the offending detail
    InvalidHeader(&'static str),
    /// A gzip FNAME field ran to end of input with no NUL terminator
    TruncatedHeaderFname,
    /// A gzip FCOMMENT field ran to end of input with no NUL terminator
    TruncatedHeaderComment,
    /// A gzip FEXTRA field is longer than the bytes that follow it
    InvalidExtraField,
    /// A block header carried the reserved block type 3
    UnexpectedBlockType(u8),
    /// A stored block's NLEN is not the complement of its LEN
    UnexpectedNLenBytes(u16, u16),
    /// A literal/length symbol outside 0..=285 was decoded
    InvalidLiteralLength(u16),
    /// A code-length symbol could not be applied
    ///
    /// Either a repeat code had no previous length or a run overshot
    /// the number of lengths the header promised
    InvalidCLSymbol(u16),
    /// A back-reference pointed further back than the bytes produced
    ///
    /// # Arguments
    /// - 1st argument is the requested distance
    /// - 2nd argument is the window occupancy
    InvalidDistance(usize, usize),
    /// A transmitted set of code lengths cannot form a valid
    /// Huffman code
    UndecodableBitStream,
    /// 15 bits accumulated without matching any codeword
    BadEncoding,
    /// Stored trailer CRC-32 does not match the decoded output.
    MismatchedCRC(u32, u32),
    /// Stored trailer size does not match the decoded output length.
    MismatchedISize(u32, u32),
    /// Limit set by the user was exceeded by
    /// decompressed output
    OutputLimitExceeded(usize, usize),
    /// Anything that isn't significant
    Generic(&'static str),
    GenericStr(String)
}

impl Debug for DecodeErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientData => writeln!(f, "Insufficient data"),
            Self::InvalidHeader(reason) => writeln!(f, "Invalid header: {reason}"),
            Self::TruncatedHeaderFname => {
                writeln!(f, "Truncated header, file name has no NUL terminator")
            }
            Self::TruncatedHeaderComment => {
                writeln!(f, "Truncated header, comment has no NUL terminator")
            }
            Self::InvalidExtraField => writeln!(f, "Extra field length exceeds remaining header"),
            Self::UnexpectedBlockType(btype) => {
                writeln!(f, "Unexpected block type {btype}, expected 0, 1 or 2")
            }
            Self::UnexpectedNLenBytes(len, nlen) => writeln!(
                f,
                "Stored block NLEN {nlen:#06X} is not the complement of LEN {len:#06X}"
            ),
            Self::InvalidLiteralLength(sym) => {
                writeln!(f, "Invalid literal/length symbol {sym}")
            }
            Self::InvalidCLSymbol(sym) => {
                writeln!(f, "Code length symbol {sym} cannot be applied here")
            }
            Self::InvalidDistance(distance, available) => writeln!(
                f,
                "Invalid distance {distance}, only {available} bytes of output exist"
            ),
            Self::UndecodableBitStream => {
                writeln!(f, "Transmitted code lengths do not form a usable code")
            }
            Self::BadEncoding => writeln!(f, "Corrupt bit stream, no codeword within 15 bits"),
            Self::MismatchedCRC(expected, found) => {
                writeln!(f, "Mismatched CRC, expected {expected:#010X} but found {found:#010X}")
            }
            Self::MismatchedISize(expected, found) => {
                writeln!(f, "Mismatched ISIZE, expected {expected} but found {found}")
            }
            Self::OutputLimitExceeded(limit, current) => writeln!(
                f,
                "Output limit exceeded, set limit was {limit} and output size is {current}"
            ),
            Self::Generic(reason) => writeln!(f, "{reason}"),
            Self::GenericStr(reason) => writeln!(f, "{reason}")
        }
    }
}

impl Display for DecodeErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{self:?}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InflateDecodeErrors {}

/// Errors encountered during encoding
///
/// These are guardrails; a correctly segmented block pipeline does not
/// trigger them.
pub enum DeflateEncodeErrors {
    /// A block buffered more symbols than its queue can hold
    OutOfQueueSpace(usize),
    /// A stored block was asked to frame more than 65535 bytes
    InvalidBlockLength(usize),
    /// A symbol outside the literal/length alphabet reached emission
    InvalidSymbol(u16),
    /// A gzip header string field contains a NUL byte
    InvalidHeaderField(&'static str),
    Generic(&'static str)
}

impl Debug for DeflateEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfQueueSpace(count) => {
                writeln!(f, "Symbol queue overflow, {count} symbols buffered for one block")
            }
            Self::InvalidBlockLength(length) => {
                writeln!(f, "Stored block length {length} exceeds 65535")
            }
            Self::InvalidSymbol(sym) => writeln!(f, "Symbol {sym} is outside the alphabet"),
            Self::InvalidHeaderField(field) => {
                writeln!(f, "Gzip header {field} may not contain a NUL byte")
            }
            Self::Generic(reason) => writeln!(f, "{reason}")
        }
    }
}

impl Display for DeflateEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{self:?}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeflateEncodeErrors {}
