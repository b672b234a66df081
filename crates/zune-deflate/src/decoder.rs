/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Deflate and gzip decoding.

use alloc::vec::Vec;

use log::{trace, warn};

use crate::bitstream::BitStreamReader;
use crate::constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC, DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_UNCOMPRESSED,
    DEFLATE_END_OF_BLOCK, DEFLATE_MAX_CODEWORD_LENGTH, DEFLATE_NUM_LITLEN_SYMS,
    DEFLATE_NUM_OFFSET_SYMS, DEFLATE_NUM_PRECODE_SYMS, DEFLATE_PRECODE_LENS_PERMUTATION,
    FIXED_LITLEN_LENGTHS, FIXED_OFFSET_LENGTHS, LENGTH_BASE, LENGTH_EXTRA_BITS, OFFSET_BASE,
    OFFSET_EXTRA_BITS
};
use crate::errors::{DecodeErrorStatus, InflateDecodeErrors};
use crate::huffman::HuffmanDecoder;
use crate::options::DeflateOptions;
use crate::window::SlidingWindow;

#[cfg(feature = "gzip")]
use crate::crc32::crc32;
#[cfg(feature = "gzip")]
use crate::gzip::{self, GzipHeader};

/// A deflate/gzip decoder.
///
/// The decoder is initialized with the full compressed buffer and
/// either of [`decode_deflate`] for a bare RFC 1951 stream or
/// [`decode_gzip`] for one or more RFC 1952 members.
///
/// [`decode_deflate`]: DeflateDecoder::decode_deflate
/// [`decode_gzip`]: DeflateDecoder::decode_gzip
pub struct DeflateDecoder<'a> {
    data:          &'a [u8],
    position:      usize,
    stream:        BitStreamReader<'a>,
    options:       DeflateOptions,
    window:        SlidingWindow,
    is_last_block: bool,
    #[cfg(feature = "gzip")]
    gzip_header:   Option<GzipHeader>
}

impl<'a> DeflateDecoder<'a> {
    /// Create a decoder over `data` with the default options.
    ///
    /// # Example
    /// ```no_run
    /// let totally_valid_data = [0; 23];
    /// let mut decoder = zune_deflate::DeflateDecoder::new(&totally_valid_data);
    /// let decompressed = decoder.decode_deflate();
    /// ```
    pub fn new(data: &'a [u8]) -> DeflateDecoder<'a> {
        DeflateDecoder::new_with_options(data, DeflateOptions::default())
    }

    /// Create a decoder that obeys the given restrictions.
    ///
    /// E.g. an output [limit](crate::DeflateOptions::set_limit) guards
    /// against decompression bombs.
    pub fn new_with_options(data: &'a [u8], options: DeflateOptions) -> DeflateDecoder<'a> {
        DeflateDecoder {
            data,
            position: 0,
            stream: BitStreamReader::new(data),
            options,
            window: SlidingWindow::new(),
            is_last_block: false,
            #[cfg(feature = "gzip")]
            gzip_header: None
        }
    }

    /// Decode a bare deflate stream.
    ///
    /// # Returns
    /// - On success: the decompressed bytes
    /// - On error: the failing condition together with whatever was
    ///   decoded before it was hit
    pub fn decode_deflate(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        let mut out = Vec::with_capacity(self.options.size_hint());

        match self.inflate(&mut out) {
            Ok(()) => Ok(out),
            Err(error) => Err(InflateDecodeErrors::new(error, out))
        }
    }

    /// Decode a gzip stream, including its header and trailer.
    ///
    /// Concatenated members decode to their concatenated output, the
    /// same as the files `cat a.gz b.gz` produces. Details of the
    /// last member's header are available from
    /// [`gzip_header`](Self::gzip_header) afterwards.
    ///
    /// On error the returned wrapper carries every byte decoded
    /// before the failing condition, so members that decoded cleanly
    /// ahead of a corrupt one are not lost.
    #[cfg(feature = "gzip")]
    pub fn decode_gzip(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        let mut out = Vec::with_capacity(self.options.size_hint());

        self.decode_gzip_members(&mut out)?;

        Ok(out)
    }

    /// Header of the most recently decoded gzip member.
    ///
    /// `None` until [`decode_gzip`](Self::decode_gzip) ran.
    #[cfg(feature = "gzip")]
    pub const fn gzip_header(&self) -> Option<&GzipHeader> {
        self.gzip_header.as_ref()
    }

    #[cfg(feature = "gzip")]
    fn decode_gzip_members(&mut self, out: &mut Vec<u8>) -> Result<(), InflateDecodeErrors> {
        loop {
            let (header, consumed) = match gzip::parse_header(&self.data[self.position..]) {
                Ok(parsed) => parsed,
                Err(error) => return Err(InflateDecodeErrors::new(error, core::mem::take(out)))
            };

            trace!(
                "gzip member: mtime {} os {} name {:?}",
                header.mtime,
                header.os,
                header.filename
            );

            self.position += consumed;
            self.gzip_header = Some(header);

            // each member carries an independent deflate stream
            self.window = SlidingWindow::new();
            self.is_last_block = false;

            let member_start = out.len();

            if let Err(error) = self.inflate(out) {
                return Err(InflateDecodeErrors::new(error, core::mem::take(out)));
            }

            if let Err(error) = self.verify_trailer(&out[member_start..]) {
                // everything up to the corrupt trailer decoded
                // cleanly, hand it back alongside the error
                return Err(InflateDecodeErrors::new(error, core::mem::take(out)));
            }

            if self.position == self.data.len() {
                return Ok(());
            }
        }
    }

    #[cfg(feature = "gzip")]
    fn verify_trailer(&mut self, member: &[u8]) -> Result<(), DecodeErrorStatus> {
        if self.data.len() < self.position + 8 {
            return Err(DecodeErrorStatus::InsufficientData);
        }

        let trailer = &self.data[self.position..self.position + 8];
        let stored_crc = u32::from_le_bytes(trailer[..4].try_into().unwrap());
        let stored_size = u32::from_le_bytes(trailer[4..].try_into().unwrap());

        self.position += 8;

        if self.options.confirm_checksum() {
            let computed_crc = crc32(member);

            if stored_crc != computed_crc {
                return Err(DecodeErrorStatus::MismatchedCRC(stored_crc, computed_crc));
            }

            let computed_size = member.len() as u32;

            if stored_size != computed_size {
                return Err(DecodeErrorStatus::MismatchedISize(stored_size, computed_size));
            }
        }
        Ok(())
    }

    /// Decode one deflate stream starting at `self.position`,
    /// leaving `self.position` on the byte after its final block.
    fn inflate(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeErrorStatus> {
        self.stream = BitStreamReader::new(self.data);
        self.stream.seek_to_byte(self.position);

        loop {
            self.is_last_block = self.read_bits(1)? == 1;

            let block_type = self.read_bits(2)? as u8;

            match block_type {
                DEFLATE_BLOCKTYPE_UNCOMPRESSED => self.decode_stored(out)?,
                DEFLATE_BLOCKTYPE_STATIC => {
                    trace!("fixed huffman block");

                    let litlen = HuffmanDecoder::from_lengths(&FIXED_LITLEN_LENGTHS)?;
                    let offset = HuffmanDecoder::from_lengths(&FIXED_OFFSET_LENGTHS)?;

                    self.decode_huffman_block(&litlen, &offset, out)?;
                }
                DEFLATE_BLOCKTYPE_DYNAMIC => {
                    let (litlen, offset) = self.read_dynamic_tables()?;

                    self.decode_huffman_block(&litlen, &offset, out)?;
                }
                other => return Err(DecodeErrorStatus::UnexpectedBlockType(other))
            }

            if self.is_last_block {
                break;
            }
        }

        self.stream.align_to_byte();
        self.position = self.stream.byte_position();

        Ok(())
    }

    /// Copy a stored block, after checking its LEN/NLEN framing.
    fn decode_stored(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeErrorStatus> {
        if self.stream.bits_left & 7 != 0 && self.stream.buffer & ((1 << (self.stream.bits_left & 7)) - 1) != 0 {
            warn!("nonzero padding bits before stored block");
        }
        self.stream.align_to_byte();

        let len = self.read_bits(16)? as u16;
        let nlen = self.read_bits(16)? as u16;

        if nlen != !len {
            return Err(DecodeErrorStatus::UnexpectedNLenBytes(len, nlen));
        }

        let start = self.stream.byte_position();
        let length = usize::from(len);

        trace!("stored block, {length} bytes");

        if start + length > self.data.len() {
            return Err(DecodeErrorStatus::InsufficientData);
        }

        self.check_limit(out.len() + length)?;

        for byte in &self.data[start..start + length] {
            out.push(*byte);
            self.window.push(*byte);
        }
        self.stream.seek_to_byte(start + length);

        Ok(())
    }

    /// Rebuild the literal/length and distance tables a dynamic
    /// block header transmits through the code-length alphabet.
    fn read_dynamic_tables(
        &mut self
    ) -> Result<(HuffmanDecoder, HuffmanDecoder), DecodeErrorStatus> {
        let num_litlen_syms = 257 + self.read_bits(5)? as usize;
        let num_offset_syms = 1 + self.read_bits(5)? as usize;
        let num_explicit_precode_lens = 4 + self.read_bits(4)? as usize;

        trace!(
            "dynamic block, {num_litlen_syms} litlen, {num_offset_syms} distance, {num_explicit_precode_lens} precode lens"
        );

        if num_litlen_syms > DEFLATE_NUM_LITLEN_SYMS {
            return Err(DecodeErrorStatus::Generic("too many literal/length symbols"));
        }
        if num_offset_syms > DEFLATE_NUM_OFFSET_SYMS {
            return Err(DecodeErrorStatus::Generic("too many distance symbols"));
        }

        let mut precode_lens = [0_u8; DEFLATE_NUM_PRECODE_SYMS];

        for i in DEFLATE_PRECODE_LENS_PERMUTATION
            .iter()
            .take(num_explicit_precode_lens)
        {
            precode_lens[usize::from(*i)] = self.read_bits(3)? as u8;
        }

        let precode = HuffmanDecoder::from_lengths(&precode_lens)?;

        let total = num_litlen_syms + num_offset_syms;
        let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS];
        let mut i = 0;

        while i < total {
            let presym = self.decode_symbol(&precode)?;

            match presym {
                0..=15 => {
                    lens[i] = presym as u8;
                    i += 1;
                }
                16 => {
                    // repeat previous length 3..=6 times
                    if i == 0 {
                        return Err(DecodeErrorStatus::InvalidCLSymbol(16));
                    }

                    let count = 3 + self.read_bits(2)? as usize;

                    if i + count > total {
                        return Err(DecodeErrorStatus::InvalidCLSymbol(16));
                    }

                    let previous = lens[i - 1];

                    lens[i..i + count].fill(previous);
                    i += count;
                }
                17 => {
                    // repeat zero 3..=10 times
                    let count = 3 + self.read_bits(3)? as usize;

                    if i + count > total {
                        return Err(DecodeErrorStatus::InvalidCLSymbol(17));
                    }
                    i += count;
                }
                18 => {
                    // repeat zero 11..=138 times
                    let count = 11 + self.read_bits(7)? as usize;

                    if i + count > total {
                        return Err(DecodeErrorStatus::InvalidCLSymbol(18));
                    }
                    i += count;
                }
                other => return Err(DecodeErrorStatus::InvalidCLSymbol(other))
            }
        }

        if lens[usize::from(DEFLATE_END_OF_BLOCK)] == 0 {
            return Err(DecodeErrorStatus::Generic("missing end-of-block code"));
        }

        let litlen = HuffmanDecoder::from_lengths(&lens[..num_litlen_syms])?;
        let offset =
            HuffmanDecoder::from_lengths(&lens[num_litlen_syms..num_litlen_syms + num_offset_syms])?;

        Ok((litlen, offset))
    }

    /// Decode literals and back-references until the end-of-block
    /// symbol.
    fn decode_huffman_block(
        &mut self, litlen: &HuffmanDecoder, offset: &HuffmanDecoder, out: &mut Vec<u8>
    ) -> Result<(), DecodeErrorStatus> {
        loop {
            let symbol = self.decode_symbol(litlen)?;

            if symbol < 256 {
                let byte = symbol as u8;

                self.check_limit(out.len() + 1)?;
                out.push(byte);
                self.window.push(byte);
                continue;
            }
            if symbol == DEFLATE_END_OF_BLOCK {
                return Ok(());
            }
            if symbol > 285 {
                return Err(DecodeErrorStatus::InvalidLiteralLength(symbol));
            }

            let length_index = usize::from(symbol) - 257;
            let length = usize::from(LENGTH_BASE[length_index])
                + self.read_bits(LENGTH_EXTRA_BITS[length_index])? as usize;

            let offset_sym = usize::from(self.decode_symbol(offset)?);

            if offset_sym >= DEFLATE_NUM_OFFSET_SYMS {
                return Err(DecodeErrorStatus::Generic("reserved distance code"));
            }

            let distance = usize::from(OFFSET_BASE[offset_sym])
                + self.read_bits(OFFSET_EXTRA_BITS[offset_sym])? as usize;

            self.check_limit(out.len() + length)?;
            self.window.copy_match(distance, length, out)?;
        }
    }

    /// Accumulate bits MSB-first until the table yields a symbol.
    #[inline(always)]
    fn decode_symbol(&mut self, table: &HuffmanDecoder) -> Result<u16, DecodeErrorStatus> {
        let mut code = 0_u16;

        for length in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
            code = (code << 1) | self.read_bits(1)? as u16;

            if let Some(symbol) = table.decode(code, length) {
                return Ok(symbol);
            }
        }
        Err(DecodeErrorStatus::BadEncoding)
    }

    #[inline(always)]
    fn read_bits(&mut self, count: u8) -> Result<u64, DecodeErrorStatus> {
        if !self.stream.has(count) {
            self.stream.refill();

            if !self.stream.has(count) {
                return Err(DecodeErrorStatus::InsufficientData);
            }
        }
        Ok(self.stream.get_bits(count))
    }

    #[inline(always)]
    fn check_limit(&self, size: usize) -> Result<(), DecodeErrorStatus> {
        if size > self.options.limit() {
            return Err(DecodeErrorStatus::OutputLimitExceeded(self.options.limit(), size));
        }
        Ok(())
    }
}
