/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Deflate and gzip encoding.
//!
//! The encoder tokenizes the input block by block with the LZSS
//! matcher, then frames each block as stored, fixed-Huffman or
//! dynamic-Huffman. Framing never affects correctness, only size, so
//! the strategy picks whichever the configuration prefers.

use alloc::vec::Vec;

use log::trace;

use crate::bitstream::BitStreamWriter;
use crate::constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC, DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_UNCOMPRESSED,
    DEFLATE_BLOCK_INPUT_MAX, DEFLATE_END_OF_BLOCK, DEFLATE_MAX_CODEWORD_LENGTH,
    DEFLATE_MAX_PRE_CODEWORD_LENGTH, DEFLATE_NUM_LITLEN_SYMS, DEFLATE_NUM_OFFSET_SYMS,
    DEFLATE_NUM_PRECODE_SYMS, DEFLATE_PRECODE_LENS_PERMUTATION, FIXED_LITLEN_LENGTHS,
    FIXED_OFFSET_LENGTHS
};
use crate::crc32::Crc32;
use crate::errors::DeflateEncodeErrors;
use crate::huffman::HuffmanEncoder;
use crate::lz77::{Lz77Encoder, Symbol};
use crate::options::{DeflateEncodeOptions, DeflateEncodingStrategy};

#[cfg(feature = "gzip")]
use crate::gzip;

/// A deflate/gzip encoder.
///
/// The encoder is initialized with the uncompressed input and either
/// of [`encode_deflate`] for a bare RFC 1951 stream or
/// [`encode_gzip`] for a single-member RFC 1952 file.
///
/// [`encode_deflate`]: DeflateEncoder::encode_deflate
/// [`encode_gzip`]: DeflateEncoder::encode_gzip
pub struct DeflateEncoder<'a> {
    data:     &'a [u8],
    options:  DeflateEncodeOptions,
    checksum: Crc32
}

impl<'a> DeflateEncoder<'a> {
    /// Create an encoder over `data` with the default options.
    pub fn new(data: &'a [u8]) -> DeflateEncoder<'a> {
        DeflateEncoder::new_with_options(data, DeflateEncodeOptions::default())
    }

    /// Create an encoder with explicit options.
    ///
    /// # Example
    /// ```
    /// use zune_deflate::{DeflateEncoder, DeflateEncodeOptions, DeflateEncodingStrategy};
    ///
    /// let options = DeflateEncodeOptions::default()
    ///     .set_strategy(DeflateEncodingStrategy::Fast);
    /// let mut encoder = DeflateEncoder::new_with_options(b"some bytes", options);
    /// let compressed = encoder.encode_deflate().unwrap();
    /// ```
    pub fn new_with_options(data: &'a [u8], options: DeflateEncodeOptions) -> DeflateEncoder<'a> {
        DeflateEncoder {
            data,
            options,
            checksum: Crc32::new()
        }
    }

    /// Compress to a bare deflate stream.
    pub fn encode_deflate(&mut self) -> Result<Vec<u8>, DeflateEncodeErrors> {
        let writer = BitStreamWriter::new(Vec::with_capacity(self.data.len() / 2 + 64));

        self.write_blocks(writer)
    }

    /// Compress to a gzip member, header and trailer included.
    ///
    /// The header carries whatever metadata the options hold; the
    /// trailer carries the CRC-32 accumulated while the blocks
    /// streamed through, and the input length modulo 2³².
    #[cfg(feature = "gzip")]
    pub fn encode_gzip(&mut self) -> Result<Vec<u8>, DeflateEncodeErrors> {
        let mut sink = Vec::with_capacity(self.data.len() / 2 + 128);

        gzip::write_header(&mut sink, &self.options)?;

        let mut out = self.write_blocks(BitStreamWriter::new(sink))?;

        gzip::write_trailer(&mut out, self.checksum.finish(), self.data.len());

        Ok(out)
    }

    fn write_blocks(
        &mut self, mut writer: BitStreamWriter
    ) -> Result<Vec<u8>, DeflateEncodeErrors> {
        self.checksum = Crc32::new();

        match self.options.strategy() {
            DeflateEncodingStrategy::NoCompression => self.write_stored_stream(&mut writer)?,
            strategy => self.write_compressed_stream(&mut writer, strategy)?
        }
        Ok(writer.finish())
    }

    /// Frame the input as stored blocks only.
    fn write_stored_stream(
        &mut self, writer: &mut BitStreamWriter
    ) -> Result<(), DeflateEncodeErrors> {
        let data = self.data;

        /*
         * A zero-length input still must output one block in order
         * for the output to be a valid DEFLATE stream.
         */
        if data.is_empty() {
            write_stored_block(writer, &[], true)?;
            return Ok(());
        }

        let mut chunks = data.chunks(DEFLATE_BLOCK_INPUT_MAX).peekable();

        while let Some(chunk) = chunks.next() {
            let is_final = chunks.peek().is_none();

            self.checksum.update(chunk);
            write_stored_block(writer, chunk, is_final)?;
        }
        Ok(())
    }

    /// Tokenize and frame the input block by block.
    fn write_compressed_stream(
        &mut self, writer: &mut BitStreamWriter, strategy: DeflateEncodingStrategy
    ) -> Result<(), DeflateEncodeErrors> {
        let data = self.data;

        if data.is_empty() {
            // a final fixed block holding only end-of-block
            let litlen = HuffmanEncoder::from_lengths(&FIXED_LITLEN_LENGTHS);
            let offset = HuffmanEncoder::from_lengths(&FIXED_OFFSET_LENGTHS);

            writer.write_bits(1, 1);
            writer.write_bits(2, u64::from(DEFLATE_BLOCKTYPE_STATIC));
            emit_symbols(writer, &[], &litlen, &offset)?;

            return Ok(());
        }

        let mut lz = Lz77Encoder::new(data);
        let mut symbols: Vec<Symbol> = Vec::with_capacity(4096);

        while !lz.is_done() {
            symbols.clear();

            let (start, end) = lz.next_block(DEFLATE_BLOCK_INPUT_MAX, &mut symbols);
            let block = &data[start..end];
            let is_final = lz.is_done();

            if symbols.len() > DEFLATE_BLOCK_INPUT_MAX + 1 {
                return Err(DeflateEncodeErrors::OutOfQueueSpace(symbols.len()));
            }

            self.checksum.update(block);
            write_block(writer, &symbols, block, strategy, is_final)?;
        }
        Ok(())
    }
}

/// Choose a framing for one block and emit it.
fn write_block(
    writer: &mut BitStreamWriter, symbols: &[Symbol], block: &[u8],
    strategy: DeflateEncodingStrategy, is_final: bool
) -> Result<(), DeflateEncodeErrors> {
    let mut litlen_freqs = [0_u32; DEFLATE_NUM_LITLEN_SYMS];
    let mut offset_freqs = [0_u32; DEFLATE_NUM_OFFSET_SYMS];

    for symbol in symbols {
        litlen_freqs[usize::from(symbol.litlen_code())] += 1;

        if let Some((code, _, _)) = symbol.distance_parts() {
            offset_freqs[usize::from(code)] += 1;
        }
    }
    // end-of-block is emitted exactly once per block
    litlen_freqs[usize::from(DEFLATE_END_OF_BLOCK)] += 1;

    let fixed_litlen = HuffmanEncoder::from_lengths(&FIXED_LITLEN_LENGTHS);
    let fixed_offset = HuffmanEncoder::from_lengths(&FIXED_OFFSET_LENGTHS);

    // worst case, the header bits and up to seven padding bits
    let stored_cost = 3 + 7 + 32 + 8 * block.len() as u64;
    let fixed_cost = 3 + body_cost(symbols, &fixed_litlen, &fixed_offset);

    let dynamic = match strategy {
        DeflateEncodingStrategy::Best => Some(DynamicBlock::build(&litlen_freqs, &offset_freqs)),
        _ => None
    };
    let dynamic_cost =
        dynamic.as_ref().map_or(u64::MAX, |d| 3 + d.header_cost() + body_cost(symbols, &d.litlen, &d.offset));

    trace!(
        "block of {} bytes, {} symbols: stored {stored_cost} fixed {fixed_cost} dynamic {dynamic_cost} bits",
        block.len(),
        symbols.len()
    );

    if let Some(dynamic) = &dynamic {
        if dynamic_cost <= fixed_cost && dynamic_cost < stored_cost {
            writer.write_bits(1, u64::from(is_final));
            writer.write_bits(2, u64::from(DEFLATE_BLOCKTYPE_DYNAMIC));
            dynamic.write_header(writer);

            return emit_symbols(writer, symbols, &dynamic.litlen, &dynamic.offset);
        }
    }

    if stored_cost < fixed_cost {
        return write_stored_block(writer, block, is_final);
    }

    writer.write_bits(1, u64::from(is_final));
    writer.write_bits(2, u64::from(DEFLATE_BLOCKTYPE_STATIC));
    emit_symbols(writer, symbols, &fixed_litlen, &fixed_offset)
}

/// Emit one stored block with its LEN/NLEN framing.
fn write_stored_block(
    writer: &mut BitStreamWriter, block: &[u8], is_final: bool
) -> Result<(), DeflateEncodeErrors> {
    if block.len() > DEFLATE_BLOCK_INPUT_MAX {
        return Err(DeflateEncodeErrors::InvalidBlockLength(block.len()));
    }

    let len = block.len() as u16;

    writer.write_bits(1, u64::from(is_final));
    writer.write_bits(2, u64::from(DEFLATE_BLOCKTYPE_UNCOMPRESSED));
    writer.align_to_byte();
    writer.write_u16_le(len);
    writer.write_u16_le(!len);
    writer.write_bytes(block);

    Ok(())
}

/// Emit the queued symbols under the given codes, then end-of-block.
fn emit_symbols(
    writer: &mut BitStreamWriter, symbols: &[Symbol], litlen: &HuffmanEncoder,
    offset: &HuffmanEncoder
) -> Result<(), DeflateEncodeErrors> {
    for symbol in symbols {
        let code = symbol.litlen_code();

        if usize::from(code) >= DEFLATE_NUM_LITLEN_SYMS {
            return Err(DeflateEncodeErrors::InvalidSymbol(code));
        }

        let (length, codeword) = litlen.code(code);

        if length == 0 {
            return Err(DeflateEncodeErrors::InvalidSymbol(code));
        }
        writer.write_code(length, codeword);

        let (extra_bits, extra) = symbol.length_extra();

        if extra_bits > 0 {
            writer.write_bits(extra_bits, u64::from(extra));
        }

        if let Some((distance_code, distance_bits, distance_extra)) = symbol.distance_parts() {
            let (length, codeword) = offset.code(distance_code);

            if length == 0 {
                return Err(DeflateEncodeErrors::InvalidSymbol(distance_code));
            }
            writer.write_code(length, codeword);

            if distance_bits > 0 {
                writer.write_bits(distance_bits, u64::from(distance_extra));
            }
        }
    }

    let (length, codeword) = litlen.code(DEFLATE_END_OF_BLOCK);

    writer.write_code(length, codeword);

    Ok(())
}

/// Bits the symbol queue occupies under the given codes, end-of-block
/// included.
fn body_cost(symbols: &[Symbol], litlen: &HuffmanEncoder, offset: &HuffmanEncoder) -> u64 {
    let mut bits = u64::from(litlen.code(DEFLATE_END_OF_BLOCK).0);

    for symbol in symbols {
        bits += u64::from(litlen.code(symbol.litlen_code()).0);
        bits += u64::from(symbol.length_extra().0);

        if let Some((code, extra_bits, _)) = symbol.distance_parts() {
            bits += u64::from(offset.code(code).0);
            bits += u64::from(extra_bits);
        }
    }
    bits
}

/// The codes and meta-header of one dynamic block.
struct DynamicBlock {
    litlen:      HuffmanEncoder,
    offset:      HuffmanEncoder,
    num_litlen:  usize,
    num_offset:  usize,
    precode:     HuffmanEncoder,
    num_precode: usize,
    /// Code-length tokens as `(symbol, extra_bit_count, extra_value)`.
    tokens:      Vec<(u8, u8, u8)>
}

impl DynamicBlock {
    fn build(
        litlen_freqs: &[u32; DEFLATE_NUM_LITLEN_SYMS],
        offset_freqs: &[u32; DEFLATE_NUM_OFFSET_SYMS]
    ) -> DynamicBlock {
        let mut offset_freqs = *offset_freqs;

        if offset_freqs.iter().all(|freq| *freq == 0) {
            // an empty distance code trips up some decoders, spend
            // one dummy entry on keeping it populated
            offset_freqs[0] = 1;
        }

        let litlen =
            HuffmanEncoder::from_frequencies(litlen_freqs, DEFLATE_MAX_CODEWORD_LENGTH);
        let offset =
            HuffmanEncoder::from_frequencies(&offset_freqs, DEFLATE_MAX_CODEWORD_LENGTH);

        // end-of-block is always used, so the litlen floor of 257
        // holds by construction
        let num_litlen = litlen.lengths.iter().rposition(|len| *len > 0).unwrap() + 1;
        let num_offset = offset.lengths.iter().rposition(|len| *len > 0).unwrap() + 1;

        let mut transmitted = Vec::with_capacity(num_litlen + num_offset);

        transmitted.extend_from_slice(&litlen.lengths[..num_litlen]);
        transmitted.extend_from_slice(&offset.lengths[..num_offset]);

        let tokens = run_length_tokens(&transmitted);

        let mut precode_freqs = [0_u32; DEFLATE_NUM_PRECODE_SYMS];

        for (symbol, _, _) in &tokens {
            precode_freqs[usize::from(*symbol)] += 1;
        }

        let precode =
            HuffmanEncoder::from_frequencies(&precode_freqs, DEFLATE_MAX_PRE_CODEWORD_LENGTH);

        let num_precode = DEFLATE_PRECODE_LENS_PERMUTATION
            .iter()
            .rposition(|sym| precode.lengths[usize::from(*sym)] > 0)
            .map_or(0, |last| last + 1)
            .max(4);

        DynamicBlock {
            litlen,
            offset,
            num_litlen,
            num_offset,
            precode,
            num_precode,
            tokens
        }
    }

    /// Bits the HLIT/HDIST/HCLEN meta-header occupies.
    fn header_cost(&self) -> u64 {
        let mut bits = (5 + 5 + 4) + 3 * self.num_precode as u64;

        for (symbol, extra_bits, _) in &self.tokens {
            bits += u64::from(self.precode.code(u16::from(*symbol)).0);
            bits += u64::from(*extra_bits);
        }
        bits
    }

    fn write_header(&self, writer: &mut BitStreamWriter) {
        writer.write_bits(5, (self.num_litlen - 257) as u64);
        writer.write_bits(5, (self.num_offset - 1) as u64);
        writer.write_bits(4, (self.num_precode - 4) as u64);

        for sym in DEFLATE_PRECODE_LENS_PERMUTATION.iter().take(self.num_precode) {
            writer.write_bits(3, u64::from(self.precode.lengths[usize::from(*sym)]));
        }

        for (symbol, extra_bits, extra) in &self.tokens {
            let (length, codeword) = self.precode.code(u16::from(*symbol));

            writer.write_code(length, codeword);

            if *extra_bits > 0 {
                writer.write_bits(*extra_bits, u64::from(*extra));
            }
        }
    }
}

/// Compress a code-length sequence with the 16/17/18 repeat forms.
fn run_length_tokens(lengths: &[u8]) -> Vec<(u8, u8, u8)> {
    let mut tokens = Vec::with_capacity(lengths.len());
    let mut i = 0;

    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1;

        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }
        i += run;

        if value == 0 {
            while run >= 11 {
                let taken = run.min(138);

                tokens.push((18, 7, (taken - 11) as u8));
                run -= taken;
            }
            if run >= 3 {
                tokens.push((17, 3, (run - 3) as u8));
                run = 0;
            }
            for _ in 0..run {
                tokens.push((0, 0, 0));
            }
        } else {
            tokens.push((value, 0, 0));
            run -= 1;

            while run >= 3 {
                let taken = run.min(6);

                tokens.push((16, 2, (taken - 3) as u8));
                run -= taken;
            }
            for _ in 0..run {
                tokens.push((value, 0, 0));
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::run_length_tokens;
    use crate::{
        DeflateDecoder, DeflateEncodeOptions, DeflateEncoder, DeflateEncodingStrategy
    };

    fn roundtrip(data: &[u8], strategy: DeflateEncodingStrategy) -> Vec<u8> {
        let options = DeflateEncodeOptions::default().set_strategy(strategy);
        let mut encoder = DeflateEncoder::new_with_options(data, options);
        let compressed = encoder.encode_deflate().unwrap();

        let mut decoder = DeflateDecoder::new(&compressed);

        decoder.decode_deflate().unwrap()
    }

    #[test]
    fn empty_input_roundtrips_under_every_strategy() {
        for strategy in [
            DeflateEncodingStrategy::NoCompression,
            DeflateEncodingStrategy::Fast,
            DeflateEncodingStrategy::Best
        ] {
            assert_eq!(roundtrip(&[], strategy), &[]);
        }
    }

    #[test]
    fn small_text_roundtrips_under_every_strategy() {
        let data = b"Hello, World!\n";

        for strategy in [
            DeflateEncodingStrategy::NoCompression,
            DeflateEncodingStrategy::Fast,
            DeflateEncodingStrategy::Best
        ] {
            assert_eq!(roundtrip(data, strategy), data);
        }
    }

    #[test]
    fn run_input_compresses_far_below_input_size() {
        let data = [b'a'; 9001];
        let mut encoder = DeflateEncoder::new(&data);
        let compressed = encoder.encode_deflate().unwrap();

        assert!(compressed.len() < 100, "compressed to {}", compressed.len());
        assert_eq!(roundtrip(&data, DeflateEncodingStrategy::Best), data);
    }

    #[test]
    fn multi_block_input_roundtrips() {
        // three blocks worth of patterned input
        let data: Vec<u8> = (0_u32..180_000).map(|i| (i % 253) as u8).collect();

        for strategy in [
            DeflateEncodingStrategy::NoCompression,
            DeflateEncodingStrategy::Fast,
            DeflateEncodingStrategy::Best
        ] {
            assert_eq!(roundtrip(&data, strategy), data);
        }
    }

    #[test]
    fn repeat_tokens_reconstruct_their_input() {
        let lengths = [0, 0, 0, 0, 5, 5, 5, 5, 5, 5, 5, 5, 7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3];
        let tokens = run_length_tokens(&lengths);

        let mut rebuilt = Vec::new();

        for (symbol, _, extra) in tokens {
            match symbol {
                0..=15 => rebuilt.push(symbol),
                16 => {
                    let last = *rebuilt.last().unwrap();

                    for _ in 0..3 + extra {
                        rebuilt.push(last);
                    }
                }
                17 => rebuilt.extend(core::iter::repeat(0).take(3 + usize::from(extra))),
                18 => rebuilt.extend(core::iter::repeat(0).take(11 + usize::from(extra))),
                _ => unreachable!()
            }
        }
        assert_eq!(rebuilt, lengths);
    }
}
