use zune_deflate::{
    DeflateDecoder, DeflateEncodeOptions, DeflateEncoder, DeflateEncodingStrategy, DeflateOptions
};

fn gzip_with(data: &[u8], strategy: DeflateEncodingStrategy) -> Vec<u8> {
    let options = DeflateEncodeOptions::default().set_strategy(strategy);

    DeflateEncoder::new_with_options(data, options)
        .encode_gzip()
        .unwrap()
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    DeflateDecoder::new(data).decode_gzip().unwrap()
}

/// A deterministic xorshift stream, the tests must not depend on an
/// RNG crate or on run-to-run variation.
fn pseudo_random(len: usize, mut state: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);

    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        out.push(state as u8);
    }
    out
}

/// Roughly 40 KiB of repetitive English-like prose.
fn forty_kib_text() -> Vec<u8> {
    let mut text = Vec::new();
    let mut paragraph = 0;

    while text.len() < 40 * 1024 {
        paragraph += 1;
        text.extend_from_slice(
            format!(
                "Paragraph {paragraph}. A block of compressed data consists of a header \
                 describing the representation, followed by literals and pointers to \
                 earlier occurrences of the same data, followed by a marker.\n"
            )
            .as_bytes()
        );
    }
    text
}

#[test]
fn empty_input_roundtrips_with_zeroed_trailer() {
    let compressed = gzip_with(&[], DeflateEncodingStrategy::Best);

    assert_eq!(gunzip(&compressed), b"");

    // trailer: CRC-32 over zero bytes is 0, ISIZE is 0
    let trailer = &compressed[compressed.len() - 8..];

    assert_eq!(trailer, [0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn hello_world_roundtrips() {
    let data = b"Hello, World!\n";

    for strategy in [
        DeflateEncodingStrategy::NoCompression,
        DeflateEncodingStrategy::Fast,
        DeflateEncodingStrategy::Best
    ] {
        assert_eq!(gunzip(&gzip_with(data, strategy)), data);
    }
}

#[test]
fn nine_thousand_a_bytes_compress_tightly() {
    let data = vec![b'a'; 9001];
    let compressed = gzip_with(&data, DeflateEncodingStrategy::Best);

    assert!(
        compressed.len() < 100,
        "9001 bytes of 'a' took {} compressed bytes",
        compressed.len()
    );
    assert_eq!(gunzip(&compressed), data);
}

#[test]
fn text_roundtrips_under_every_block_mode() {
    let data = forty_kib_text();

    let stored = gzip_with(&data, DeflateEncodingStrategy::NoCompression);
    let fixed = gzip_with(&data, DeflateEncodingStrategy::Fast);
    let dynamic = gzip_with(&data, DeflateEncodingStrategy::Best);

    assert_eq!(gunzip(&stored), data);
    assert_eq!(gunzip(&fixed), data);
    assert_eq!(gunzip(&dynamic), data);

    assert!(
        dynamic.len() < fixed.len(),
        "dynamic {} vs fixed {}",
        dynamic.len(),
        fixed.len()
    );
    assert!(
        fixed.len() < stored.len(),
        "fixed {} vs stored {}",
        fixed.len(),
        stored.len()
    );
}

#[test]
fn random_bytes_survive_even_when_incompressible() {
    let data = pseudo_random(128, 0xBADC_0FFE);
    let compressed = gzip_with(&data, DeflateEncodingStrategy::Best);

    // growth is allowed, corruption is not
    assert_eq!(gunzip(&compressed), data);
}

#[test]
fn larger_pseudo_random_buffers_roundtrip() {
    for (len, seed) in [(1000, 1_u32), (65_535, 2), (200_000, 3)] {
        let data = pseudo_random(len, seed);

        for strategy in [
            DeflateEncodingStrategy::NoCompression,
            DeflateEncodingStrategy::Fast,
            DeflateEncodingStrategy::Best
        ] {
            assert_eq!(gunzip(&gzip_with(&data, strategy)), data, "len {len}");
        }
    }
}

#[test]
fn bare_deflate_streams_roundtrip() {
    let data = forty_kib_text();

    for strategy in [
        DeflateEncodingStrategy::NoCompression,
        DeflateEncodingStrategy::Fast,
        DeflateEncodingStrategy::Best
    ] {
        let options = DeflateEncodeOptions::default().set_strategy(strategy);
        let compressed = DeflateEncoder::new_with_options(&data, options)
            .encode_deflate()
            .unwrap();

        let decoded = DeflateDecoder::new(&compressed).decode_deflate().unwrap();

        assert_eq!(decoded, data);
    }
}

#[test]
fn trailer_carries_crc_and_length_of_the_input() {
    let data = forty_kib_text();
    let compressed = gzip_with(&data, DeflateEncodingStrategy::Best);

    let trailer = &compressed[compressed.len() - 8..];
    let crc = u32::from_le_bytes(trailer[..4].try_into().unwrap());
    let isize = u32::from_le_bytes(trailer[4..].try_into().unwrap());

    assert_eq!(crc, zune_deflate::crc32::crc32(&data));
    assert_eq!(isize, data.len() as u32);
}

#[test]
fn concatenated_members_decode_to_concatenated_output() {
    let mut joined = gzip_with(b"first half,", DeflateEncodingStrategy::Best);

    joined.extend_from_slice(&gzip_with(b" second half", DeflateEncodingStrategy::Fast));

    assert_eq!(gunzip(&joined), b"first half, second half");
}

#[test]
fn output_limit_is_honored() {
    let data = vec![b'x'; 100_000];
    let compressed = gzip_with(&data, DeflateEncodingStrategy::Best);

    let options = DeflateOptions::default().set_limit(1024);
    let error = DeflateDecoder::new_with_options(&compressed, options)
        .decode_gzip()
        .unwrap_err();

    assert!(matches!(
        error.error,
        zune_deflate::errors::DecodeErrorStatus::OutputLimitExceeded(1024, _)
    ));
}
