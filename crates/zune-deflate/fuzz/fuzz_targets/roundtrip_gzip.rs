#![no_main]

// This target drives our encoder with the fuzzer's bytes and checks
// the reference implementation agrees with our own decoder on the
// result.

use std::io::Read;

use libfuzzer_sys::fuzz_target;
use zune_deflate::{DeflateEncodeOptions, DeflateEncodingStrategy};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let strategy = match data[0] % 3 {
        0 => DeflateEncodingStrategy::NoCompression,
        1 => DeflateEncodingStrategy::Fast,
        _ => DeflateEncodingStrategy::Best
    };
    let payload = &data[1..];

    let options = DeflateEncodeOptions::default().set_strategy(strategy);
    let compressed = zune_deflate::DeflateEncoder::new_with_options(payload, options)
        .encode_gzip()
        .expect("encoding cannot fail on in-memory data");

    let mut ours = zune_deflate::DeflateDecoder::new(&compressed);

    assert_eq!(
        ours.decode_gzip().expect("our own output must decode"),
        payload
    );

    let mut reference = flate2::read::GzDecoder::new(compressed.as_slice());
    let mut decoded = Vec::new();

    reference
        .read_to_end(&mut decoded)
        .expect("reference decoder must accept our output");
    assert_eq!(decoded, payload);
});
