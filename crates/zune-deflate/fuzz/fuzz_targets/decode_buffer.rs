#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // arbitrary bytes must never panic the decoder, erroring is fine
    let mut decoder = zune_deflate::DeflateDecoder::new(data);
    let _ = decoder.decode_gzip();

    let mut decoder = zune_deflate::DeflateDecoder::new(data);
    let _ = decoder.decode_deflate();
});
