use zune_deflate::errors::DecodeErrorStatus;
use zune_deflate::{
    DeflateDecoder, DeflateEncodeOptions, DeflateEncoder, DeflateEncodingStrategy, DeflateOptions
};

fn decode_error(data: &[u8]) -> DecodeErrorStatus {
    DeflateDecoder::new(data).decode_gzip().unwrap_err().error
}

#[test]
fn header_metadata_roundtrips_through_a_full_member() {
    let options = DeflateEncodeOptions::default()
        .set_filename("notes.txt".to_string())
        .set_comment("a test member".to_string())
        .set_mtime(1_600_000_000)
        .set_header_crc(true);

    let compressed = DeflateEncoder::new_with_options(b"payload bytes", options)
        .encode_gzip()
        .unwrap();

    let mut decoder = DeflateDecoder::new(&compressed);

    assert_eq!(decoder.decode_gzip().unwrap(), b"payload bytes");

    let header = decoder.gzip_header().unwrap();

    assert_eq!(header.filename.as_deref(), Some("notes.txt"));
    assert_eq!(header.comment.as_deref(), Some("a test member"));
    assert_eq!(header.mtime, 1_600_000_000);
}

#[test]
fn fextra_roundtrips() {
    let options = DeflateEncodeOptions::default().set_extra(b"ap\x04\x00data".to_vec());

    let compressed = DeflateEncoder::new_with_options(b"x", options)
        .encode_gzip()
        .unwrap();

    let mut decoder = DeflateDecoder::new(&compressed);

    decoder.decode_gzip().unwrap();

    assert_eq!(
        decoder.gzip_header().unwrap().extra.as_deref(),
        Some(&b"ap\x04\x00data"[..])
    );
}

#[test]
fn truncated_fname_is_reported() {
    // FLG has FNAME set but the name never terminates
    let mut raw = vec![0x1F, 0x8B, 8, 0x08, 0, 0, 0, 0, 0, 255];

    raw.extend_from_slice(b"name-with-no-nul");

    assert!(matches!(
        decode_error(&raw),
        DecodeErrorStatus::TruncatedHeaderFname
    ));
}

#[test]
fn truncated_fcomment_is_reported() {
    let mut raw = vec![0x1F, 0x8B, 8, 0x10, 0, 0, 0, 0, 0, 255];

    raw.extend_from_slice(b"dangling comment");

    assert!(matches!(
        decode_error(&raw),
        DecodeErrorStatus::TruncatedHeaderComment
    ));
}

#[test]
fn header_crc_mismatch_is_reported() {
    let options = DeflateEncodeOptions::default().set_header_crc(true);
    let mut compressed = DeflateEncoder::new_with_options(b"abc", options)
        .encode_gzip()
        .unwrap();

    // the FHCRC field sits in bytes 10..12 when no other optional
    // field is present
    compressed[10] ^= 0xFF;

    assert!(matches!(
        decode_error(&compressed),
        DecodeErrorStatus::MismatchedCRC(_, _)
    ));
}

#[test]
fn oversized_extra_field_is_reported() {
    // XLEN promises 200 bytes, only 3 follow
    let mut raw = vec![0x1F, 0x8B, 8, 0x04, 0, 0, 0, 0, 0, 255];

    raw.extend_from_slice(&200_u16.to_le_bytes());
    raw.extend_from_slice(b"abc");

    assert!(matches!(
        decode_error(&raw),
        DecodeErrorStatus::InvalidExtraField
    ));
}

#[test]
fn reserved_flag_bits_are_reported() {
    let raw = [0x1F, 0x8B, 8, 0x80, 0, 0, 0, 0, 0, 255];

    assert!(matches!(
        decode_error(&raw),
        DecodeErrorStatus::InvalidHeader(_)
    ));
}

#[test]
fn wrong_magic_is_reported() {
    let raw = [0x1F, 0x8C, 8, 0, 0, 0, 0, 0, 0, 255];

    assert!(matches!(
        decode_error(&raw),
        DecodeErrorStatus::InvalidHeader(_)
    ));
}

#[test]
fn stored_block_nlen_mismatch_is_reported() {
    let options =
        DeflateEncodeOptions::default().set_strategy(DeflateEncodingStrategy::NoCompression);
    let mut compressed = DeflateEncoder::new_with_options(b"abc", options)
        .encode_deflate()
        .unwrap();

    // layout: block header byte, LEN, NLEN, data
    compressed[3] ^= 0x55;

    let error = DeflateDecoder::new(&compressed)
        .decode_deflate()
        .unwrap_err();

    assert!(matches!(
        error.error,
        DecodeErrorStatus::UnexpectedNLenBytes(_, _)
    ));
}

#[test]
fn reserved_block_type_is_reported() {
    // BFINAL = 1, BTYPE = 3
    let raw = [0b0000_0111, 0, 0];
    let error = DeflateDecoder::new(&raw).decode_deflate().unwrap_err();

    assert!(matches!(
        error.error,
        DecodeErrorStatus::UnexpectedBlockType(3)
    ));
}

#[test]
fn trailer_crc_corruption_is_reported() {
    let mut compressed = DeflateEncoder::new(b"some payload").encode_gzip().unwrap();
    let crc_at = compressed.len() - 8;

    compressed[crc_at] ^= 0xFF;

    assert!(matches!(
        decode_error(&compressed),
        DecodeErrorStatus::MismatchedCRC(_, _)
    ));
}

#[test]
fn trailer_isize_corruption_is_reported() {
    let mut compressed = DeflateEncoder::new(b"some payload").encode_gzip().unwrap();
    let isize_at = compressed.len() - 4;

    compressed[isize_at] ^= 0xFF;

    assert!(matches!(
        decode_error(&compressed),
        DecodeErrorStatus::MismatchedISize(_, _)
    ));
}

#[test]
fn earlier_members_survive_a_corrupt_trailer() {
    let mut joined = DeflateEncoder::new(b"first member").encode_gzip().unwrap();
    let second = DeflateEncoder::new(b", second member").encode_gzip().unwrap();

    joined.extend_from_slice(&second);

    let crc_at = joined.len() - 8;

    joined[crc_at] ^= 0xFF;

    let error = DeflateDecoder::new(&joined).decode_gzip().unwrap_err();

    assert!(matches!(error.error, DecodeErrorStatus::MismatchedCRC(_, _)));
    // the members decoded ahead of the bad trailer come back with
    // the error
    assert!(error.data.starts_with(b"first member"));
}

#[test]
fn trailer_verification_can_be_disabled() {
    let mut compressed = DeflateEncoder::new(b"some payload").encode_gzip().unwrap();
    let crc_at = compressed.len() - 8;

    compressed[crc_at] ^= 0xFF;

    let options = DeflateOptions::default().set_confirm_checksum(false);
    let decoded = DeflateDecoder::new_with_options(&compressed, options)
        .decode_gzip()
        .unwrap();

    assert_eq!(decoded, b"some payload");
}

#[test]
fn truncated_stream_is_insufficient_data() {
    let compressed = DeflateEncoder::new(b"a longer payload for truncation").encode_gzip().unwrap();

    let error = decode_error(&compressed[..compressed.len() / 2]);

    assert!(matches!(error, DecodeErrorStatus::InsufficientData));
}
