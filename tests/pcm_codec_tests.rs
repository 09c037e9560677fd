// Unit tests for the linear PCM16 codec and its transport envelope.
//
// Everything here is pure: no device, no socket.

use cohost_linux_rs::audio::pcm_codec::{
    CodecError, decode_pcm, encode_pcm, parse_rate_tag, pcm_mime, unwrap_chunk, wrap_chunk,
};

const LSB: f32 = 1.0 / 32768.0;

fn as_i16_values(wire: &[u8]) -> Vec<i16> {
    wire.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

#[test]
fn test_encode_known_samples() {
    let wire = encode_pcm(&[0.5, -0.5, 0.0]);
    assert_eq!(as_i16_values(&wire), vec![16384, -16384, 0]);
}

#[test]
fn test_round_trip_within_one_lsb() {
    let frame = [
        -1.0,
        -0.9999,
        -0.5,
        -1.0 / 3.0,
        -0.001,
        0.0,
        0.001,
        0.25,
        1.0 / 3.0,
        0.7071,
        0.9999,
        1.0,
    ];
    let decoded = decode_pcm(&encode_pcm(&frame)).unwrap();
    assert_eq!(decoded.len(), frame.len());
    for (orig, back) in frame.iter().zip(decoded.iter()) {
        assert!(
            (orig - back).abs() <= LSB,
            "sample {} decoded as {} (error > 1 LSB)",
            orig,
            back
        );
    }
}

#[test]
fn test_encode_clamps_out_of_range_and_nan() {
    let wire = encode_pcm(&[2.0, -2.0, f32::NAN, 1.0, -1.0]);
    assert_eq!(as_i16_values(&wire), vec![32767, -32767, 0, 32767, -32767]);
}

#[test]
fn test_decode_rejects_odd_byte_length() {
    match decode_pcm(&[0x00, 0x40, 0x7f]) {
        Err(CodecError::OddByteLength(3)) => {}
        other => panic!("expected OddByteLength(3), got {:?}", other),
    }
}

#[test]
fn test_decode_empty_is_empty_frame() {
    assert_eq!(decode_pcm(&[]).unwrap(), Vec::<f32>::new());
}

#[test]
fn test_rate_tag_parsing() {
    assert_eq!(parse_rate_tag("audio/pcm;rate=24000").unwrap(), 24000);
    assert_eq!(parse_rate_tag("audio/pcm; rate=16000").unwrap(), 16000);
    assert!(parse_rate_tag("audio/pcm").is_err());
    assert!(parse_rate_tag("audio/pcm;rate=abc").is_err());
    assert!(parse_rate_tag("text/plain;rate=16000").is_err());
}

#[test]
fn test_pcm_mime_formatting() {
    assert_eq!(pcm_mime(16000), "audio/pcm;rate=16000");
}

#[test]
fn test_envelope_round_trip_reads_rate_from_tag() {
    let frame = [0.5, -0.5, 0.0, 0.25];
    let envelope = wrap_chunk(&encode_pcm(&frame), 16000);
    assert_eq!(envelope.mime, "audio/pcm;rate=16000");

    let chunk = unwrap_chunk(&envelope.data, &envelope.mime).unwrap();
    assert_eq!(chunk.sample_rate, 16000);
    assert_eq!(chunk.samples.len(), frame.len());
    for (orig, back) in frame.iter().zip(chunk.samples.iter()) {
        assert!((orig - back).abs() <= LSB);
    }
}

#[test]
fn test_unwrap_rejects_invalid_base64() {
    match unwrap_chunk("not!!base64??", "audio/pcm;rate=24000") {
        Err(CodecError::InvalidBase64(_)) => {}
        other => panic!("expected InvalidBase64, got {:?}", other),
    }
}

#[test]
fn test_unwrap_rejects_odd_payload() {
    // Three raw bytes survive base64 but are not whole i16 samples.
    let envelope = wrap_chunk(&[0x00, 0x40, 0x00], 24000);
    match unwrap_chunk(&envelope.data, &envelope.mime) {
        Err(CodecError::OddByteLength(3)) => {}
        other => panic!("expected OddByteLength(3), got {:?}", other),
    }
}

#[test]
fn test_chunk_duration_follows_tagged_rate() {
    let samples = vec![0.0f32; 24000];
    let envelope = wrap_chunk(&encode_pcm(&samples), 24000);
    let chunk = unwrap_chunk(&envelope.data, &envelope.mime).unwrap();
    assert!((chunk.duration_secs() - 1.0).abs() < 1e-9);

    let envelope = wrap_chunk(&encode_pcm(&samples), 12000);
    let chunk = unwrap_chunk(&envelope.data, &envelope.mime).unwrap();
    assert!((chunk.duration_secs() - 2.0).abs() < 1e-9);
}
