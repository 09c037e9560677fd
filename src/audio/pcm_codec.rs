//! Linear PCM16 codec between native float samples and the wire format.
//!
//! - Encode: f32 [-1.0, 1.0] → packed little-endian i16 bytes
//! - Decode: packed little-endian i16 bytes → f32
//! - Envelope: base64 text + `audio/pcm;rate=N` MIME tag for transport

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

/// Errors for wire-format audio that fails to decode.
///
/// These are recovered locally by dropping the offending chunk; they are
/// never fatal to a session.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("PCM byte length {0} is not a multiple of 2")]
    OddByteLength(usize),

    #[error("Invalid base64 audio payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Missing or malformed rate tag in MIME type: {0}")]
    BadMimeTag(String),
}

// ======================== PCM encode / decode ========================

/// Encode native f32 samples to packed little-endian i16 bytes.
///
/// Each sample is clamped to [-1.0, 1.0] before scaling; NaN maps to 0.
/// Out-of-range input therefore saturates instead of wrapping or panicking.
pub fn encode_pcm(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
        let v = (s * 32767.0).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode packed little-endian i16 bytes to native f32 samples.
///
/// Byte length must be even; anything else is a malformed chunk.
pub fn decode_pcm(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % 2 != 0 {
        return Err(CodecError::OddByteLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect())
}

// ======================== Transport envelope ========================

/// One outbound wire chunk: base64 PCM bytes plus the rate-tagged MIME type.
#[derive(Debug, Clone)]
pub struct AudioEnvelope {
    pub data: String,
    pub mime: String,
}

/// One inbound chunk after envelope + PCM decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedChunk {
    /// Nominal playback duration of this chunk in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Build the MIME tag for raw PCM at the given sample rate.
pub fn pcm_mime(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}

/// Parse the sample rate out of an `audio/pcm;rate=N` MIME tag.
///
/// The receiver reads the rate from the tag instead of assuming one.
pub fn parse_rate_tag(mime: &str) -> Result<u32, CodecError> {
    if !mime.starts_with("audio/pcm") {
        return Err(CodecError::BadMimeTag(mime.to_string()));
    }
    mime.split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse::<u32>().ok())
        .ok_or_else(|| CodecError::BadMimeTag(mime.to_string()))
}

/// Wrap already-encoded wire bytes in the base64 transport envelope.
pub fn wrap_chunk(wire: &[u8], sample_rate: u32) -> AudioEnvelope {
    AudioEnvelope {
        data: BASE64.encode(wire),
        mime: pcm_mime(sample_rate),
    }
}

/// Unwrap an inbound envelope into native samples at the tagged rate.
pub fn unwrap_chunk(data: &str, mime: &str) -> Result<DecodedChunk, CodecError> {
    let sample_rate = parse_rate_tag(mime)?;
    let bytes = BASE64.decode(data)?;
    let samples = decode_pcm(&bytes)?;
    Ok(DecodedChunk {
        samples,
        sample_rate,
    })
}
