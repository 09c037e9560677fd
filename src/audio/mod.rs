//! audio - Audio capture, gapless playback scheduling, and PCM codec library
//!
//! Uses ALSA for audio I/O and linear PCM16 as the only wire codec. Capture
//! runs at 16 kHz mono, playback at 24 kHz mono; the two directions never
//! share a device context.

mod alsa_device;
mod audio_system;
mod play;
mod record;

pub mod meter;
pub mod pcm_codec;
pub mod scheduler;

pub use audio_system::{AudioConfig, AudioSystem};

/// Audio device error type
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Capture device access denied: {0}")]
    PermissionDenied(alsa::Error),

    #[error("Failed to open audio device: {0}")]
    DeviceOpen(alsa::Error),

    #[error("Failed to spawn audio thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
