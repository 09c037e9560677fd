//! The main AudioSystem that manages recording and playback threads.
//!
//! Uses std::thread (NOT tokio tasks) for real-time audio I/O to avoid
//! contention with async network tasks. Both devices are opened on the
//! caller's thread so access failures surface synchronously at session
//! start, then the handles move into their dedicated threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use super::pcm_codec::DecodedChunk;
use super::{AudioError, alsa_device, play, record};

/// Audio system configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA capture device name (e.g. "default", "plughw:0,0")
    pub capture_device: String,
    /// ALSA playback device name
    pub playback_device: String,
    /// Capture sample rate for outbound audio (16 kHz)
    pub capture_sample_rate: u32,
    /// Playback sample rate for inbound audio (24 kHz)
    pub playback_sample_rate: u32,
    /// Native samples per outbound frame (e.g. 4096)
    pub frame_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_device: "default".to_string(),
            playback_device: "default".to_string(),
            capture_sample_rate: 16000,
            playback_sample_rate: 24000,
            frame_size: 4096,
        }
    }
}

/// The audio system manages recording and playback in dedicated OS threads.
///
/// - Recording thread: ALSA capture → meter → PCM16 encode → `frame_tx`
/// - Playback thread: `chunk_rx` → playback scheduling → ALSA playback
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    record_handle: Option<JoinHandle<()>>,
    play_handle: Option<JoinHandle<()>>,
}

impl AudioSystem {
    /// Open both devices and start the audio threads.
    ///
    /// * `config`   - Audio configuration
    /// * `frame_tx` - Sender for encoded outbound wire frames
    /// * `meter_tx` - Best-effort sender for per-frame volume levels
    /// * `chunk_rx` - Receiver for decoded inbound chunks to play
    pub fn start(
        config: AudioConfig,
        frame_tx: mpsc::Sender<Vec<u8>>,
        meter_tx: mpsc::Sender<f32>,
        chunk_rx: mpsc::Receiver<DecodedChunk>,
    ) -> Result<Self, AudioError> {
        let running = Arc::new(AtomicBool::new(true));

        log::info!(
            "AudioSystem starting — capture: \"{}\" @ {}Hz, playback: \"{}\" @ {}Hz, frame: {}",
            config.capture_device,
            config.capture_sample_rate,
            config.playback_device,
            config.playback_sample_rate,
            config.frame_size,
        );

        // Capture open failure distinguishes denied access (the microphone
        // permission case) from other device faults.
        let (capture_pcm, capture_params) =
            alsa_device::open_capture(&config.capture_device, config.capture_sample_rate).map_err(
                |e| {
                    if alsa_device::is_access_denied(&e) {
                        AudioError::PermissionDenied(e)
                    } else {
                        AudioError::DeviceOpen(e)
                    }
                },
            )?;

        let (playback_pcm, playback_params) =
            alsa_device::open_playback(&config.playback_device, config.playback_sample_rate)
                .map_err(AudioError::DeviceOpen)?;

        let record_handle = {
            let running = running.clone();
            let frame_size = config.frame_size;
            thread::Builder::new()
                .name("audio-record".into())
                .spawn(move || {
                    if let Err(e) =
                        record::record_thread(capture_pcm, capture_params, frame_size, frame_tx, meter_tx, &running)
                    {
                        log::error!("Recording thread error: {}", e);
                    }
                })?
        };

        let play_handle = {
            let running = running.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    if let Err(e) = play::play_thread(playback_pcm, playback_params, chunk_rx, &running) {
                        log::error!("Playback thread error: {}", e);
                    }
                })?
        };

        Ok(Self {
            running,
            record_handle: Some(record_handle),
            play_handle: Some(play_handle),
        })
    }

    /// Signal threads to stop and wait for the recorder to finish.
    ///
    /// The playback thread exits when the chunk sender is dropped; pending
    /// scheduled audio dies with its device context. We detach it here to
    /// avoid blocking on a chunk still being written.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.record_handle.take() {
            let _ = h.join();
        }
        self.play_handle.take();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
