use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use anyhow::Result;
use alsa::pcm::PCM;

use super::alsa_device::AlsaParams;
use super::meter;
use super::pcm_codec;

/// Capture loop: pull periods from ALSA, accumulate fixed-size native frames,
/// meter then encode each frame, and dispatch the wire chunk downstream.
///
/// Both sends are non-blocking: the capture loop must never stall on a slow
/// consumer. A full frame channel drops the frame; a full meter channel drops
/// the reading. When this function returns, the dropped `frame_tx` closes the
/// channel and signals the session that capture has ended.
pub fn record_thread(
    pcm: PCM,
    params: AlsaParams,
    frame_size: usize,
    frame_tx: mpsc::Sender<Vec<u8>>,
    meter_tx: mpsc::Sender<f32>,
    running: &AtomicBool,
) -> Result<()> {
    let period_size = params.period_size;

    // Accumulation buffer for native samples
    let mut accum_buf: Vec<f32> = Vec::with_capacity(frame_size * 2);

    // ALSA read buffer (mono f32, one period)
    let mut read_buf = vec![0f32; period_size];

    let io = pcm.io_f32()?;

    log::info!(
        "Recording started: rate={}, period={}, frame_size={}",
        params.sample_rate,
        period_size,
        frame_size,
    );

    while running.load(Ordering::Relaxed) {
        // Read one period from ALSA
        match io.readi(&mut read_buf) {
            Ok(frames) => {
                // Mono capture: one ALSA frame is one sample
                accum_buf.extend_from_slice(&read_buf[..frames]);

                // Emit complete fixed-size frames
                while accum_buf.len() >= frame_size {
                    let frame = &accum_buf[..frame_size];

                    // Meter from the native frame, before encoding
                    let _ = meter_tx.try_send(meter::level(frame));

                    let wire = pcm_codec::encode_pcm(frame);
                    match frame_tx.try_send(wire) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            log::warn!("Outbound frame channel full, dropping frame");
                        }
                        Err(TrySendError::Closed(_)) => {
                            log::info!("Frame receiver dropped, stopping capture");
                            return Ok(());
                        }
                    }

                    // Remove the consumed frame from the accumulation buffer
                    accum_buf.drain(..frame_size);
                }
            }
            Err(e) => {
                log::warn!("ALSA capture error: {}, recovering...", e);
                if let Err(e2) = pcm.prepare() {
                    log::error!("Failed to recover PCM capture: {}", e2);
                    break;
                }
            }
        }
    }

    log::info!("Recording stopped");
    Ok(())
}
