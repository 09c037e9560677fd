use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use anyhow::Result;
use alsa::pcm::PCM;

use super::alsa_device::AlsaParams;
use super::pcm_codec::DecodedChunk;
use super::scheduler::{OutputClock, PlaybackScheduler};

/// Playback loop: receive decoded chunks in arrival order, assign each a
/// start position on the device timeline, and write it to ALSA.
///
/// The scheduler cursor mirrors the device timeline: while chunks arrive
/// faster than real time the blocking interleaved writes queue them in the
/// ring buffer back-to-back, which realizes exactly the computed start
/// positions; after an idle gap the buffer has drained and the write begins
/// at the clamped start. Chunks are never reordered.
pub fn play_thread(
    pcm: PCM,
    params: AlsaParams,
    mut chunk_rx: mpsc::Receiver<DecodedChunk>,
    running: &AtomicBool,
) -> Result<()> {
    let io = pcm.io_f32()?;

    let clock = OutputClock::start();
    let mut scheduler = PlaybackScheduler::new();
    let mut chunk_index: u64 = 0;

    log::info!(
        "Playback started: rate={}, period={}",
        params.sample_rate,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        // Block until we receive a decoded chunk (or the channel closes)
        match chunk_rx.blocking_recv() {
            Some(chunk) => {
                if chunk.sample_rate != params.sample_rate {
                    log::warn!(
                        "Chunk tagged {} Hz but playback device runs {} Hz",
                        chunk.sample_rate,
                        params.sample_rate,
                    );
                }

                let duration = chunk.duration_secs();
                let start = scheduler.schedule(clock.now(), duration);
                log::debug!(
                    "Chunk {} scheduled at {:.3}s (duration {:.3}s, cursor {:.3}s)",
                    chunk_index,
                    start,
                    duration,
                    scheduler.next_start(),
                );
                chunk_index += 1;

                // Write to ALSA with retry loop to handle short writes and
                // XRUN recovery without losing frames.
                let total_frames = chunk.samples.len();
                let mut frames_written = 0;
                let mut retry_count = 0u32;

                while frames_written < total_frames {
                    match io.writei(&chunk.samples[frames_written..]) {
                        Ok(n) => {
                            frames_written += n;
                            retry_count = 0;
                        }
                        Err(e) => {
                            log::warn!("ALSA XRUN or error: {}, recovering...", e);
                            retry_count += 1;

                            if let Err(e2) = pcm.prepare() {
                                log::error!("Failed to recover PCM playback: {}", e2);
                                return Ok(());
                            }

                            // 熔断器：底层持续跟不上写入速度时，丢弃剩余帧防止死循环
                            if retry_count >= 3 {
                                log::error!(
                                    "Max recovery retries ({}) reached. Dropping {} unwritten frames to break dead-loop.",
                                    retry_count,
                                    total_frames - frames_written
                                );
                                break;
                            }
                        }
                    }
                }
            }
            None => {
                // Channel closed, exit playback
                log::info!("Playback channel closed");
                break;
            }
        }
    }

    log::info!("Playback stopped");
    Ok(())
}
