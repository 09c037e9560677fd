//! ALSA PCM device wrappers for audio capture and playback.
//!
//! Both directions run float-native (`FloatLE`), mono, at fixed per-direction
//! sample rates; capture and playback never share a device handle.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};

const EPERM: i32 = 1;
const EACCES: i32 = 13;
const EBUSY: i32 = 16;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Period size in frames (mono float, so one frame = one sample)
    pub period_size: usize,
}

/// Whether an ALSA open failure looks like denied access to the device
/// rather than a hardware or configuration fault.
pub fn is_access_denied(err: &alsa::Error) -> bool {
    matches!(err.errno(), EPERM | EACCES | EBUSY)
}

/// Open a PCM device for capture (recording).
pub fn open_capture(device: &str, sample_rate: u32) -> Result<(PCM, AlsaParams), alsa::Error> {
    open_pcm(device, Direction::Capture, sample_rate, "Capture")
}

/// Open a PCM device for playback.
pub fn open_playback(device: &str, sample_rate: u32) -> Result<(PCM, AlsaParams), alsa::Error> {
    open_pcm(device, Direction::Playback, sample_rate, "Playback")
}

fn open_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    dir_name: &str,
) -> Result<(PCM, AlsaParams), alsa::Error> {
    let pcm = PCM::new(device, direction, false)?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm)?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::FloatLE)?;
        hwp.set_channels(1)?;
        hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let (actual_rate, period_size) = {
        let hwp = pcm.hw_params_current()?;
        let rate = hwp.get_rate()?;
        let ps = hwp.get_period_size()? as usize;
        (rate, ps)
    };

    let params = AlsaParams {
        sample_rate: actual_rate,
        period_size,
    };

    log::info!(
        "ALSA {}: device={}, rate={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        period_size,
    );

    Ok((pcm, params))
}
