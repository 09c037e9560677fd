// Unit tests for the volume meter.

use cohost_linux_rs::audio::meter;

#[test]
fn test_empty_frame_is_silent() {
    assert_eq!(meter::level(&[]), 0.0);
}

#[test]
fn test_silence_is_zero() {
    assert_eq!(meter::level(&[0.0; 512]), 0.0);
}

#[test]
fn test_constant_amplitude_reads_as_rms_times_100() {
    let level = meter::level(&[0.5; 1024]);
    assert!((level - 50.0).abs() < 1e-3);
}

#[test]
fn test_full_scale_square_wave_reads_100() {
    let frame: Vec<f32> = (0..1024).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
    let level = meter::level(&frame);
    assert!((level - 100.0).abs() < 1e-3);
}
