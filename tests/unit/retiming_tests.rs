/*!
 * Tests for tempo clamping, silence sizing and the global mux correction
 */

use dubwai::retiming::{
    clamped_tempo_factor, global_tempo_factor, silence_duration_ms,
    MAX_TEMPO_FACTOR, MIN_TEMPO_FACTOR,
};

/// A clip four times longer than its window clamps to the fast bound
#[test]
fn test_clamped_tempo_factor_withOversizedClip_shouldClampHigh() {
    assert_eq!(clamped_tempo_factor(4000, 1000), MAX_TEMPO_FACTOR);
}

/// A degenerately short clip clamps to the slow bound
#[test]
fn test_clamped_tempo_factor_withTinyClip_shouldClampLow() {
    assert_eq!(clamped_tempo_factor(100, 1000), MIN_TEMPO_FACTOR);
}

/// In-range ratios pass through unclamped
#[test]
fn test_clamped_tempo_factor_withinRange_shouldBeExact() {
    let factor = clamped_tempo_factor(1500, 1000);
    assert!((factor - 1.5).abs() < 1e-9);

    let factor = clamped_tempo_factor(800, 1000);
    assert!((factor - 0.8).abs() < 1e-9);
}

/// A zero-length window behaves like an infinitely long clip
#[test]
fn test_clamped_tempo_factor_withZeroWindow_shouldClampHigh() {
    assert_eq!(clamped_tempo_factor(500, 0), MAX_TEMPO_FACTOR);
}

/// The clamp bounds hold over a sweep of ratios
#[test]
fn test_clamped_tempo_factor_overSweep_shouldStayInBounds() {
    for actual in (0..5000).step_by(37) {
        let factor = clamped_tempo_factor(actual, 700);
        assert!((MIN_TEMPO_FACTOR..=MAX_TEMPO_FACTOR).contains(&factor));
    }
}

/// Substituted silence has a 100 ms floor
#[test]
fn test_silence_duration_withTinyWindow_shouldApplyFloor() {
    assert_eq!(silence_duration_ms(40), 100);
    assert_eq!(silence_duration_ms(0), 100);
    assert_eq!(silence_duration_ms(2500), 2500);
}

/// Assembled audio overshooting the video drives a global tempo change
#[test]
fn test_global_tempo_factor_withOvershoot_shouldScale() {
    let factor = global_tempo_factor(12_000, 10_000).unwrap();
    assert!((factor - 1.2).abs() < 1e-9);
}

/// Audio that fits needs no correction
#[test]
fn test_global_tempo_factor_withFittingAudio_shouldBeNone() {
    assert!(global_tempo_factor(9_000, 10_000).is_none());
    assert!(global_tempo_factor(10_000, 10_000).is_none());
}

/// A zero-length video never drives a correction
#[test]
fn test_global_tempo_factor_withZeroVideo_shouldBeNone() {
    assert!(global_tempo_factor(5_000, 0).is_none());
}
