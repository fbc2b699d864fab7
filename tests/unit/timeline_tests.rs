/*!
 * Tests for base track construction and additive overlay mixing
 */

use anyhow::Result;
use dubwai::timeline::TimelineAssembler;
use crate::common;

/// Silence base track spans exactly the video duration
#[test]
fn test_silence_base_withDuration_shouldHaveExactLength() {
    let assembler = TimelineAssembler::new(24_000);
    let base = assembler.silence_base(10_000);

    assert_eq!(base.len(), 240_000);
    assert!(base.iter().all(|&s| s == 0));
    assert_eq!(assembler.duration_ms(base.len()), 10_000);
}

/// A clip lands at its start offset, leaving the rest untouched
#[test]
fn test_overlay_withClip_shouldMixAtOffset() {
    let assembler = TimelineAssembler::new(1_000);
    let mut base = assembler.silence_base(2_000);
    let clip = vec![500i16; 100];

    assembler.overlay(&mut base, &clip, 500);

    assert!(base[..500].iter().all(|&s| s == 0));
    assert!(base[500..600].iter().all(|&s| s == 500));
    assert!(base[600..].iter().all(|&s| s == 0));
}

/// Overlapping clips mix additively in the overlap region
#[test]
fn test_overlay_withOverlappingClips_shouldMixAdditively() {
    let assembler = TimelineAssembler::new(1_000);
    let mut base = assembler.silence_base(1_000);

    assembler.overlay(&mut base, &vec![300i16; 200], 0);
    assembler.overlay(&mut base, &vec![400i16; 200], 100);

    assert!(base[..100].iter().all(|&s| s == 300));
    assert!(base[100..200].iter().all(|&s| s == 700));
    assert!(base[200..300].iter().all(|&s| s == 400));
}

/// Mixing saturates instead of wrapping around
#[test]
fn test_overlay_withHotSignals_shouldSaturate() {
    let assembler = TimelineAssembler::new(1_000);
    let mut base = vec![30_000i16; 100];

    assembler.overlay(&mut base, &vec![30_000i16; 100], 0);

    assert!(base.iter().all(|&s| s == i16::MAX));
}

/// A clip running past the end of the base extends it
#[test]
fn test_overlay_withClipPastEnd_shouldExtendBase() {
    let assembler = TimelineAssembler::new(1_000);
    let mut base = assembler.silence_base(1_000);

    assembler.overlay(&mut base, &vec![100i16; 500], 800);

    assert_eq!(base.len(), 1_300);
    assert_eq!(base[1_299], 100);
}

/// Full volume keeps the original samples; zero volume cuts 30 dB
#[test]
fn test_attenuated_base_withVolumeFraction_shouldScaleSamples() {
    let assembler = TimelineAssembler::new(1_000);
    let original = vec![10_000i16; 1_000];

    let unchanged = assembler.attenuated_base(original.clone(), 1_000, 1.0);
    assert_eq!(unchanged[0], 10_000);

    let attenuated = assembler.attenuated_base(original, 1_000, 0.0);
    // -30 dB is a linear gain of ~0.0316
    let expected = (10_000f32 * 0.0316) as i16;
    assert!(attenuated[0].abs_diff(expected) <= 10, "sample was {}", attenuated[0]);
}

/// The attenuated base is padded or truncated to the video duration
#[test]
fn test_attenuated_base_withMismatchedLength_shouldResize() {
    let assembler = TimelineAssembler::new(1_000);

    let padded = assembler.attenuated_base(vec![100i16; 400], 1_000, 1.0);
    assert_eq!(padded.len(), 1_000);
    assert_eq!(padded[500], 0);

    let truncated = assembler.attenuated_base(vec![100i16; 2_000], 1_000, 1.0);
    assert_eq!(truncated.len(), 1_000);
}

/// Tracks round-trip through the WAV writer
#[test]
fn test_write_track_withSamples_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("track.wav");

    let assembler = TimelineAssembler::new(24_000);
    let samples: Vec<i16> = (0..1_000).map(|i| (i % 256) as i16).collect();
    assembler.write_track(&path, &samples)?;

    let read = assembler.read_clip(&path)?;
    assert_eq!(read, samples);
    Ok(())
}

/// Clips at a foreign sample rate are resampled on read
#[test]
fn test_read_clip_withDifferentRate_shouldResample() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("slow.wav");

    // One second of audio at 12 kHz
    let writer_assembler = TimelineAssembler::new(12_000);
    writer_assembler.write_track(&path, &vec![250i16; 12_000])?;

    let reader_assembler = TimelineAssembler::new(24_000);
    let clip = reader_assembler.read_clip(&path)?;

    // Still one second, now at 24 kHz
    assert_eq!(clip.len(), 24_000);
    assert!(clip.iter().all(|&s| s == 250));
    Ok(())
}
