/*!
 * Tests for WAV container assembly, silence clips and the retry policy
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use anyhow::Result;

use dubwai::app_config::{DelayGrowth, RetryConfig, TtsConfig};
use dubwai::synthesis::{self, PcmFormat, SpeechSynthesizer};
use crate::common;
use crate::common::mock_providers::{FailingSpeech, FixedClipSpeech};

/// The provider MIME type carries bit depth and sample rate
#[test]
fn test_pcm_format_withGeminiMime_shouldParseRateAndBits() {
    let format = PcmFormat::from_mime("audio/L16;codec=pcm;rate=24000");
    assert_eq!(format.sample_rate, 24_000);
    assert_eq!(format.bits_per_sample, 16);
    assert_eq!(format.channels, 1);
}

/// Other rates and depths parse too
#[test]
fn test_pcm_format_withOtherParameters_shouldParse() {
    let format = PcmFormat::from_mime("audio/L8;rate=8000");
    assert_eq!(format.sample_rate, 8_000);
    assert_eq!(format.bits_per_sample, 8);
}

/// Unknown MIME types fall back to the defaults instead of failing
#[test]
fn test_pcm_format_withUnknownMime_shouldFallBackToDefaults() {
    let format = PcmFormat::from_mime("audio/ogg");
    assert_eq!(format, PcmFormat::default());
}

/// Raw little-endian PCM round-trips through the written container
#[test]
fn test_write_wav_withRawPayload_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("clip.wav");

    let samples: [i16; 4] = [0, 1000, -1000, 32000];
    let mut payload = Vec::new();
    for sample in samples {
        payload.extend_from_slice(&sample.to_le_bytes());
    }

    let format = PcmFormat {
        sample_rate: 24_000,
        bits_per_sample: 16,
        channels: 1,
    };
    synthesis::write_wav(&path, &format, &payload)?;

    let mut reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.spec().sample_rate, 24_000);
    assert_eq!(reader.spec().bits_per_sample, 16);

    let read: Vec<i16> = reader.samples::<i16>().collect::<std::result::Result<_, _>>()?;
    assert_eq!(read, samples);
    Ok(())
}

/// Silence clips match the requested window exactly
#[test]
fn test_write_silence_wav_withWindow_shouldMatchDurationExactly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("silence.wav");

    synthesis::write_silence_wav(&path, 24_000, 2500)?;

    let duration = synthesis::wav_duration_ms(&path)?;
    assert!(duration.abs_diff(2500) <= 20, "duration was {} ms", duration);
    Ok(())
}

/// Linear growth scales the delay with the attempt number
#[test]
fn test_retry_config_withLinearGrowth_shouldScaleDelay() {
    let retry = RetryConfig {
        max_attempts: 5,
        base_delay_ms: 1000,
        growth: DelayGrowth::Linear,
    };
    assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
    assert_eq!(retry.delay_for(3), Duration::from_millis(3000));
}

/// Exponential growth doubles the delay per attempt
#[test]
fn test_retry_config_withExponentialGrowth_shouldDoubleDelay() {
    let retry = RetryConfig {
        max_attempts: 5,
        base_delay_ms: 1000,
        growth: DelayGrowth::Exponential,
    };
    assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
    assert_eq!(retry.delay_for(2), Duration::from_millis(2000));
    assert_eq!(retry.delay_for(4), Duration::from_millis(8000));
}

/// Fast-retry config for the async tests below
fn quick_tts_config() -> TtsConfig {
    TtsConfig {
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            growth: DelayGrowth::Linear,
        },
        ..TtsConfig::default()
    }
}

/// A working provider produces a clip of its declared duration
#[tokio::test]
async fn test_synthesize_to_wav_withWorkingProvider_shouldWriteClip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cue.wav");

    let provider = Box::new(FixedClipSpeech {
        duration_ms: 500,
        sample_rate: 24_000,
    });
    let synthesizer = SpeechSynthesizer::with_provider(provider, quick_tts_config());

    synthesizer.synthesize_to_wav("hello there", &path).await?;

    let duration = synthesis::wav_duration_ms(&path)?;
    assert!(duration.abs_diff(500) <= 20, "duration was {} ms", duration);
    Ok(())
}

/// The retry budget is exhausted before giving up
#[tokio::test]
async fn test_synthesize_to_wav_withFailingProvider_shouldErrorAfterBudget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cue.wav");

    let provider = Box::new(FailingSpeech::default());
    let calls = Arc::clone(&provider.calls);
    let synthesizer = SpeechSynthesizer::with_provider(provider, quick_tts_config());

    let result = synthesizer.synthesize_to_wav("hello there", &path).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!path.exists());
    Ok(())
}
