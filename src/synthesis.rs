/*!
 * Per-cue speech synthesis: WAV container assembly around raw provider PCM,
 * silence clips, and the retry loop over the speech provider.
 *
 * The provider streams raw sample data plus a MIME type describing it; this
 * module is where that bitstream becomes a playable file. The synthesizer
 * never fabricates silence itself - when the retry budget is exhausted the
 * caller substitutes the silence clip.
 */

use std::path::Path;
use anyhow::{Result, anyhow, Context};
use log::{warn, debug};

use crate::app_config::TtsConfig;
use crate::providers::gemini_tts::GeminiTts;
use crate::providers::SpeechProvider;

/// PCM parameters declared by the provider's MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Samples per second
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Channel count
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            bits_per_sample: 16,
            channels: 1,
        }
    }
}

impl PcmFormat {
    /// Parse a MIME type such as `audio/L16;codec=pcm;rate=24000`.
    ///
    /// `L<bits>` carries the bit depth and the `rate` parameter the sample
    /// rate; unknown parts fall back to the defaults rather than failing.
    pub fn from_mime(mime: &str) -> Self {
        let mut format = Self::default();

        for part in mime.split(';') {
            let part = part.trim();
            if let Some(rate) = part.strip_prefix("rate=") {
                if let Ok(rate) = rate.parse() {
                    format.sample_rate = rate;
                }
            } else if let Some(subtype) = part.strip_prefix("audio/") {
                if let Some(bits) = subtype.strip_prefix('L') {
                    if let Ok(bits) = bits.parse() {
                        format.bits_per_sample = bits;
                    }
                }
            }
        }

        format
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// Write a playable WAV file around a raw little-endian PCM payload
pub fn write_wav<P: AsRef<Path>>(path: P, format: &PcmFormat, payload: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = hound::WavWriter::create(path, format.wav_spec())
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    match format.bits_per_sample {
        16 => {
            for chunk in payload.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
            }
        }
        8 => {
            for &byte in payload {
                writer.write_sample(byte as i8)?;
            }
        }
        other => return Err(anyhow!("Unsupported PCM bit depth: {}", other)),
    }

    writer.finalize()?;
    Ok(())
}

/// Write a silence WAV of exactly `duration_ms` at the given sample rate
pub fn write_silence_wav<P: AsRef<Path>>(path: P, sample_rate: u32, duration_ms: u64) -> Result<()> {
    let format = PcmFormat {
        sample_rate,
        bits_per_sample: 16,
        channels: 1,
    };
    let samples = (duration_ms * sample_rate as u64 / 1000) as usize;

    let path = path.as_ref();
    let mut writer = hound::WavWriter::create(path, format.wav_spec())
        .with_context(|| format!("Failed to create silence WAV: {}", path.display()))?;
    for _ in 0..samples {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Measured duration of a WAV file in milliseconds
pub fn wav_duration_ms<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(anyhow!("WAV file declares a zero sample rate: {}", path.display()));
    }
    Ok(reader.duration() as u64 * 1000 / spec.sample_rate as u64)
}

/// Speech synthesizer wrapping the provider call with the retry policy
pub struct SpeechSynthesizer {
    /// Provider implementation
    provider: Box<dyn SpeechProvider>,

    /// Synthesis configuration
    pub config: TtsConfig,
}

impl SpeechSynthesizer {
    /// Create a new synthesizer with the given configuration
    pub fn new(config: TtsConfig) -> Self {
        let provider = Box::new(GeminiTts::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.timeout_secs,
        ));
        Self { provider, config }
    }

    /// Create a synthesizer over an explicit provider (used by tests)
    pub fn with_provider(provider: Box<dyn SpeechProvider>, config: TtsConfig) -> Self {
        Self { provider, config }
    }

    /// Synthesize one cue's text to a WAV file.
    ///
    /// Retries up to the configured budget, sleeping per the retry policy
    /// between attempts. Errors once the budget is exhausted; the caller
    /// decides on the silence substitute.
    pub async fn synthesize_to_wav(&self, text: &str, output: &Path) -> Result<()> {
        let retry = &self.config.retry;
        let mut last_error = None;

        for attempt in 1..=retry.max_attempts {
            let result = self
                .provider
                .synthesize(
                    text,
                    &self.config.voice,
                    &self.config.model,
                    self.config.style_prompt.as_deref(),
                )
                .await;

            match result {
                Ok(audio) if !audio.data.is_empty() => {
                    let format = PcmFormat::from_mime(&audio.mime_type);
                    debug!(
                        "Synthesized {} bytes ({} Hz, {} bit) on attempt {}",
                        audio.data.len(),
                        format.sample_rate,
                        format.bits_per_sample,
                        attempt
                    );
                    return write_wav(output, &format, &audio.data);
                }
                Ok(_) => {
                    last_error = Some(anyhow!("provider returned no audio data"));
                }
                Err(e) => {
                    last_error = Some(e.into());
                }
            }

            if attempt < retry.max_attempts {
                let delay = retry.delay_for(attempt);
                warn!(
                    "Synthesis attempt {}/{} failed, retrying in {:?}",
                    attempt, retry.max_attempts, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("synthesis failed with no recorded error")))
    }
}
