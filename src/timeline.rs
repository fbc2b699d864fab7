/*!
 * Timeline assembly: base track construction and additive overlay of the
 * per-cue clips at their start offsets.
 *
 * Mixing happens in-process on mono 16-bit samples at the pipeline sample
 * rate. Overlapping clips mix additively; nothing detects or resolves the
 * overlap. The assembler owns composition exclusively and never mutates the
 * per-cue clips it reads.
 */

use std::path::Path;
use anyhow::{Result, anyhow, Context};
use log::warn;

/// Assembles the dubbed audio track for one run
pub struct TimelineAssembler {
    /// Mono sample rate everything is mixed at
    sample_rate: u32,
}

impl TimelineAssembler {
    /// Create an assembler at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Samples for a given duration at the assembler's rate
    fn samples_for_ms(&self, duration_ms: u64) -> usize {
        (duration_ms * self.sample_rate as u64 / 1000) as usize
    }

    /// Duration in milliseconds of a sample buffer at the assembler's rate
    pub fn duration_ms(&self, samples: usize) -> u64 {
        samples as u64 * 1000 / self.sample_rate as u64
    }

    /// Silence base track spanning the video duration
    pub fn silence_base(&self, duration_ms: u64) -> Vec<i16> {
        vec![0i16; self.samples_for_ms(duration_ms)]
    }

    /// Base track from the original audio, attenuated and sized to the video.
    ///
    /// `keep_volume` is the fraction of the original level to keep; the
    /// complement maps linearly onto a 30 dB reduction range. The buffer is
    /// padded or truncated to exactly the video duration.
    pub fn attenuated_base(&self, original: Vec<i16>, duration_ms: u64, keep_volume: f32) -> Vec<i16> {
        let keep = keep_volume.clamp(0.0, 1.0);
        let reduction_db = 30.0 * (1.0 - keep);
        let gain = 10f32.powf(-reduction_db / 20.0);

        let mut base = original;
        for sample in base.iter_mut() {
            *sample = (*sample as f32 * gain) as i16;
        }
        base.resize(self.samples_for_ms(duration_ms), 0);
        base
    }

    /// Mix a clip additively onto the base track at the given offset.
    ///
    /// A clip running past the end of the base extends it; the final mux
    /// handles any resulting overshoot with a global tempo change.
    pub fn overlay(&self, base: &mut Vec<i16>, clip: &[i16], start_ms: u64) {
        let offset = self.samples_for_ms(start_ms);
        if offset + clip.len() > base.len() {
            base.resize(offset + clip.len(), 0);
        }

        for (i, &sample) in clip.iter().enumerate() {
            let mixed = base[offset + i] as i32 + sample as i32;
            base[offset + i] = mixed.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
    }

    /// Read a per-cue clip as mono samples at the assembler's rate.
    ///
    /// Clips at another rate (a provider may declare any L16 rate) are
    /// resampled by nearest-sample lookup - crude, but the clips were
    /// already tempo-fitted, so only the pitch-neutral length matters here.
    pub fn read_clip<P: AsRef<Path>>(&self, path: P) -> Result<Vec<i16>> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open clip: {}", path.display()))?;
        let spec = reader.spec();

        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(anyhow!(
                "Unsupported clip format in {} ({} bit {:?})",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            ));
        }

        let mut samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read samples from {}", path.display()))?;

        // Fold multi-channel clips down to mono
        if spec.channels > 1 {
            let channels = spec.channels as usize;
            samples = samples
                .chunks(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect();
        }

        if spec.sample_rate != self.sample_rate {
            warn!(
                "Clip {} is at {} Hz, resampling to {} Hz",
                path.display(),
                spec.sample_rate,
                self.sample_rate
            );
            samples = Self::resample_nearest(&samples, spec.sample_rate, self.sample_rate);
        }

        Ok(samples)
    }

    /// Nearest-sample resampling between two rates
    fn resample_nearest(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }
        let out_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
        (0..out_len)
            .map(|i| {
                let src = (i as u64 * from_rate as u64 / to_rate as u64) as usize;
                samples[src.min(samples.len() - 1)]
            })
            .collect()
    }

    /// Write the assembled track to a WAV file
    pub fn write_track<P: AsRef<Path>>(&self, path: P, samples: &[i16]) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create track file: {}", path.display()))?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}
