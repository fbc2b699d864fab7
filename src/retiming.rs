/*!
 * Cue audio retiming: tempo clamping, silence fallback sizing, and the
 * global tempo correction applied before the final mux.
 *
 * Each synthesized clip is stretched or compressed so its duration fits the
 * owning cue's window. The tempo ratio is clamped to a safe range; extreme
 * mismatches therefore leave residual drift, which is accepted rather than
 * corrected downstream.
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use log::{warn, debug};

use crate::media;
use crate::synthesis;

/// Slowest accepted tempo ratio
pub const MIN_TEMPO_FACTOR: f64 = 0.5;

/// Fastest accepted tempo ratio
pub const MAX_TEMPO_FACTOR: f64 = 2.5;

/// Floor for substituted silence clips; prevents degenerate media files
pub const MIN_SILENCE_MS: u64 = 100;

/// Tempo ratios this close to 1.0 are not worth a tool invocation
const NEUTRAL_TOLERANCE: f64 = 0.01;

/// What happened to one clip during retiming
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetimeOutcome {
    /// Tempo change applied with the given factor
    Retimed { factor: f64 },
    /// Clip already fit its window; copied through unchanged
    Unchanged,
    /// Tempo tool failed; the raw clip was used verbatim
    RawFallback,
}

/// Tempo factor for a clip of `actual_ms` targeting a window of `target_ms`,
/// clamped into the safe range
pub fn clamped_tempo_factor(actual_ms: u64, target_ms: u64) -> f64 {
    if target_ms == 0 {
        return MAX_TEMPO_FACTOR;
    }
    (actual_ms as f64 / target_ms as f64).clamp(MIN_TEMPO_FACTOR, MAX_TEMPO_FACTOR)
}

/// Duration of the silence clip substituted for a failed cue
pub fn silence_duration_ms(target_ms: u64) -> u64 {
    target_ms.max(MIN_SILENCE_MS)
}

/// Whole-track tempo factor for the final mux, or None when the assembled
/// audio already fits the video
pub fn global_tempo_factor(audio_ms: u64, video_ms: u64) -> Option<f64> {
    if video_ms == 0 || audio_ms <= video_ms {
        return None;
    }
    Some(audio_ms as f64 / video_ms as f64)
}

/// Retime `input` so its duration approaches `target_ms`, writing to `output`.
///
/// On tempo-tool failure the raw clip is copied through verbatim - present
/// and mistimed beats absent.
pub async fn retime_clip(
    input: &Path,
    output: &Path,
    target_ms: u64,
    sample_rate: u32,
) -> Result<RetimeOutcome> {
    let actual_ms = synthesis::wav_duration_ms(input)?;
    let factor = clamped_tempo_factor(actual_ms, target_ms);

    if (factor - 1.0).abs() < NEUTRAL_TOLERANCE {
        fs::copy(input, output)?;
        return Ok(RetimeOutcome::Unchanged);
    }

    debug!(
        "Retiming {:?}: {} ms -> {} ms (factor {:.3})",
        input.file_name().unwrap_or_default(),
        actual_ms,
        target_ms,
        factor
    );

    match media::change_tempo(input, output, factor, sample_rate).await {
        Ok(()) => Ok(RetimeOutcome::Retimed { factor }),
        Err(e) => {
            warn!("Tempo change failed ({}); using the raw clip verbatim", e);
            fs::copy(input, output)?;
            Ok(RetimeOutcome::RawFallback)
        }
    }
}
