use std::path::Path;
use std::time::Duration;
use anyhow::{Result, anyhow, Context};
use log::error;
use tokio::process::Command;

// @module: ffmpeg/ffprobe subprocess wrappers

/// Timeout for probe and per-clip filter operations
const CLIP_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for whole-file operations (extraction, final mux)
const TRACK_TIMEOUT: Duration = Duration::from_secs(600);

/// Run an ffmpeg invocation, failing on nonzero exit or timeout
async fn run_ffmpeg(args: &[&str], timeout: Duration, what: &str) -> Result<()> {
    let ffmpeg_future = Command::new("ffmpeg").args(args).output();

    let output = tokio::select! {
        result = ffmpeg_future => {
            result.map_err(|e| anyhow!("Failed to execute ffmpeg for {}: {}", what, e))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(anyhow!("ffmpeg timed out after {:?} during {}", timeout, what));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered = filter_ffmpeg_stderr(&stderr);
        error!("ffmpeg {} failed: {}", what, filtered);
        return Err(anyhow!("ffmpeg {} failed: {}", what, filtered));
    }

    Ok(())
}

/// Duration of a media file in milliseconds, via ffprobe
pub async fn probe_duration_ms<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow!("Media file does not exist: {:?}", path));
    }

    let ffprobe_future = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
            path.to_str().unwrap_or_default(),
        ])
        .output();

    let output = tokio::select! {
        result = ffprobe_future => {
            result.map_err(|e| anyhow!("Failed to execute ffprobe: {}", e))?
        },
        _ = tokio::time::sleep(CLIP_TIMEOUT) => {
            return Err(anyhow!("ffprobe timed out on {:?}", path));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("ffprobe failed on {:?}: {}", path, stderr.trim()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seconds: f64 = stdout
        .trim()
        .parse()
        .with_context(|| format!("Unparsable ffprobe duration: {:?}", stdout.trim()))?;

    Ok((seconds * 1000.0).round() as u64)
}

/// Extract a video's audio track as mono 16-bit PCM at the given rate
pub async fn extract_audio<P1: AsRef<Path>, P2: AsRef<Path>>(
    video: P1,
    output_wav: P2,
    sample_rate: u32,
) -> Result<()> {
    let rate = sample_rate.to_string();
    run_ffmpeg(
        &[
            "-y",
            "-i", video.as_ref().to_str().unwrap_or_default(),
            "-vn",
            "-ac", "1",
            "-ar", rate.as_str(),
            "-c:a", "pcm_s16le",
            output_wav.as_ref().to_str().unwrap_or_default(),
        ],
        TRACK_TIMEOUT,
        "audio extraction",
    )
    .await
}

/// Extract the first subtitle stream of a video to an SRT file
pub async fn extract_subtitle_track<P1: AsRef<Path>, P2: AsRef<Path>>(
    video: P1,
    output_srt: P2,
) -> Result<()> {
    run_ffmpeg(
        &[
            "-y",
            "-i", video.as_ref().to_str().unwrap_or_default(),
            "-map", "0:s:0",
            "-c:s", "srt",
            output_srt.as_ref().to_str().unwrap_or_default(),
        ],
        CLIP_TIMEOUT,
        "subtitle extraction",
    )
    .await
}

/// Build an atempo filter chain for the given factor.
///
/// A single atempo instance only accepts factors in [0.5, 2.0]; anything
/// outside is decomposed into a chain of in-range stages.
pub fn atempo_filter(factor: f64) -> String {
    let mut stages = Vec::new();
    let mut remaining = factor;

    while remaining > 2.0 {
        stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    stages.push(format!("atempo={:.6}", remaining));

    stages.join(",")
}

/// Apply a tempo change to an audio file, writing mono 16-bit PCM output
pub async fn change_tempo<P1: AsRef<Path>, P2: AsRef<Path>>(
    input: P1,
    output: P2,
    factor: f64,
    sample_rate: u32,
) -> Result<()> {
    let filter = atempo_filter(factor);
    let rate = sample_rate.to_string();
    run_ffmpeg(
        &[
            "-y",
            "-i", input.as_ref().to_str().unwrap_or_default(),
            "-filter:a", filter.as_str(),
            "-ac", "1",
            "-ar", rate.as_str(),
            "-c:a", "pcm_s16le",
            output.as_ref().to_str().unwrap_or_default(),
        ],
        CLIP_TIMEOUT,
        "tempo change",
    )
    .await
}

/// Remux the source video stream against a new audio track.
///
/// The video stream is copied, the audio re-encoded to AAC, and the output
/// truncated to the shorter of the two streams.
pub async fn mux<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
    video: P1,
    audio: P2,
    output: P3,
) -> Result<()> {
    run_ffmpeg(
        &[
            "-y",
            "-i", video.as_ref().to_str().unwrap_or_default(),
            "-i", audio.as_ref().to_str().unwrap_or_default(),
            "-map", "0:v:0",
            "-map", "1:a:0",
            "-c:v", "copy",
            "-c:a", "aac",
            "-b:a", "192k",
            "-shortest",
            output.as_ref().to_str().unwrap_or_default(),
        ],
        TRACK_TIMEOUT,
        "final mux",
    )
    .await
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Output #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Stream mapping:",
        "Press [q]",
        "size=",
        "video:",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
