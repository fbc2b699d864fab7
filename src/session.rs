use std::path::{Path, PathBuf};
use rand::Rng;
use rand::distr::Alphanumeric;
use url::Url;

// @module: Session naming and working-directory layout

/// Maximum length of a derived session identifier
const MAX_ID_LEN: usize = 16;

/// Length of the random fallback identifier
const RANDOM_ID_LEN: usize = 8;

/// Identity of a single dubbing run.
///
/// Every stage receives this value explicitly; nothing in the pipeline keeps
/// mutable naming state. The id is filesystem-safe and namespaces all
/// intermediate and final artifacts of the run inside `working_dir`.
#[derive(Debug, Clone)]
pub struct SessionContext {
    // @field: Short filesystem-safe run identifier
    pub id: String,

    // @field: Directory owned exclusively by this run
    pub working_dir: PathBuf,

    // @field: Target language code used in output naming
    pub target_language: String,
}

impl SessionContext {
    /// Create a session with an explicit identifier
    pub fn new(id: impl Into<String>, working_dir: impl Into<PathBuf>, target_language: impl Into<String>) -> Self {
        SessionContext {
            id: id.into(),
            working_dir: working_dir.into(),
            target_language: target_language.into(),
        }
    }

    /// Derive a session from a source URL or local file path.
    ///
    /// URL inputs use the video id (`v=` query parameter or the last path
    /// segment); file inputs use the file stem. If sanitizing leaves nothing,
    /// a random identifier is generated instead.
    pub fn derive(source: &str, working_dir: impl Into<PathBuf>, target_language: impl Into<String>) -> Self {
        let raw = Self::video_id_from_url(source)
            .or_else(|| {
                Path::new(source)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .unwrap_or_default();

        let mut id = Self::sanitize(&raw);
        if id.is_empty() {
            id = Self::random_id();
        }

        Self::new(id, working_dir, target_language)
    }

    /// Extract a stable video id from a URL, if the input is one
    fn video_id_from_url(source: &str) -> Option<String> {
        let url = Url::parse(source).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        // YouTube-style watch URLs carry the id in the query string
        if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }

        // Otherwise the last non-empty path segment (youtu.be/<id>, /reel/<id>/)
        url.path_segments()?
            .filter(|segment| !segment.is_empty())
            .next_back()
            .map(|segment| segment.to_string())
    }

    /// Keep only filesystem-safe characters and bound the length
    fn sanitize(raw: &str) -> String {
        raw.chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .take(MAX_ID_LEN)
            .collect()
    }

    /// Random alphanumeric fallback identifier
    fn random_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_ID_LEN)
            .map(char::from)
            .collect()
    }

    /// Path of the source-language cue file: `audio_<id>.srt`
    pub fn source_subtitle_path(&self) -> PathBuf {
        self.working_dir.join(format!("audio_{}.srt", self.id))
    }

    /// Path of the translated cue file: `audio_<id>_<lang>.srt`
    pub fn translated_subtitle_path(&self) -> PathBuf {
        self.working_dir
            .join(format!("audio_{}_{}.srt", self.id, self.target_language))
    }

    /// Directory holding the per-cue clips
    pub fn segments_dir(&self) -> PathBuf {
        self.working_dir.join("dubbed_segments")
    }

    /// Final per-cue clip path: `dubbed_segments/dub_<n>.wav`, `n` 1-based
    pub fn segment_path(&self, seq_num: usize) -> PathBuf {
        self.segments_dir().join(format!("dub_{}.wav", seq_num))
    }

    /// Raw (pre-retiming) synthesis output for one cue
    pub fn raw_segment_path(&self, seq_num: usize) -> PathBuf {
        self.segments_dir().join(format!("raw_{}.wav", seq_num))
    }

    /// Assembled full-length audio track
    pub fn assembled_audio_path(&self) -> PathBuf {
        self.working_dir.join(format!("dubbed_audio_{}.wav", self.id))
    }

    /// Final muxed video output
    pub fn output_video_path(&self) -> PathBuf {
        self.working_dir.join(format!("dubbed_video_{}.mp4", self.id))
    }
}
