use anyhow::{anyhow, Result, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Merge consecutive cues in groups of this size before translation.
    /// Lossy; reduces request volume against rate-limited APIs.
    #[serde(default)]
    pub merge_count: Option<usize>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech synthesis config
    #[serde(default)]
    pub tts: TtsConfig,

    /// Timeline assembly config
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            merge_count: None,
            translation: TranslationConfig::default(),
            tts: TtsConfig::default(),
            timeline: TimelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, writing a default one when absent
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("source_language must not be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("target_language must not be empty"));
        }
        if let Some(count) = self.merge_count {
            if count < 2 {
                return Err(anyhow!("merge_count must be at least 2 when set"));
            }
        }
        if !(0.0..=1.0).contains(&self.timeline.original_volume) {
            return Err(anyhow!("timeline.original_volume must be within 0.0..=1.0"));
        }
        if self.tts.retry.max_attempts == 0 {
            return Err(anyhow!("tts.retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Primary model name
    #[serde(default = "default_translation_model")]
    pub model: String,

    /// Ordered fallback models tried when the primary call fails
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional, for self-hosted gateways)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Maximum cues per translation batch
    #[serde(default = "default_max_entries_per_batch")]
    pub max_entries_per_batch: usize,

    /// Maximum serialized characters per translation batch
    #[serde(default = "default_max_chars_per_batch")]
    pub max_chars_per_batch: usize,

    /// Fixed delay between successful batch calls in milliseconds
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,

    /// Fixed delay between fallback model attempts in milliseconds
    #[serde(default = "default_model_retry_delay_ms")]
    pub model_retry_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_translation_model(),
            fallback_models: default_fallback_models(),
            api_key: String::new(),
            endpoint: String::new(),
            max_entries_per_batch: default_max_entries_per_batch(),
            max_chars_per_batch: default_max_chars_per_batch(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            model_retry_delay_ms: default_model_retry_delay_ms(),
            timeout_secs: default_translation_timeout_secs(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// How the retry delay grows between attempts
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DelayGrowth {
    /// delay = attempt * base_delay
    #[default]
    Linear,
    /// delay = base_delay * 2^(attempt - 1)
    Exponential,
}

/// Retry policy for per-cue synthesis calls.
///
/// The external quota characteristics driving these values are
/// collaborator-specific, so the growth function is configurable
/// rather than hardcoded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    /// Maximum attempts per cue
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay growth function
    #[serde(default)]
    pub growth: DelayGrowth,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
            growth: DelayGrowth::default(),
        }
    }
}

impl RetryConfig {
    /// Delay to sleep after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = match self.growth {
            DelayGrowth::Linear => self.base_delay_ms.saturating_mul(attempt as u64),
            DelayGrowth::Exponential => self
                .base_delay_ms
                .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16)),
        };
        Duration::from_millis(millis)
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    /// TTS model name
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Voice identifier
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Optional delivery-style prompt prepended to each cue
    #[serde(default)]
    pub style_prompt: Option<String>,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry policy for failed synthesis calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cues per pacing batch against the external quota
    #[serde(default = "default_pacing_batch_size")]
    pub pacing_batch_size: usize,

    /// Pause between pacing batches in seconds
    #[serde(default = "default_inter_batch_pause_secs")]
    pub inter_batch_pause_secs: u64,

    /// Pause between cues inside a pacing batch in milliseconds
    #[serde(default = "default_intra_batch_pause_ms")]
    pub intra_batch_pause_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_voice(),
            style_prompt: None,
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_tts_timeout_secs(),
            retry: RetryConfig::default(),
            pacing_batch_size: default_pacing_batch_size(),
            inter_batch_pause_secs: default_inter_batch_pause_secs(),
            intra_batch_pause_ms: default_intra_batch_pause_ms(),
        }
    }
}

/// Timeline assembly configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimelineConfig {
    /// Mix the dubbed clips over the attenuated original audio
    #[serde(default)]
    pub keep_original_audio: bool,

    /// Fraction of the original audio volume to keep (0.0 to 1.0)
    #[serde(default = "default_original_volume")]
    pub original_volume: f32,

    /// Mono sample rate the timeline is assembled at
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            keep_original_audio: false,
            original_volume: default_original_volume(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fa".to_string()
}

fn default_translation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec![
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-flash-8b".to_string(),
    ]
}

fn default_max_entries_per_batch() -> usize {
    15
}

fn default_max_chars_per_batch() -> usize {
    4000
}

fn default_inter_batch_delay_ms() -> u64 {
    3000
}

fn default_model_retry_delay_ms() -> u64 {
    2000
}

fn default_translation_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.3
}

fn default_system_prompt() -> String {
    "You are a subtitle translator. Translate the following subtitle blocks from {source_language} to {target_language}. \
     Keep the exact same block format: index, timing line, translated text, blank line. \
     Do not merge, split, reorder or renumber blocks. Translate only the text lines."
        .to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_tts_timeout_secs() -> u64 {
    120
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    5000
}

fn default_pacing_batch_size() -> usize {
    3
}

fn default_inter_batch_pause_secs() -> u64 {
    60
}

fn default_intra_batch_pause_ms() -> u64 {
    2000
}

fn default_original_volume() -> f32 {
    0.3
}

fn default_sample_rate() -> u32 {
    24000
}
