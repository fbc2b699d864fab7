/*!
 * Tests for configuration loading, defaults and validation
 */

use anyhow::Result;
use dubwai::app_config::{Config, DelayGrowth, LogLevel};
use crate::common;

/// The default configuration is internally consistent
#[test]
fn test_default_config_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fa");
    assert_eq!(config.translation.max_entries_per_batch, 15);
    assert_eq!(config.translation.max_chars_per_batch, 4000);
    assert_eq!(config.tts.retry.max_attempts, 3);
    assert_eq!(config.tts.pacing_batch_size, 3);
    assert_eq!(config.timeline.sample_rate, 24_000);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Partial JSON fills the gaps with defaults
#[test]
fn test_config_fromJson_withPartialFields_shouldUseDefaults() -> Result<()> {
    let json = r#"{
        "target_language": "es",
        "merge_count": 4,
        "translation": { "model": "gemini-exp" },
        "tts": { "retry": { "max_attempts": 5, "growth": "exponential" } }
    }"#;

    let config: Config = serde_json::from_str(json)?;
    config.validate()?;

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "es");
    assert_eq!(config.merge_count, Some(4));
    assert_eq!(config.translation.model, "gemini-exp");
    assert!(!config.translation.fallback_models.is_empty());
    assert_eq!(config.tts.retry.max_attempts, 5);
    assert_eq!(config.tts.retry.growth, DelayGrowth::Exponential);
    Ok(())
}

/// Out-of-range volume fractions are rejected
#[test]
fn test_validate_withBadVolume_shouldError() {
    let mut config = Config::default();
    config.timeline.original_volume = 1.5;
    assert!(config.validate().is_err());
}

/// A merge count below 2 makes no sense
#[test]
fn test_validate_withUnitMergeCount_shouldError() {
    let mut config = Config::default();
    config.merge_count = Some(1);
    assert!(config.validate().is_err());
}

/// Zero retry attempts would silently skip synthesis
#[test]
fn test_validate_withZeroRetryAttempts_shouldError() {
    let mut config = Config::default();
    config.tts.retry.max_attempts = 0;
    assert!(config.validate().is_err());
}

/// Saving and reloading preserves the configuration
#[test]
fn test_save_and_reload_withDefaults_shouldMatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "de".to_string();
    config.tts.voice = "Puck".to_string();
    config.save(&path)?;

    let reloaded = Config::from_file(&path)?;
    assert_eq!(reloaded.target_language, "de");
    assert_eq!(reloaded.tts.voice, "Puck");
    Ok(())
}

/// A missing config file gets created with defaults
#[test]
fn test_from_file_or_default_withMissingFile_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    assert!(!path.exists());

    let config = Config::from_file_or_default(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_language, Config::default().target_language);
    Ok(())
}
