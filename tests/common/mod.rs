/*!
 * Common test utilities for the dubwai test suite
 */

use std::path::PathBuf;
use std::fs;
use anyhow::Result;
use tempfile::TempDir;

use dubwai::subtitle_processor::SubtitleEntry;

// Re-export the mock providers module
pub mod mock_providers;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &PathBuf, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, THREE_CUE_SRT)
}

/// A well-formed three-cue SRT
pub const THREE_CUE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Builds `count` one-second cues spaced a second apart
pub fn make_entries(count: usize) -> Vec<SubtitleEntry> {
    (0..count)
        .map(|i| {
            let start = (i as u64) * 2000;
            SubtitleEntry::new(i + 1, start, start + 1000, format!("Cue number {}", i + 1))
        })
        .collect()
}
