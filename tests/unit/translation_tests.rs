/*!
 * Tests for batch serialization and positional realignment
 */

use dubwai::subtitle_processor::SubtitleEntry;
use dubwai::translation::TranslationService;
use crate::common;

/// Batches are serialized with batch-local indices, not global ones
#[test]
fn test_serialize_batch_withGlobalSeqNums_shouldUseLocalIndices() {
    let batch = vec![
        SubtitleEntry::new(41, 100_000, 101_000, "First.".to_string()),
        SubtitleEntry::new(42, 102_000, 103_000, "Second.".to_string()),
    ];

    let block = TranslationService::serialize_batch(&batch);

    assert!(block.starts_with("1\n"));
    assert!(block.contains("\n\n2\n"));
    assert!(!block.contains("41"));
    assert!(!block.contains("42"));
}

/// A full reply translates every cue positionally
#[test]
fn test_align_batch_withFullReply_shouldTranslateAll() {
    let batch = common::make_entries(3);
    let reply = "1\n00:00:00,000 --> 00:00:01,000\nUno.\n\n\
                 2\n00:00:02,000 --> 00:00:03,000\nDos.\n\n\
                 3\n00:00:04,000 --> 00:00:05,000\nTres.\n\n";

    let (aligned, count) = TranslationService::align_batch(&batch, reply);

    assert_eq!(count, 3);
    let texts: Vec<&str> = aligned.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Uno.", "Dos.", "Tres."]);
}

/// A short reply translates the head and keeps source text for the tail
#[test]
fn test_align_batch_withShortfall_shouldKeepSourceTail() {
    let batch = common::make_entries(3);
    let reply = "1\n00:00:00,000 --> 00:00:01,000\nUno.\n\n\
                 2\n00:00:02,000 --> 00:00:03,000\nDos.\n\n";

    let (aligned, count) = TranslationService::align_batch(&batch, reply);

    assert_eq!(count, 2);
    assert_eq!(aligned.len(), 3);
    assert_eq!(aligned[0].text, "Uno.");
    assert_eq!(aligned[1].text, "Dos.");
    assert_eq!(aligned[2].text, batch[2].text);
}

/// A reply the cue regex cannot parse leaves the whole batch untouched
#[test]
fn test_align_batch_withGarbageReply_shouldKeepAllSourceText() {
    let batch = common::make_entries(2);

    let (aligned, count) = TranslationService::align_batch(&batch, "sorry, I cannot do that");

    assert_eq!(count, 0);
    assert_eq!(aligned.len(), 2);
    assert_eq!(aligned[0].text, batch[0].text);
    assert_eq!(aligned[1].text, batch[1].text);
}

/// Timing and global numbering always come from the source cues,
/// whatever numbering the translator echoes back
#[test]
fn test_align_batch_withEchoedNumbering_shouldIgnoreIt() {
    let batch = vec![
        SubtitleEntry::new(41, 100_000, 101_000, "First.".to_string()),
        SubtitleEntry::new(42, 102_000, 103_500, "Second.".to_string()),
    ];
    let reply = "7\n00:00:00,000 --> 00:00:01,000\nPremier.\n\n\
                 8\n00:00:02,000 --> 00:00:03,000\nDeuxième.\n\n";

    let (aligned, count) = TranslationService::align_batch(&batch, reply);

    assert_eq!(count, 2);
    assert_eq!(aligned[0].seq_num, 41);
    assert_eq!(aligned[0].start_time_ms, 100_000);
    assert_eq!(aligned[0].text, "Premier.");
    assert_eq!(aligned[1].seq_num, 42);
    assert_eq!(aligned[1].end_time_ms, 103_500);
    assert_eq!(aligned[1].text, "Deuxième.");
}
