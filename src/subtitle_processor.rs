use std::fmt;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use log::{warn, debug};
use once_cell::sync::Lazy;
use regex::Regex;

// @module: SRT cue parsing, batching and compression

// @const: SRT timing line regex
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// Characters accepted as sentence terminators when merging cue groups
const SENTENCE_TERMINATORS: [char; 5] = ['.', '!', '?', '،', ':'];

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number, 1-based, assigned by timeline position
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Cue text
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Length of the cue window in milliseconds
    pub fn window_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Serialize this cue as one SRT block under a caller-chosen index.
    ///
    /// Translation batches are serialized with batch-local indices so the
    /// remote model always sees "1, 2, 3…" regardless of global position.
    pub fn serialized_block(&self, index: usize) -> String {
        format!(
            "{}\n{} --> {}\n{}\n\n",
            index,
            self.format_start_time(),
            self.format_end_time(),
            self.text
        )
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Diagnostic for a block the parser had to skip.
///
/// The parser drops malformed blocks instead of failing the whole file, but
/// every drop is reported to the caller rather than vanishing silently.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    /// Line number where the skipped block starts (1-based)
    pub line: usize,
    /// Why the block was rejected
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// Source language
    pub source_language: String,
}

impl SubtitleCollection {
    /// Create a new subtitle collection
    pub fn new(source_file: PathBuf, source_language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            source_language,
        }
    }

    /// Load and parse an SRT file
    pub fn load_srt<P: AsRef<Path>>(path: P, source_language: &str) -> Result<(Self, Vec<ParseWarning>)> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let (entries, warnings) = Self::parse_srt_string(&content)?;

        Ok((
            SubtitleCollection {
                source_file: path.to_path_buf(),
                entries,
                source_language: source_language.to_string(),
            },
            warnings,
        ))
    }

    /// Parse SRT format text into subtitle entries plus skip diagnostics.
    ///
    /// Blocks without a recognizable timing line, with an inverted time range,
    /// or with empty text are skipped and reported as warnings. Sequence
    /// numbers in the source are ignored; entries are renumbered `1..N` by
    /// timeline position. Errors only when zero valid cues are found.
    pub fn parse_srt_string(content: &str) -> Result<(Vec<SubtitleEntry>, Vec<ParseWarning>)> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();

        let mut block: Vec<&str> = Vec::new();
        let mut block_start_line = 1;

        // Trailing sentinel line flushes the last block
        for (idx, line) in content.lines().chain(std::iter::once("")).enumerate() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    Self::parse_block(&block, block_start_line, &mut entries, &mut warnings);
                    block.clear();
                }
                block_start_line = idx + 2;
            } else {
                block.push(line);
            }
        }

        if entries.is_empty() {
            warn!("No valid subtitle entries found in content");
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        // Timeline order, then positional renumbering
        entries.sort_by_key(|entry| entry.start_time_ms);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        debug!("Parsed {} cues ({} blocks skipped)", entries.len(), warnings.len());
        Ok((entries, warnings))
    }

    /// Parse a single SRT block, pushing either an entry or a warning
    fn parse_block(
        block: &[&str],
        start_line: usize,
        entries: &mut Vec<SubtitleEntry>,
        warnings: &mut Vec<ParseWarning>,
    ) {
        let Some(timing_idx) = block.iter().position(|line| TIMING_REGEX.is_match(line)) else {
            warnings.push(ParseWarning {
                line: start_line,
                reason: "missing or unparsable timing line".to_string(),
            });
            return;
        };

        let caps = TIMING_REGEX.captures(block[timing_idx]).unwrap();
        let start_ms = Self::timestamp_from_captures(&caps, 1);
        let end_ms = Self::timestamp_from_captures(&caps, 5);

        if end_ms < start_ms {
            warnings.push(ParseWarning {
                line: start_line,
                reason: format!("inverted time range: {} ms > {} ms", start_ms, end_ms),
            });
            return;
        }

        let text = block[timing_idx + 1..].join("\n").trim().to_string();
        if text.is_empty() {
            warnings.push(ParseWarning {
                line: start_line,
                reason: "empty cue text".to_string(),
            });
            return;
        }

        // seq_num is assigned after sorting
        entries.push(SubtitleEntry::new(0, start_ms, end_ms, text));
    }

    /// Convert matched timestamp groups to milliseconds
    fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> u64 {
        let group = |i: usize| -> u64 {
            caps.get(start_idx + i)
                .map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };
        (group(0) * 3600 + group(1) * 60 + group(2)) * 1000 + group(3)
    }

    /// Serialize all entries back to SRT text
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.serialized_block(entry.seq_num));
        }
        out
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for entry in &self.entries {
            write!(file, "{}", entry)?;
        }

        Ok(())
    }

    /// Split cues into translation batches.
    ///
    /// Greedy packing: a batch closes when adding the next cue would exceed
    /// `max_entries` or `max_chars` (measured on the serialized SRT block).
    /// A single oversized cue still gets a batch of its own, so one huge cue
    /// can never stall the chunker. Batch boundaries never split a cue.
    pub fn split_into_batches(&self, max_entries: usize, max_chars: usize) -> Vec<Vec<SubtitleEntry>> {
        if self.entries.is_empty() {
            warn!("No subtitle entries to split into batches");
            return Vec::new();
        }

        let max_entries = max_entries.max(1);
        let total_entries = self.entries.len();

        let mut batches = Vec::new();
        let mut current: Vec<SubtitleEntry> = Vec::new();
        let mut current_chars = 0usize;

        for entry in &self.entries {
            let block_chars = entry.serialized_block(current.len() + 1).chars().count();

            if !current.is_empty()
                && (current.len() >= max_entries || current_chars + block_chars > max_chars)
            {
                batches.push(std::mem::take(&mut current));
                current_chars = 0;
            }

            if current.is_empty() && block_chars > max_chars {
                debug!(
                    "Cue {} is oversized ({} chars), placing it in its own batch",
                    entry.seq_num, block_chars
                );
            }

            current_chars += block_chars;
            current.push(entry.clone());
        }

        if !current.is_empty() {
            batches.push(current);
        }

        let batched_entries: usize = batches.iter().map(|batch| batch.len()).sum();
        if batched_entries != total_entries {
            warn!(
                "Lost entries during batching: {} before, {} after",
                total_entries, batched_entries
            );
        }

        batches
    }

    /// Merge consecutive cues in groups of `merge_count`.
    ///
    /// The merged cue spans from the first cue's start to the last cue's end;
    /// texts are joined with spaces (internal newlines flattened) and given a
    /// trailing terminator when none is present. This permanently reduces the
    /// timing granularity for the rest of the run; callers back up the cue
    /// file beforehand.
    pub fn compress(&mut self, merge_count: usize) {
        if merge_count <= 1 || self.entries.is_empty() {
            return;
        }

        let mut merged = Vec::with_capacity(self.entries.len().div_ceil(merge_count));
        for (i, group) in self.entries.chunks(merge_count).enumerate() {
            let joined: String = group
                .iter()
                .map(|entry| entry.text.replace('\n', " "))
                .collect::<Vec<_>>()
                .join(" ");
            let mut text = joined.split_whitespace().collect::<Vec<_>>().join(" ");

            if !text.ends_with(|c: char| SENTENCE_TERMINATORS.contains(&c)) {
                text.push('.');
            }

            merged.push(SubtitleEntry::new(
                i + 1,
                group[0].start_time_ms,
                group[group.len() - 1].end_time_ms,
                text,
            ));
        }

        debug!(
            "Compressed {} cues into {} (merge count {})",
            self.entries.len(),
            merged.len(),
            merge_count
        );
        self.entries = merged;
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.source_language)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
