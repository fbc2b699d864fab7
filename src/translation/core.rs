/*!
 * Core translation service implementation.
 *
 * Serializes cue batches with batch-local indices, calls the provider with
 * an ordered fallback-model list, and realigns the replies positionally.
 * Partial or failed replies degrade to source-language text; translation
 * never aborts the run.
 */

use anyhow::Result;
use log::{warn, debug};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::language_utils;
use crate::providers::gemini::Gemini;
use crate::providers::{TranslationProvider, TranslationRequest};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

/// Outcome counters for one translation pass
#[derive(Debug, Default, Clone)]
pub struct TranslationReport {
    /// Cues whose text was replaced by a translation
    pub translated: usize,

    /// Cues that kept their source-language text
    pub untranslated: usize,

    /// Batches whose reply contained fewer cues than were sent
    pub shortfall_batches: usize,

    /// Batches where every model attempt failed
    pub failed_batches: usize,
}

/// Main translation service for cue batches
pub struct TranslationService {
    /// Provider implementation
    provider: Box<dyn TranslationProvider>,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Self {
        let provider = Box::new(Gemini::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.timeout_secs,
            config.temperature,
        ));
        Self { provider, config }
    }

    /// Create a service over an explicit provider (used by tests)
    pub fn with_provider(provider: Box<dyn TranslationProvider>, config: TranslationConfig) -> Self {
        Self { provider, config }
    }

    /// Serialize a batch to the provider's block format with local 1-based indices
    pub fn serialize_batch(batch: &[SubtitleEntry]) -> String {
        let mut block = String::new();
        for (i, entry) in batch.iter().enumerate() {
            block.push_str(&entry.serialized_block(i + 1));
        }
        block
    }

    /// Pair a reply's cues to the source batch by position.
    ///
    /// The reply is re-parsed with the cue regex; timing and global index
    /// always come from the source cue, and the translator's own numbering
    /// is discarded. Only the first `min(M, N)` pairs are used; the tail
    /// keeps its source text. Returns the full-length batch plus how many
    /// cues actually got a translation.
    pub fn align_batch(batch: &[SubtitleEntry], reply: &str) -> (Vec<SubtitleEntry>, usize) {
        let parsed = match SubtitleCollection::parse_srt_string(reply) {
            Ok((cues, _)) => cues,
            Err(_) => Vec::new(),
        };

        let aligned = parsed.len().min(batch.len());
        let mut result = Vec::with_capacity(batch.len());
        for (i, source) in batch.iter().enumerate() {
            let mut entry = source.clone();
            if i < aligned {
                entry.text = parsed[i].text.clone();
            }
            result.push(entry);
        }
        (result, aligned)
    }

    /// Translate a whole collection, batch by batch, in order.
    ///
    /// `progress` is called with (completed, total) after each batch.
    pub async fn translate_collection(
        &self,
        collection: &SubtitleCollection,
        target_language: &str,
        progress: impl Fn(usize, usize),
    ) -> Result<(Vec<SubtitleEntry>, TranslationReport)> {
        let batches = collection.split_into_batches(
            self.config.max_entries_per_batch,
            self.config.max_chars_per_batch,
        );

        let system_prompt = self.build_system_prompt(&collection.source_language, target_language);

        let mut entries = Vec::with_capacity(collection.entries.len());
        let mut report = TranslationReport::default();
        let total_batches = batches.len();

        for (batch_index, batch) in batches.iter().enumerate() {
            let block = Self::serialize_batch(batch);

            match self.translate_block_with_fallback(&block, &system_prompt).await {
                Some(reply) => {
                    let (aligned_entries, aligned) = Self::align_batch(batch, &reply);
                    if aligned < batch.len() {
                        warn!(
                            "Batch {} translated {}/{} cues; the rest keep source text",
                            batch_index + 1,
                            aligned,
                            batch.len()
                        );
                        report.shortfall_batches += 1;
                    }
                    report.translated += aligned;
                    report.untranslated += batch.len() - aligned;
                    entries.extend(aligned_entries);
                }
                None => {
                    // Every model failed; carry the source text forward
                    warn!("Batch {} failed on all models; keeping source text", batch_index + 1);
                    report.failed_batches += 1;
                    report.untranslated += batch.len();
                    entries.extend(batch.iter().cloned());
                }
            }

            progress(batch_index + 1, total_batches);

            // Fixed pacing against the external rate limit
            if batch_index + 1 < total_batches {
                tokio::time::sleep(Duration::from_millis(self.config.inter_batch_delay_ms)).await;
            }
        }

        debug!(
            "Translation finished: {} translated, {} untranslated",
            report.translated, report.untranslated
        );
        Ok((entries, report))
    }

    /// Try the primary model, then each fallback in order.
    ///
    /// Returns the first successful reply, or None when every model raised.
    async fn translate_block_with_fallback(&self, block: &str, system_prompt: &str) -> Option<String> {
        let models = std::iter::once(self.config.model.as_str())
            .chain(self.config.fallback_models.iter().map(|m| m.as_str()));
        let model_count = 1 + self.config.fallback_models.len();

        for (i, model) in models.enumerate() {
            let request = TranslationRequest {
                block,
                system_prompt,
                model,
            };

            match self.provider.translate_block(request).await {
                Ok(reply) => return Some(reply),
                Err(e) => {
                    warn!("Translation with model {} failed: {}", model, e);
                    if i + 1 < model_count {
                        tokio::time::sleep(Duration::from_millis(self.config.model_retry_delay_ms)).await;
                    }
                }
            }
        }
        None
    }

    /// Substitute language names into the configured prompt template
    fn build_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let source_name = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        self.config
            .system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name)
    }
}
