/*!
 * Mock provider implementations for testing
 *
 * These stubs stand in for the external translation and speech services so
 * tests never make network calls. Translators operate on the serialized
 * block format exactly like the real provider would.
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dubwai::errors::ProviderError;
use dubwai::providers::{SpeechProvider, SynthesizedAudio, TranslationProvider, TranslationRequest};
use dubwai::subtitle_processor::SubtitleCollection;

/// Translator stub that echoes every cue back with a text prefix
#[derive(Debug)]
pub struct EchoTranslator {
    /// Prefix prepended to every cue text
    pub prefix: String,
}

impl EchoTranslator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

#[async_trait]
impl TranslationProvider for EchoTranslator {
    async fn translate_block(&self, request: TranslationRequest<'_>) -> Result<String, ProviderError> {
        let (cues, _) = SubtitleCollection::parse_srt_string(request.block)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let mut reply = String::new();
        for cue in &cues {
            let mut translated = cue.clone();
            translated.text = format!("{}{}", self.prefix, cue.text);
            reply.push_str(&translated.serialized_block(cue.seq_num));
        }
        Ok(reply)
    }
}

/// Translator stub that returns only the first `keep` cues of each batch
#[derive(Debug)]
pub struct TruncatingTranslator {
    /// How many cues of each batch survive
    pub keep: usize,
}

#[async_trait]
impl TranslationProvider for TruncatingTranslator {
    async fn translate_block(&self, request: TranslationRequest<'_>) -> Result<String, ProviderError> {
        let (cues, _) = SubtitleCollection::parse_srt_string(request.block)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let mut reply = String::new();
        for cue in cues.iter().take(self.keep) {
            let mut translated = cue.clone();
            translated.text = format!("[T] {}", cue.text);
            reply.push_str(&translated.serialized_block(cue.seq_num));
        }
        Ok(reply)
    }
}

/// Translator stub that always fails, counting the attempts it saw
#[derive(Debug, Default)]
pub struct FailingTranslator {
    /// Number of calls received
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranslationProvider for FailingTranslator {
    async fn translate_block(&self, _request: TranslationRequest<'_>) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::RequestFailed("mock translator is down".to_string()))
    }
}

/// Speech stub returning a fixed-duration mono 16-bit clip
#[derive(Debug)]
pub struct FixedClipSpeech {
    /// Duration of every returned clip
    pub duration_ms: u64,
    /// Declared sample rate
    pub sample_rate: u32,
}

#[async_trait]
impl SpeechProvider for FixedClipSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _model: &str,
        _style: Option<&str>,
    ) -> Result<SynthesizedAudio, ProviderError> {
        let samples = (self.duration_ms * self.sample_rate as u64 / 1000) as usize;

        // A quiet square wave so the payload is audibly non-silent
        let mut data = Vec::with_capacity(samples * 2);
        for i in 0..samples {
            let value: i16 = if (i / 64) % 2 == 0 { 2000 } else { -2000 };
            data.extend_from_slice(&value.to_le_bytes());
        }

        Ok(SynthesizedAudio {
            data,
            mime_type: format!("audio/L16;codec=pcm;rate={}", self.sample_rate),
        })
    }
}

/// Speech stub that always fails, counting the attempts it saw
#[derive(Debug, Default)]
pub struct FailingSpeech {
    /// Number of calls received
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SpeechProvider for FailingSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _model: &str,
        _style: Option<&str>,
    ) -> Result<SynthesizedAudio, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::RequestFailed("mock speech service is down".to_string()))
    }
}
