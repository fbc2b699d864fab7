/*!
 * Provider clients for the external translation and speech services.
 *
 * This module contains the client implementations the pipeline calls out to:
 * - Gemini: text generation used for cue translation
 * - Gemini TTS: streaming speech synthesis
 *
 * The traits keep the pipeline testable against stub providers.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One translation call over a serialized cue block
#[derive(Debug, Clone)]
pub struct TranslationRequest<'a> {
    /// Serialized SRT block with batch-local indices
    pub block: &'a str,

    /// System prompt with languages already substituted
    pub system_prompt: &'a str,

    /// Model identifier to use for this attempt
    pub model: &'a str,
}

/// Raw synthesis result: accumulated audio chunks plus the declared MIME type.
///
/// The MIME type encodes the PCM parameters (e.g. `audio/L16;codec=pcm;rate=24000`);
/// the synthesis adapter parses it to build a playable container.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Concatenated raw audio payload
    pub data: Vec<u8>,

    /// MIME type reported by the provider
    pub mime_type: String,
}

/// Common trait for cue translation providers
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Translate a serialized cue block, returning the reply text.
    ///
    /// The reply is expected in the same block format; the caller re-parses
    /// and realigns it, so a malformed reply degrades rather than fails.
    async fn translate_block(&self, request: TranslationRequest<'_>) -> Result<String, ProviderError>;
}

/// Common trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    /// Synthesize speech for one cue's text
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        model: &str,
        style: Option<&str>,
    ) -> Result<SynthesizedAudio, ProviderError>;
}

pub mod gemini;
pub mod gemini_tts;
