use std::time::Duration;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::{debug, error};

use crate::errors::ProviderError;
use crate::providers::{SpeechProvider, SynthesizedAudio};

/// Default public API endpoint
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini streaming TTS client.
///
/// Speech comes back as a stream of chunks, each carrying a base64 inline
/// payload and a MIME type describing the raw PCM format. The client
/// concatenates the payloads; container assembly happens downstream.
#[derive(Debug)]
pub struct GeminiTts {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
}

/// Speech generation request
#[derive(Debug, Serialize)]
struct TtsRequest {
    contents: Vec<TtsContent>,

    #[serde(rename = "generationConfig")]
    generation_config: TtsGenerationConfig,
}

#[derive(Debug, Serialize)]
struct TtsContent {
    role: String,
    parts: Vec<TtsPart>,
}

#[derive(Debug, Serialize)]
struct TtsPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct TtsGenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,

    #[serde(rename = "speechConfig")]
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

/// One chunk of the streamed response
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<StreamCandidate>,
}

#[derive(Debug, Deserialize)]
struct StreamCandidate {
    content: Option<StreamContent>,
}

#[derive(Debug, Deserialize)]
struct StreamContent {
    #[serde(default)]
    parts: Vec<StreamPart>,
}

#[derive(Debug, Deserialize)]
struct StreamPart {
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

impl GeminiTts {
    /// Create a new Gemini TTS client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn build_request(text: &str, voice: &str, style: Option<&str>) -> TtsRequest {
        // A style prompt rides in front of the cue text when configured
        let input = match style {
            Some(style) if !style.trim().is_empty() => format!("{}\n\n{}", style.trim(), text),
            _ => text.to_string(),
        };

        TtsRequest {
            contents: vec![TtsContent {
                role: "user".to_string(),
                parts: vec![TtsPart { text: input }],
            }],
            generation_config: TtsGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                },
            },
        }
    }
}

#[async_trait]
impl SpeechProvider for GeminiTts {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        model: &str,
        style: Option<&str>,
    ) -> Result<SynthesizedAudio, ProviderError> {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        let api_url = format!("{}/models/{}:streamGenerateContent", base, model);

        let request = Self::build_request(text, voice, style);

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to Gemini TTS API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini TTS API error ({}): {}", status, error_text);
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimitExceeded(error_text));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read Gemini TTS response: {}", e)))?;

        // The streaming endpoint delivers a JSON array of chunk objects
        let chunks: Vec<StreamChunk> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini TTS stream: {}", e)))?;

        let mut data = Vec::new();
        let mut mime_type = String::new();

        for chunk in &chunks {
            for candidate in &chunk.candidates {
                let Some(content) = &candidate.content else { continue };
                for part in &content.parts {
                    let Some(inline) = &part.inline_data else { continue };
                    let decoded = BASE64.decode(&inline.data)
                        .map_err(|e| ProviderError::ParseError(format!("Invalid base64 audio payload: {}", e)))?;
                    data.extend_from_slice(&decoded);
                    if mime_type.is_empty() {
                        mime_type = inline.mime_type.clone();
                    }
                }
            }
        }

        if data.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        debug!("Accumulated {} audio bytes ({}) from {} stream chunks", data.len(), mime_type, chunks.len());
        Ok(SynthesizedAudio { data, mime_type })
    }
}
