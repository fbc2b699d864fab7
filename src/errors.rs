/*!
 * Error types for the dubwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to translation or speech provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider answered but delivered no usable payload
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Stage-level errors of the dubbing pipeline.
///
/// Per-cue synthesis and retiming failures are recovered with silence or
/// raw-clip substitutes; only `Parse` and `Mux` abort a whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No valid cues were recognized in the subtitle input
    #[error("no valid subtitle cues found in input")]
    Parse,

    /// Speech synthesis failed for one cue after the retry budget
    #[error("speech synthesis failed for cue {cue}: {message}")]
    Synthesis { cue: usize, message: String },

    /// The tempo-change tool failed for one cue
    #[error("retiming failed for cue {cue}: {message}")]
    Retime { cue: usize, message: String },

    /// Building the assembled audio track failed
    #[error("timeline assembly failed: {0}")]
    Assembly(String),

    /// The final remux against the source video failed
    #[error("final mux failed: {0}")]
    Mux(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a pipeline stage
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
