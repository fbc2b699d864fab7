/*!
 * # dubwai - Dubbing With AI
 *
 * A Rust library for producing dubbed videos from subtitled sources.
 *
 * ## Features
 *
 * - Parse SRT cue files with per-block skip diagnostics
 * - Translate cues in bounded batches with fallback models
 * - Optionally merge consecutive cues to reduce API request volume
 * - Synthesize per-cue speech with retry and pacing policies
 * - Retime each clip to its cue window within a safe tempo range
 * - Assemble a single audio timeline and remux it against the source video
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Cue parsing, batching and compression
 * - `translation`: Batch translation with positional realignment
 * - `synthesis`: Per-cue speech synthesis and WAV container assembly
 * - `retiming`: Tempo clamping and silence fallback sizing
 * - `timeline`: Base track construction and additive overlay
 * - `media`: ffmpeg/ffprobe subprocess wrappers
 * - `session`: Run identity and working-directory layout
 * - `app_controller`: Main application controller
 * - `providers`: Clients for the translation and speech services
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod providers;
pub mod retiming;
pub mod session;
pub mod subtitle_processor;
pub mod synthesis;
pub mod timeline;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use session::SessionContext;
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry, ParseWarning};
pub use synthesis::SpeechSynthesizer;
pub use timeline::TimelineAssembler;
pub use translation::{TranslationService, TranslationReport};
pub use errors::{AppError, PipelineError, ProviderError};
