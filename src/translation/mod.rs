/*!
 * Cue translation: batching, provider calls with model fallback, and
 * positional realignment of the replies.
 */

pub mod core;

// Re-export main types
pub use core::{TranslationService, TranslationReport};
