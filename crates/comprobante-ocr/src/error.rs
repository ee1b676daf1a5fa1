//! Error types for the OCR abstraction layer.

use thiserror::Error;

/// Errors raised by OCR backends.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No usable engine (missing library or traineddata). Callers skip
    /// the remaining recognition attempts and degrade to fallback
    /// identifiers instead of failing the pipeline.
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// A single recognition call failed; the next configuration in the
    /// cascade is tried.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The supplied image cannot be handed to the engine.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}
