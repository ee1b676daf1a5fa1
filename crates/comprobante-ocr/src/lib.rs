//! OCR engine abstraction layer for comprobante.
//!
//! This crate provides a unified interface for recognizing text from
//! binarized receipt regions:
//! - `tesseract` feature: Tesseract via leptess on native platforms
//! - [`NullBackend`] when no engine is installed (resolution degrades to
//!   positional fallback identifiers)
//!
//! Exactly one backend is active per pipeline; it is injected by the
//! caller, never read from process-global state.

mod backend;
mod config;
mod error;

pub use backend::{NullBackend, OcrBackend};
pub use config::{documento_configs, valor_configs, RecognitionConfig, FINANCIAL_WHITELIST};
pub use error::OcrError;

#[cfg(feature = "tesseract")]
pub use backend::tesseract::TesseractBackend;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;
