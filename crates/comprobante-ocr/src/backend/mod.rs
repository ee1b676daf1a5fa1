//! OCR backend implementations.

#[cfg(feature = "tesseract")]
pub mod tesseract;

use image::GrayImage;

use crate::{OcrError, RecognitionConfig, Result};

/// Trait for OCR engines.
///
/// This trait abstracts over recognition engines so the pipeline can be
/// driven by a real engine in production and by deterministic stubs in
/// tests. Engines are treated as exclusive-access resources: methods take
/// `&mut self` and callers serialize access when sharing a handle.
pub trait OcrBackend: Send {
    /// Engine name for logs.
    fn name(&self) -> &'static str;

    /// Recognize text from a preprocessed (binarized) grayscale image.
    ///
    /// Returns best-effort plain text; an empty string is a valid result.
    fn recognize(&mut self, image: &GrayImage, config: &RecognitionConfig) -> Result<String>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(&mut self, image: &GrayImage, config: &RecognitionConfig) -> Result<String> {
        (**self).recognize(image, config)
    }
}

/// Backend used when no engine is installed. Every call reports
/// [`OcrError::Unavailable`], which callers turn into fallback behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl OcrBackend for NullBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn recognize(&mut self, _image: &GrayImage, _config: &RecognitionConfig) -> Result<String> {
        Err(OcrError::Unavailable("no OCR engine configured".to_string()))
    }
}
