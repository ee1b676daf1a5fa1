//! Tesseract backend via leptess.

use image::GrayImage;
use leptess::{LepTess, Variable};
use tracing::trace;

use crate::{OcrBackend, OcrError, RecognitionConfig, Result};

/// Tesseract OCR backend.
///
/// The engine handle is created once and reused across calls. Tesseract
/// handles are not shareable between threads; the pipeline guards the
/// backend with a mutex.
pub struct TesseractBackend {
    engine: LepTess,
}

impl TesseractBackend {
    /// Spanish + English, matching the receipt layouts this targets.
    pub const DEFAULT_LANGUAGES: &'static str = "spa+eng";

    /// Create a backend using the system traineddata location.
    pub fn new() -> Result<Self> {
        Self::with_languages(Self::DEFAULT_LANGUAGES)
    }

    /// Create a backend for specific languages (e.g. `"eng"`).
    pub fn with_languages(languages: &str) -> Result<Self> {
        let engine = LepTess::new(None, languages)
            .map_err(|e| OcrError::Unavailable(format!("tesseract init ({languages}): {e}")))?;
        Ok(Self { engine })
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&mut self, image: &GrayImage, config: &RecognitionConfig) -> Result<String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("zero-area image".to_string()));
        }

        self.engine
            .set_variable(
                Variable::TesseditPagesegMode,
                &config.page_seg_mode.to_string(),
            )
            .map_err(|e| OcrError::Recognition(format!("psm {}: {e}", config.page_seg_mode)))?;
        // An empty whitelist clears any restriction left by a prior call.
        self.engine
            .set_variable(
                Variable::TesseditCharWhitelist,
                config.char_whitelist.unwrap_or(""),
            )
            .map_err(|e| OcrError::Recognition(format!("whitelist: {e}")))?;

        // leptess takes image data in an encoded container format.
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        self.engine
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::Recognition(format!("set image: {e}")))?;
        self.engine.set_source_resolution(300);

        let text = self
            .engine
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("{}: {e}", config.name)))?;
        trace!(config = config.name, chars = text.len(), "tesseract pass");
        Ok(text)
    }
}
