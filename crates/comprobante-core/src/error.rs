//! Error types for the comprobante-core library.

use thiserror::Error;

/// Main error type for the comprobante library.
#[derive(Error, Debug)]
pub enum ComprobanteError {
    /// PDF rasterization error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Region segmentation error.
    #[error("segmentation error: {0}")]
    Segment(#[from] SegmentError),

    /// Field resolution error.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// OCR backend error.
    #[error("OCR error: {0}")]
    Ocr(#[from] comprobante_ocr::OcrError),

    /// Image decoding/encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The supplied source is neither a recognized image nor a PDF.
    /// Fails the whole invocation; nothing local can recover it.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Errors related to PDF page rasterization.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The pdfium library could not be bound.
    #[error("pdfium unavailable: {0}")]
    Backend(String),

    /// Failed to open or parse the document.
    #[error("failed to open PDF: {0}")]
    Open(String),

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page index requested.
    #[error("invalid page index: {0}")]
    InvalidPage(u32),

    /// Rendering a page failed.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
}

/// Errors related to region segmentation.
#[derive(Error, Debug)]
pub enum SegmentError {
    /// The page image has no pixels.
    #[error("empty page image")]
    EmptyPage,
}

/// Errors related to field resolution.
#[derive(Error, Debug)]
pub enum FieldError {
    /// A computed region of interest has zero area. Local: resolution
    /// falls through to the fallback identifier, never to the caller.
    #[error("empty region of interest")]
    EmptyRegion,
}

/// Result type for the comprobante library.
pub type Result<T> = std::result::Result<T, ComprobanteError>;
