//! Core library for comprobante (receipt) extraction.
//!
//! This crate provides:
//! - Contour-based segmentation of receipt regions in scanned pages
//! - OCR-driven resolution of document numbers and monetary values
//! - PDF page rasterization behind a trait boundary
//! - Result assembly with stable per-page numbering

pub mod error;
pub mod fields;
pub mod imgproc;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod segment;

pub use error::{ComprobanteError, FieldError, PdfError, Result, SegmentError};
pub use models::comprobante::{
    BoundingBox, Comprobante, PageArtifacts, PageReport, PipelineResult,
};
pub use models::config::{DetectionParams, PdfConfig, PipelineConfig};
pub use pdf::PageRasterizer;
pub use pipeline::Pipeline;
pub use segment::{CandidateRegion, RegionDetector};

#[cfg(feature = "pdf")]
pub use pdf::PdfiumRasterizer;

/// Re-export the OCR abstraction types.
pub use comprobante_ocr::{NullBackend, OcrBackend, OcrError, RecognitionConfig};
