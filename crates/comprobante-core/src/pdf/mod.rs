//! PDF page rasterization boundary.

#[cfg(feature = "pdf")]
mod pdfium;

#[cfg(feature = "pdf")]
pub use pdfium::PdfiumRasterizer;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Renders document pages to raster images.
///
/// The pipeline needs exactly two capabilities from a PDF collaborator:
/// how many pages there are, and a raster of page `index` (0-based) at
/// `scale` multiples of 72 dpi.
pub trait PageRasterizer {
    /// Number of pages in the document.
    fn page_count(&self) -> Result<u32>;

    /// Render one page to an image.
    fn render_page(&self, index: u32, scale: f32) -> Result<DynamicImage>;
}
