//! pdfium-backed rasterizer.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{PageRasterizer, Result};
use crate::error::PdfError;

/// Rasterizer backed by the pdfium library.
///
/// Document handles borrow the library binding, so the document is
/// reloaded from the owned byte buffer per call rather than cached.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    data: Vec<u8>,
}

impl PdfiumRasterizer {
    /// Bind the pdfium library and take ownership of the document bytes.
    ///
    /// Open failures abort the whole invocation; there is nothing a page
    /// loop could do with an unreadable document.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfError::Backend(e.to_string()))?;
        let pdfium = Pdfium::new(bindings);

        let rasterizer = Self { pdfium, data };
        let pages = rasterizer.page_count()?;
        if pages == 0 {
            return Err(PdfError::NoPages);
        }
        debug!(pages, "PDF opened");
        Ok(rasterizer)
    }

    /// Read a PDF file from disk.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Open(e.to_string()))?;
        Self::from_bytes(data)
    }

    fn document(&self) -> Result<PdfDocument<'_>> {
        self.pdfium
            .load_pdf_from_byte_slice(&self.data, None)
            .map_err(|e| PdfError::Open(e.to_string()))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self) -> Result<u32> {
        Ok(self.document()?.pages().len() as u32)
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<DynamicImage> {
        let document = self.document()?;
        let pages = document.pages();
        if index >= pages.len() as u32 {
            return Err(PdfError::InvalidPage(index));
        }
        let page = pages.get(index as u16).map_err(|e| PdfError::Render {
            page: index,
            reason: e.to_string(),
        })?;

        let width = (page.width().value * scale) as i32;
        let height = (page.height().value * scale) as i32;
        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|e| PdfError::Render {
                page: index,
                reason: e.to_string(),
            })?;

        Ok(bitmap.as_image())
    }
}
