//! Pipeline orchestration: rasterize, segment, resolve, assemble.
//!
//! Pages are processed one at a time with no cross-page state. Per-page
//! and per-region failures degrade (zero regions, fallback identifiers,
//! absent values); only input-validity and resource-acquisition failures
//! reach the caller as errors.

use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info, warn};

use comprobante_ocr::{valor_configs, OcrBackend, OcrError};

use crate::error::Result;
use crate::fields::{documento, valor};
use crate::imgproc::preprocess;
use crate::models::comprobante::{Comprobante, PageArtifacts, PageReport, PipelineResult};
use crate::models::config::PipelineConfig;
use crate::pdf::PageRasterizer;
use crate::segment::RegionDetector;

/// Horizontal start of the page totals zone used as value fallback
/// context, relative to page width.
const VALOR_ZONE_LEFT: f64 = 0.35;
/// Vertical start of the page totals zone, relative to page height.
const VALOR_ZONE_TOP: f64 = 0.65;

/// Receipt extraction pipeline.
///
/// The OCR backend is injected, not read from global state, and sits
/// behind a mutex: engines are an exclusive-access resource, so `&self`
/// processing serializes recognition.
pub struct Pipeline<B: OcrBackend> {
    detector: RegionDetector,
    ocr: Mutex<B>,
    config: PipelineConfig,
}

impl<B: OcrBackend> Pipeline<B> {
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        debug!(backend = backend.name(), "pipeline ready");
        let detector = RegionDetector::new(config.detection.clone()).with_debug(config.debug);
        Self {
            detector,
            ocr: Mutex::new(backend),
            config,
        }
    }

    /// Process a single decoded page image.
    pub fn process_image(&self, image: &DynamicImage) -> Result<PipelineResult> {
        let start = Instant::now();
        let (report, artifacts) = self.process_page(image, 1);
        Ok(PipelineResult::new(
            vec![report],
            artifacts.into_iter().collect(),
            start.elapsed(),
        ))
    }

    /// Process every page of a rasterizable document, in order. Each page
    /// is fully processed before the next.
    pub fn process_document(&self, source: &dyn PageRasterizer) -> Result<PipelineResult> {
        let start = Instant::now();
        let pages = source.page_count()?;
        let limit = if self.config.pdf.max_pages == 0 {
            pages
        } else {
            pages.min(self.config.pdf.max_pages)
        };
        info!(pages, limit, "processing document");

        let mut reports = Vec::with_capacity(limit as usize);
        let mut artifacts = Vec::new();
        for index in 0..limit {
            let page_no = index + 1;
            match source.render_page(index, self.config.pdf.render_scale) {
                Ok(image) => {
                    let (report, page_artifacts) = self.process_page(&image, page_no);
                    reports.push(report);
                    artifacts.extend(page_artifacts);
                }
                Err(e) => {
                    warn!(page = page_no, "page render failed: {e}");
                    reports.push(PageReport {
                        page: page_no,
                        comprobantes: Vec::new(),
                        warnings: vec![format!("render failed: {e}")],
                    });
                }
            }
        }
        Ok(PipelineResult::new(reports, artifacts, start.elapsed()))
    }

    /// Detect and resolve every region of one page. Failures stay inside
    /// the page: a broken page contributes zero regions, never an error.
    fn process_page(
        &self,
        image: &DynamicImage,
        page_no: u32,
    ) -> (PageReport, Option<PageArtifacts>) {
        let segmentation = match self.detector.detect(image) {
            Ok(segmentation) => segmentation,
            Err(e) => {
                warn!(page = page_no, "segmentation failed: {e}");
                return (
                    PageReport {
                        page: page_no,
                        comprobantes: Vec::new(),
                        warnings: vec![format!("segmentation failed: {e}")],
                    },
                    None,
                );
            }
        };

        let mut warnings = Vec::new();
        if segmentation.candidates.is_empty() {
            warnings.push(format!("no comprobantes detected on page {page_no}"));
        }

        // Page-level value context, computed at most once per page.
        let mut page_valor: Option<Option<String>> = None;

        let mut comprobantes = Vec::with_capacity(segmentation.candidates.len());
        let mut ocr = self.ocr.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (index, candidate) in segmentation.candidates.iter().enumerate() {
            let id = (index + 1) as u32;
            let bounds = candidate.bounds;
            let crop = image.crop_imm(bounds.x, bounds.y, bounds.width, bounds.height);

            let documento_id = documento::resolve(&crop, page_no, id, &mut *ocr);

            let canonical = self.crop_valor(&crop, &mut *ocr).or_else(|| {
                page_valor
                    .get_or_insert_with(|| self.page_valor(image, &mut *ocr))
                    .clone()
            });
            let valor = canonical.as_deref().and_then(valor::to_decimal);

            debug!(page = page_no, id, documento = %documento_id, ?valor, "comprobante resolved");
            comprobantes.push(Comprobante {
                id,
                page: page_no,
                documento_id,
                coordinates: bounds,
                area: bounds.area(),
                valor,
                crop,
            });
        }
        drop(ocr);

        info!(page = page_no, count = comprobantes.len(), "page processed");
        let artifacts = segmentation.debug.map(|segmentation| PageArtifacts {
            page: page_no,
            segmentation,
        });
        (
            PageReport {
                page: page_no,
                comprobantes,
                warnings,
            },
            artifacts,
        )
    }

    /// Search the crop's own OCR text for a value.
    fn crop_valor(&self, crop: &DynamicImage, ocr: &mut B) -> Option<String> {
        let binary = preprocess::enhance(&crop.to_luma8()).ok()?;
        self.valor_from_ocr(&binary, ocr)
    }

    /// Search the page totals zone (lower right), the fallback context
    /// when a crop shows no value of its own.
    fn page_valor(&self, page: &DynamicImage, ocr: &mut B) -> Option<String> {
        let gray = page.to_luma8();
        let (width, height) = gray.dimensions();
        let x0 = (width as f64 * VALOR_ZONE_LEFT) as u32;
        let y0 = (height as f64 * VALOR_ZONE_TOP) as u32;
        if x0 >= width || y0 >= height {
            return None;
        }
        let zone = image::imageops::crop_imm(&gray, x0, y0, width - x0, height - y0).to_image();
        let binary = preprocess::enhance(&zone).ok()?;
        self.valor_from_ocr(&binary, ocr)
    }

    /// Run the recognition cascade until one configuration's text yields
    /// a value.
    fn valor_from_ocr(&self, binary: &GrayImage, ocr: &mut B) -> Option<String> {
        for config in valor_configs() {
            match ocr.recognize(binary, &config) {
                Ok(text) => {
                    if let Some(canonical) = valor::find_valor(&text) {
                        return Some(canonical);
                    }
                }
                Err(OcrError::Unavailable(_)) => return None,
                Err(e) => warn!(config = config.name, "OCR attempt failed: {e}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::PdfError;
    use crate::models::config::DetectionParams;
    use comprobante_ocr::RecognitionConfig;

    /// Returns empty text for every attempt.
    struct SilentBackend;

    impl OcrBackend for SilentBackend {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn recognize(
            &mut self,
            _image: &GrayImage,
            _config: &RecognitionConfig,
        ) -> comprobante_ocr::Result<String> {
            Ok(String::new())
        }
    }

    /// Pops one scripted response per recognition call.
    struct ScriptedBackend {
        responses: VecDeque<String>,
    }

    impl ScriptedBackend {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: responses.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl OcrBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn recognize(
            &mut self,
            _image: &GrayImage,
            _config: &RecognitionConfig,
        ) -> comprobante_ocr::Result<String> {
            Ok(self.responses.pop_front().unwrap_or_default())
        }
    }

    /// In-memory rasterizer with optional per-page failures.
    struct FakeRasterizer {
        pages: Vec<DynamicImage>,
        fail_page: Option<u32>,
    }

    impl PageRasterizer for FakeRasterizer {
        fn page_count(&self) -> crate::pdf::Result<u32> {
            Ok(self.pages.len() as u32)
        }

        fn render_page(&self, index: u32, _scale: f32) -> crate::pdf::Result<DynamicImage> {
            if self.fail_page == Some(index) {
                return Err(PdfError::Render {
                    page: index,
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(self.pages[index as usize].clone())
        }
    }

    fn paint_receipt(image: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                if (x - x0) % 8 < 4 {
                    image.put_pixel(x, y, Rgb([20, 20, 20]));
                }
            }
        }
    }

    fn three_receipt_page() -> DynamicImage {
        let mut page = RgbImage::from_pixel(800, 1000, Rgb([255, 255, 255]));
        paint_receipt(&mut page, 100, 80, 240, 160);
        paint_receipt(&mut page, 450, 300, 240, 160);
        paint_receipt(&mut page, 100, 650, 240, 160);
        DynamicImage::ImageRgb8(page)
    }

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([255, 255, 255])))
    }

    fn config(min_area: u32) -> PipelineConfig {
        PipelineConfig {
            detection: DetectionParams {
                min_area,
                ..DetectionParams::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn empty_ocr_yields_positional_fallback_ids() {
        let pipeline = Pipeline::new(SilentBackend, config(50_000));
        let result = pipeline.process_image(&three_receipt_page()).unwrap();

        let ids: Vec<&str> = result
            .comprobantes()
            .map(|c| c.documento_id.as_str())
            .collect();
        assert_eq!(ids, vec!["PAG01_COMP01", "PAG01_COMP02", "PAG01_COMP03"]);
        assert!(result.comprobantes().all(|c| c.valor.is_none()));
    }

    #[test]
    fn scripted_ocr_resolves_fields_in_reading_order() {
        // Each region consumes one documento pass and one valor pass.
        let backend = ScriptedBackend::new(&[
            "Documento: 000111222333",
            "NETO $ 1.000.000,00",
            "Documento: 000444555666",
            "NETO $ 2.000.000,50",
            "Documento: 000777888999",
            "NETO $ 3.000.000,99",
        ]);
        let pipeline = Pipeline::new(backend, config(50_000));
        let result = pipeline.process_image(&three_receipt_page()).unwrap();

        assert_eq!(result.total_comprobantes, 3);
        let records: Vec<_> = result.comprobantes().collect();
        assert_eq!(records[0].documento_id, "111222333");
        assert_eq!(records[1].documento_id, "444555666");
        assert_eq!(records[2].documento_id, "777888999");
        assert_eq!(records[0].valor.unwrap().to_string(), "1000000.00");
        assert_eq!(records[2].valor.unwrap().to_string(), "3000000.99");

        // Reading order and in-bounds boxes.
        assert!(records[0].coordinates.y < records[1].coordinates.y);
        assert!(records[1].coordinates.y < records[2].coordinates.y);
        for record in &records {
            assert!(record.coordinates.right() <= 800);
            assert!(record.coordinates.bottom() <= 1000);
            assert_eq!(record.area, record.coordinates.area());
            assert_eq!(record.page, 1);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let run = || {
            let pipeline = Pipeline::new(SilentBackend, config(50_000));
            let result = pipeline.process_image(&three_receipt_page()).unwrap();
            result
                .comprobantes()
                .map(|c| (c.documento_id.clone(), c.coordinates, c.id))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn empty_page_is_a_warning_not_an_error() {
        let pipeline = Pipeline::new(SilentBackend, config(5000));
        let result = pipeline.process_image(&blank_page()).unwrap();
        assert_eq!(result.total_comprobantes, 0);
        assert_eq!(result.pages.len(), 1);
        assert!(!result.pages[0].warnings.is_empty());
    }

    #[test]
    fn ids_restart_on_every_page() {
        let source = FakeRasterizer {
            pages: vec![three_receipt_page(), three_receipt_page()],
            fail_page: None,
        };
        let pipeline = Pipeline::new(SilentBackend, config(50_000));
        let result = pipeline.process_document(&source).unwrap();

        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.total_comprobantes, 6);
        let ids: Vec<&str> = result
            .comprobantes()
            .map(|c| c.documento_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "PAG01_COMP01",
                "PAG01_COMP02",
                "PAG01_COMP03",
                "PAG02_COMP01",
                "PAG02_COMP02",
                "PAG02_COMP03",
            ]
        );
        for page in &result.pages {
            let local: Vec<u32> = page.comprobantes.iter().map(|c| c.id).collect();
            assert_eq!(local, vec![1, 2, 3]);
        }
    }

    #[test]
    fn a_failing_page_does_not_abort_the_document() {
        let source = FakeRasterizer {
            pages: vec![three_receipt_page(), blank_page(), three_receipt_page()],
            fail_page: Some(1),
        };
        let pipeline = Pipeline::new(SilentBackend, config(50_000));
        let result = pipeline.process_document(&source).unwrap();

        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.pages[1].comprobantes.len(), 0);
        assert!(result.pages[1].warnings[0].contains("render failed"));
        assert_eq!(result.pages[0].comprobantes.len(), 3);
        assert_eq!(result.pages[2].comprobantes.len(), 3);
    }

    #[test]
    fn max_pages_truncates_the_document() {
        let source = FakeRasterizer {
            pages: vec![blank_page(), blank_page(), blank_page()],
            fail_page: None,
        };
        let mut cfg = config(5000);
        cfg.pdf.max_pages = 2;
        let pipeline = Pipeline::new(SilentBackend, cfg);
        let result = pipeline.process_document(&source).unwrap();
        assert_eq!(result.pages.len(), 2);
    }

    #[test]
    fn debug_mode_captures_page_artifacts() {
        let mut cfg = config(50_000);
        cfg.debug = true;
        let pipeline = Pipeline::new(SilentBackend, cfg);
        let result = pipeline.process_image(&three_receipt_page()).unwrap();
        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.artifacts[0].page, 1);
        assert_eq!(
            result.artifacts[0].segmentation.thresholded.dimensions(),
            (800, 1000)
        );
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        let pipeline = Pipeline::new(SilentBackend, config(50_000));
        let pipeline = &pipeline;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(move || pipeline.process_image(&blank_page()).unwrap()))
                .collect();
            for handle in handles {
                let result = handle.join().unwrap();
                assert_eq!(result.total_comprobantes, 0);
            }
        });
    }
}
