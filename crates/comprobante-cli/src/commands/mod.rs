//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::Path;

use console::style;
use tracing::warn;

use comprobante_core::{
    ComprobanteError, NullBackend, OcrBackend, PageArtifacts, Pipeline, PipelineConfig,
    PipelineResult,
};
use comprobante_ocr::TesseractBackend;

/// Image extensions the extractor accepts directly.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp"];

/// Build the OCR backend. A missing engine degrades to positional
/// fallback identifiers instead of failing the run.
pub(crate) fn build_backend() -> Box<dyn OcrBackend> {
    match TesseractBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("OCR engine unavailable: {e}");
            eprintln!(
                "{} OCR engine unavailable; document ids fall back to page/position",
                style("!").yellow()
            );
            Box::new(NullBackend)
        }
    }
}

/// Process one input file, dispatching on its extension.
pub(crate) fn process_file(
    input: &Path,
    config: &PipelineConfig,
) -> anyhow::Result<PipelineResult> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension == "pdf" {
        let rasterizer = comprobante_core::PdfiumRasterizer::open(input)?;
        let pipeline = Pipeline::new(build_backend(), config.clone());
        return Ok(pipeline.process_document(&rasterizer)?);
    }

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        let image = image::open(input)?;
        let pipeline = Pipeline::new(build_backend(), config.clone());
        return Ok(pipeline.process_image(&image)?);
    }

    Err(ComprobanteError::UnsupportedInput(extension).into())
}

/// Load the effective pipeline configuration.
pub(crate) fn load_config(config_path: Option<&str>, grid: bool) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(Path::new(path))?),
        None if grid => Ok(PipelineConfig::grid()),
        None => Ok(PipelineConfig::default()),
    }
}

/// Persist every crop under `dir`, keyed by document id. Records sharing
/// a document number overwrite each other, by design.
pub(crate) fn save_crops(result: &PipelineResult, dir: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dir)?;
    let mut saved = 0;
    for comprobante in result.comprobantes() {
        let path = dir.join(comprobante.filename());
        comprobante.crop.save(&path)?;
        saved += 1;
    }
    Ok(saved)
}

/// Write intermediate masks for external inspection.
pub(crate) fn save_artifacts(artifacts: &[PageArtifacts], dir: &Path) -> anyhow::Result<()> {
    if artifacts.is_empty() {
        return Ok(());
    }
    let debug_dir = dir.join("debug");
    std::fs::create_dir_all(&debug_dir)?;
    for artifact in artifacts {
        let page = artifact.page;
        artifact
            .segmentation
            .thresholded
            .save(debug_dir.join(format!("page{page}_thresh.png")))?;
        artifact
            .segmentation
            .closed
            .save(debug_dir.join(format!("page{page}_closed.png")))?;
    }
    Ok(())
}
