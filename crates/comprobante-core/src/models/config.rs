//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the comprobante pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region detection filters.
    pub detection: DetectionParams,

    /// PDF rasterization settings.
    pub pdf: PdfConfig,

    /// Emit intermediate artifacts (masks, per-step crops) for external
    /// capture. Never changes what is detected.
    pub debug: bool,
}

/// Candidate filters for region detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Nominal minimum contour area in px². Tuned for full-page receipt
    /// layouts; dense grids use 3000-5000. The detector rescales this
    /// locally when it does not fit the page actually given; the rescaled
    /// value is never written back.
    pub min_area: u32,

    /// Minimum candidate width in px.
    pub min_width: u32,

    /// Minimum candidate height in px.
    pub min_height: u32,

    /// Accepted width/height range. Receipts come vertical, horizontal
    /// and near-square, so the bounds are permissive.
    pub aspect_ratio: (f32, f32),
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_area: 50_000,
            min_width: 50,
            min_height: 50,
            aspect_ratio: (0.3, 3.0),
        }
    }
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Page render scale in multiples of 72 dpi. The default gives a
    /// 300-dpi-equivalent raster.
    pub render_scale: f32,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_scale: 300.0 / 72.0,
            max_pages: 0,
        }
    }
}

impl PipelineConfig {
    /// Preset for dense grids of small receipts.
    pub fn grid() -> Self {
        Self {
            detection: DetectionParams {
                min_area: 3000,
                ..DetectionParams::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_target_full_page_layouts() {
        let params = DetectionParams::default();
        assert_eq!(params.min_area, 50_000);
        assert_eq!(params.min_width, 50);
        assert_eq!(params.min_height, 50);
        assert_eq!(params.aspect_ratio, (0.3, 3.0));
    }

    #[test]
    fn grid_preset_lowers_the_area_gate() {
        let config = PipelineConfig::grid();
        assert_eq!(config.detection.min_area, 3000);
        assert_eq!(config.detection.min_width, 50);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PipelineConfig::grid();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.detection.min_area, 3000);
        assert_eq!(back.pdf.max_pages, 0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"detection": {"min_area": 4000}}"#).unwrap();
        assert_eq!(config.detection.min_area, 4000);
        assert_eq!(config.detection.min_width, 50);
        assert!(!config.debug);
    }
}
