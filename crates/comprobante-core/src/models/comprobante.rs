//! Result models for comprobante extraction.

use image::DynamicImage;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::segment::SegmentDebug;

/// Axis-aligned bounding box in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Pixel area of the box.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A resolved receipt region.
#[derive(Debug, Clone, Serialize)]
pub struct Comprobante {
    /// 1-based sequential id, local to its page. Ids restart at 1 on each
    /// page; the page number disambiguates across pages.
    pub id: u32,

    /// 1-based page number.
    pub page: u32,

    /// OCR-derived document number, or the deterministic positional
    /// fallback. Stable for identical input pixels and parameters, but not
    /// globally unique: two receipts can share a document number.
    pub documento_id: String,

    /// Position of the region within its page.
    pub coordinates: BoundingBox,

    /// Pixel area of the bounding box.
    pub area: u64,

    /// Normalized monetary value, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor: Option<Decimal>,

    /// The pixel crop. Persisted by the caller, never serialized.
    #[serde(skip)]
    pub crop: DynamicImage,
}

impl Comprobante {
    /// File name the crop is stored under. Keyed by the document id:
    /// records sharing a number overwrite each other, by design.
    pub fn filename(&self) -> String {
        format!("{}.png", self.documento_id)
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// 1-based page number.
    pub page: u32,
    /// Resolved regions in reading order.
    pub comprobantes: Vec<Comprobante>,
    /// Caller-visible degradations (no regions found, render failure).
    pub warnings: Vec<String>,
}

/// Intermediate artifacts captured for one page when debug capture is on.
#[derive(Debug, Clone)]
pub struct PageArtifacts {
    pub page: u32,
    pub segmentation: SegmentDebug,
}

/// Aggregate result of one pipeline invocation. Never mutated after
/// return; crop persistence belongs to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Per-page reports, in page order.
    pub pages: Vec<PageReport>,
    /// Total records across all pages.
    pub total_comprobantes: usize,
    /// Wall time of the invocation.
    pub processing_time_ms: u64,
    /// Debug artifacts for external capture, empty unless requested.
    #[serde(skip)]
    pub artifacts: Vec<PageArtifacts>,
}

impl PipelineResult {
    pub(crate) fn new(
        pages: Vec<PageReport>,
        artifacts: Vec<PageArtifacts>,
        elapsed: std::time::Duration,
    ) -> Self {
        let total_comprobantes = pages.iter().map(|p| p.comprobantes.len()).sum();
        Self {
            pages,
            total_comprobantes,
            processing_time_ms: elapsed.as_millis() as u64,
            artifacts,
        }
    }

    /// All records in page order.
    pub fn comprobantes(&self) -> impl Iterator<Item = &Comprobante> {
        self.pages.iter().flat_map(|p| p.comprobantes.iter())
    }

    /// Partition into single-record results ("individual" mode). Response
    /// shaping only: record contents are untouched.
    pub fn into_individual(self) -> Vec<PipelineResult> {
        let time = self.processing_time_ms;
        self.pages
            .into_iter()
            .flat_map(|page| {
                let page_no = page.page;
                page.comprobantes.into_iter().map(move |comp| PipelineResult {
                    pages: vec![PageReport {
                        page: page_no,
                        comprobantes: vec![comp],
                        warnings: Vec::new(),
                    }],
                    total_comprobantes: 1,
                    processing_time_ms: time,
                    artifacts: Vec::new(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use super::*;

    fn sample(id: u32, page: u32, documento: &str) -> Comprobante {
        Comprobante {
            id,
            page,
            documento_id: documento.to_string(),
            coordinates: BoundingBox {
                x: 10,
                y: 20,
                width: 200,
                height: 100,
            },
            area: 20_000,
            valor: Decimal::from_str("4688.07").ok(),
            crop: DynamicImage::new_rgb8(1, 1),
        }
    }

    #[test]
    fn filename_is_keyed_by_documento_id() {
        assert_eq!(sample(1, 1, "801363627").filename(), "801363627.png");
        assert_eq!(sample(2, 3, "PAG03_COMP02").filename(), "PAG03_COMP02.png");
    }

    #[test]
    fn serialization_skips_the_crop() {
        let json = serde_json::to_value(sample(1, 1, "123456")).unwrap();
        assert!(json.get("crop").is_none());
        assert_eq!(json["documento_id"], "123456");
        assert_eq!(json["valor"], "4688.07");
    }

    #[test]
    fn individual_mode_partitions_without_touching_records() {
        let result = PipelineResult::new(
            vec![PageReport {
                page: 1,
                comprobantes: vec![sample(1, 1, "111111"), sample(2, 1, "222222")],
                warnings: Vec::new(),
            }],
            Vec::new(),
            std::time::Duration::from_millis(5),
        );
        assert_eq!(result.total_comprobantes, 2);

        let individual = result.into_individual();
        assert_eq!(individual.len(), 2);
        assert!(individual.iter().all(|r| r.total_comprobantes == 1));
        assert_eq!(individual[0].pages[0].comprobantes[0].documento_id, "111111");
        assert_eq!(individual[1].pages[0].comprobantes[0].documento_id, "222222");
    }

    #[test]
    fn bounding_box_edges() {
        let bbox = BoundingBox {
            x: 5,
            y: 7,
            width: 10,
            height: 20,
        };
        assert_eq!(bbox.area(), 200);
        assert_eq!(bbox.right(), 15);
        assert_eq!(bbox.bottom(), 27);
    }
}
