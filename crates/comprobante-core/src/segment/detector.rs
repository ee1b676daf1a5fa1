//! Contour-based receipt detection.
//!
//! Ink regions are pulled out of the page with an inverted adaptive
//! threshold, merged into solid blobs by morphological closing, and their
//! outer contours filtered into receipt-shaped candidates. The closing
//! kernel and the minimum-area gate both adapt to the resolution of the
//! page actually given, so a full printed page and a cropped grid cell go
//! through the same path.

use image::{DynamicImage, GrayImage};
use tracing::{debug, trace, warn};

use crate::error::SegmentError;
use crate::imgproc::{contours, ops};
use crate::models::comprobante::BoundingBox;
use crate::models::config::DetectionParams;

/// Adaptive threshold neighborhood side.
const BLOCK_SIZE: usize = 51;
/// Adaptive threshold bias.
const BIAS: f32 = 9.0;
/// Douglas-Peucker epsilon as a fraction of the contour perimeter.
const APPROX_EPSILON: f64 = 0.02;
/// Floor for the rescaled minimum area.
const MIN_ADAPTED_AREA: u64 = 5000;

/// A candidate receipt region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRegion {
    /// Axis-aligned bounds within the page.
    pub bounds: BoundingBox,
    /// Contour area in px², as seen by the acceptance filter.
    pub area: u64,
}

/// Intermediate masks, kept when debug capture is requested.
#[derive(Debug, Clone)]
pub struct SegmentDebug {
    pub thresholded: GrayImage,
    pub closed: GrayImage,
}

/// Outcome of one detection pass.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Accepted candidates in reading order (top, then left).
    pub candidates: Vec<CandidateRegion>,
    pub debug: Option<SegmentDebug>,
}

/// Contour-based receipt detector.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    params: DetectionParams,
    keep_debug: bool,
}

impl RegionDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            keep_debug: false,
        }
    }

    /// Keep intermediate masks for external capture.
    pub fn with_debug(mut self, keep: bool) -> Self {
        self.keep_debug = keep;
        self
    }

    /// The minimum area actually applied to a page of the given size.
    ///
    /// A nominal threshold tuned for a full page rejects everything in a
    /// small grid cell, so a caller value above 5% of the page area is
    /// replaced by `max(5000, page_area / 50)`. The rescaled value lives
    /// only for this call.
    pub fn effective_min_area(&self, page_area: u64) -> u64 {
        let nominal = self.params.min_area as u64;
        if nominal > page_area / 20 {
            let adapted = (page_area / 50).max(MIN_ADAPTED_AREA);
            debug!(nominal, adapted, page_area, "min area rescaled to page");
            adapted
        } else {
            nominal
        }
    }

    /// Closing element side for the given page width.
    fn kernel_size(width: u32) -> u32 {
        (width / 100).clamp(10, 25)
    }

    /// Detect candidate receipt regions, ordered (top, then left).
    ///
    /// Zero candidates is a valid outcome, not an error; only a pixel-less
    /// page fails.
    pub fn detect(&self, page: &DynamicImage) -> Result<Segmentation, SegmentError> {
        let gray = page.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(SegmentError::EmptyPage);
        }
        let page_area = width as u64 * height as u64;
        let min_area = self.effective_min_area(page_area);

        let blurred = ops::gaussian_blur(&gray);
        let thresholded = ops::adaptive_threshold_inv(&blurred, BLOCK_SIZE, BIAS);
        let kernel = Self::kernel_size(width);
        let closed = ops::close(&thresholded, kernel);
        debug!(width, height, kernel, min_area, "segmenting page");

        let mut candidates = Vec::new();
        for contour in contours::find_external_contours(&closed) {
            let area = contour.area();
            if area < min_area as f64 {
                continue;
            }
            let epsilon = APPROX_EPSILON * contour.arc_length();
            let approx = contours::approx_poly_dp(&contour.points, epsilon);
            let (x, y, w, h) = contours::bounding_rect(&approx);

            let aspect = if h > 0 { w as f32 / h as f32 } else { 0.0 };
            let (lo, hi) = self.params.aspect_ratio;
            if w > self.params.min_width && h > self.params.min_height && (lo..=hi).contains(&aspect)
            {
                trace!(x, y, w, h, area, aspect, "candidate accepted");
                candidates.push(CandidateRegion {
                    bounds: BoundingBox {
                        x,
                        y,
                        width: w,
                        height: h,
                    },
                    area: area as u64,
                });
            } else {
                trace!(x, y, w, h, area, aspect, "candidate rejected");
            }
        }

        candidates.sort_by_key(|c| (c.bounds.y, c.bounds.x));
        if candidates.is_empty() {
            warn!(width, height, "no receipt regions detected");
        } else {
            debug!(found = candidates.len(), "candidates accepted");
        }

        let debug = self.keep_debug.then_some(SegmentDebug {
            thresholded,
            closed,
        });
        Ok(Segmentation { candidates, debug })
    }
}
