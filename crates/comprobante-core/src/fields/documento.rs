//! Document-number resolution from a receipt crop.
//!
//! The "Documento:" field sits in the upper-right block of the targeted
//! layouts. That zone is cut at fixed relative coordinates, enhanced, and
//! scanned with the pattern cascade across the backend's recognition
//! configurations. A region that defeats OCR still gets a stable
//! identifier derived from its page and position.

use image::{DynamicImage, GrayImage};
use tracing::{debug, trace, warn};

use comprobante_ocr::{documento_configs, OcrBackend, OcrError};

use super::patterns::DOCUMENTO_CASCADE;
use crate::error::FieldError;
use crate::imgproc::preprocess;

/// Horizontal start of the document-number zone, relative to crop width.
const ROI_LEFT: f64 = 0.60;
/// Vertical span of the document-number zone, relative to crop height.
const ROI_TOP: f64 = 0.35;
const ROI_BOTTOM: f64 = 0.70;

/// Deterministic identifier for a region OCR could not resolve.
pub fn fallback_id(page: u32, region: u32) -> String {
    format!("PAG{page:02}_COMP{region:02}")
}

/// Scan OCR text for a document number.
///
/// Leading zeros are stripped (an all-zero run collapses to "0"); a match
/// survives only when at least 6 digits remain, which keeps page numbers
/// and dates from being mistaken for document ids.
pub fn find_documento(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for (rank, pattern) in DOCUMENTO_CASCADE.iter().enumerate() {
        if let Some(caps) = pattern.captures(&collapsed) {
            let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let stripped = raw.trim_start_matches('0');
            let numero = if stripped.is_empty() { "0" } else { stripped };
            if numero.len() >= 6 {
                trace!(rank, raw, numero, "documento pattern matched");
                return Some(numero.to_string());
            }
        }
    }
    None
}

/// OCR the document zone of a crop and resolve its number, falling back
/// to the deterministic page/position identifier.
pub fn resolve<B: OcrBackend>(crop: &DynamicImage, page: u32, region: u32, ocr: &mut B) -> String {
    match document_zone(crop).and_then(|zone| preprocess::enhance(&zone)) {
        Ok(binary) => {
            for config in documento_configs() {
                match ocr.recognize(&binary, &config) {
                    Ok(text) => {
                        if let Some(numero) = find_documento(&text) {
                            debug!(page, region, numero, "documento resolved");
                            return numero;
                        }
                    }
                    Err(OcrError::Unavailable(reason)) => {
                        debug!(page, region, %reason, "OCR unavailable");
                        break;
                    }
                    Err(e) => {
                        warn!(page, region, config = config.name, "OCR attempt failed: {e}");
                    }
                }
            }
        }
        Err(FieldError::EmptyRegion) => {
            debug!(page, region, "document zone is empty");
        }
    }

    let id = fallback_id(page, region);
    debug!(page, region, %id, "falling back to positional id");
    id
}

/// Upper-right block where the "Documento:" field sits.
fn document_zone(crop: &DynamicImage) -> Result<GrayImage, FieldError> {
    let gray = crop.to_luma8();
    let (width, height) = gray.dimensions();
    let x0 = (width as f64 * ROI_LEFT) as u32;
    let y0 = (height as f64 * ROI_TOP) as u32;
    let y1 = (height as f64 * ROI_BOTTOM) as u32;
    if x0 >= width || y0 >= y1 {
        return Err(FieldError::EmptyRegion);
    }
    Ok(image::imageops::crop_imm(&gray, x0, y0, width - x0, y1 - y0).to_image())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use comprobante_ocr::RecognitionConfig;

    struct FixedText(&'static str);

    impl OcrBackend for FixedText {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(
            &mut self,
            _image: &GrayImage,
            _config: &RecognitionConfig,
        ) -> comprobante_ocr::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unavailable {
        calls: usize,
    }

    impl OcrBackend for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn recognize(
            &mut self,
            _image: &GrayImage,
            _config: &RecognitionConfig,
        ) -> comprobante_ocr::Result<String> {
            self.calls += 1;
            Err(OcrError::Unavailable("not installed".to_string()))
        }
    }

    #[test]
    fn labeled_number_is_found_and_zero_stripped() {
        assert_eq!(
            find_documento("Documento: 000000801363627"),
            Some("801363627".to_string())
        );
    }

    #[test]
    fn label_wins_over_bare_digit_runs() {
        assert_eq!(
            find_documento("9876543210  Documento: 12345678"),
            Some("12345678".to_string())
        );
    }

    #[test]
    fn degraded_labels_still_match() {
        assert_eq!(
            find_documento("ocumento 23456789"),
            Some("23456789".to_string())
        );
        assert_eq!(
            find_documento("Documeto: 34567890"),
            Some("34567890".to_string())
        );
    }

    #[test]
    fn bare_digit_runs_are_a_last_resort() {
        assert_eq!(
            find_documento("ref 1234567890123"),
            Some("1234567890123".to_string())
        );
        assert_eq!(find_documento("ref 87654321"), Some("87654321".to_string()));
    }

    #[test]
    fn short_numbers_after_zero_stripping_are_rejected() {
        // Strips to "12": a page number, not a document id.
        assert_eq!(find_documento("Documento: 00000012"), None);
        assert_eq!(find_documento("Documento: 00000000"), None);
    }

    #[test]
    fn empty_and_unmatched_text_yield_nothing() {
        assert_eq!(find_documento(""), None);
        assert_eq!(find_documento("sin numero aqui"), None);
        assert_eq!(find_documento("pagina 3 de 12"), None);
    }

    #[test]
    fn fallback_id_is_zero_padded() {
        assert_eq!(fallback_id(1, 2), "PAG01_COMP02");
        assert_eq!(fallback_id(12, 34), "PAG12_COMP34");
    }

    #[test]
    fn resolve_uses_ocr_text_when_it_matches() {
        let crop = DynamicImage::new_rgb8(400, 300);
        let mut ocr = FixedText("Documento: 000000801363627");
        assert_eq!(resolve(&crop, 1, 1, &mut ocr), "801363627");
    }

    #[test]
    fn resolve_falls_back_when_text_is_useless() {
        let crop = DynamicImage::new_rgb8(400, 300);
        let mut ocr = FixedText("");
        assert_eq!(resolve(&crop, 2, 3, &mut ocr), "PAG02_COMP03");
    }

    #[test]
    fn unavailable_backend_stops_after_one_attempt() {
        let crop = DynamicImage::new_rgb8(400, 300);
        let mut ocr = Unavailable { calls: 0 };
        assert_eq!(resolve(&crop, 1, 1, &mut ocr), "PAG01_COMP01");
        assert_eq!(ocr.calls, 1);
    }

    #[test]
    fn degenerate_crops_resolve_to_the_fallback() {
        let crop = DynamicImage::new_rgb8(0, 0);
        let mut ocr = FixedText("Documento: 99999999");
        assert_eq!(resolve(&crop, 1, 1, &mut ocr), "PAG01_COMP01");
    }
}
