//! Sub-region enhancement ahead of OCR.

use image::{imageops::FilterType, GrayImage};
use tracing::trace;

use super::ops;
use crate::error::FieldError;

/// Narrow-side size below which a region is upscaled before OCR.
const MIN_OCR_DIMENSION: u32 = 300;
/// CLAHE clip limit for scan illumination correction.
const CLAHE_CLIP: f32 = 3.0;
/// CLAHE tile grid.
const CLAHE_TILES: (u32, u32) = (8, 8);

/// Enhance a grayscale region for OCR: upscale small regions, equalize
/// local contrast, binarize.
///
/// The input is never mutated. Fails with [`FieldError::EmptyRegion`] on a
/// zero-area region; such a region must not reach the OCR backend.
pub fn enhance(region: &GrayImage) -> Result<GrayImage, FieldError> {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return Err(FieldError::EmptyRegion);
    }

    let narrow = width.min(height);
    let upscaled = if narrow < MIN_OCR_DIMENSION {
        // Smallest integer factor that brings the narrow side to target.
        let factor = MIN_OCR_DIMENSION.div_ceil(narrow);
        trace!(width, height, factor, "upscaling region for OCR");
        image::imageops::resize(
            region,
            width * factor,
            height * factor,
            FilterType::CatmullRom,
        )
    } else {
        region.clone()
    };

    let equalized = ops::clahe(&upscaled, CLAHE_CLIP, CLAHE_TILES);
    Ok(ops::otsu_binarize(&equalized))
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_region_is_rejected() {
        let empty = GrayImage::new(0, 0);
        assert!(matches!(enhance(&empty), Err(FieldError::EmptyRegion)));

        let zero_height = GrayImage::new(100, 0);
        assert!(matches!(enhance(&zero_height), Err(FieldError::EmptyRegion)));
    }

    #[test]
    fn narrow_regions_are_upscaled_to_the_ocr_floor() {
        // Narrow side 50 -> factor 6 -> 600x300.
        let region = GrayImage::from_pixel(100, 50, Luma([128]));
        let enhanced = enhance(&region).unwrap();
        assert_eq!(enhanced.dimensions(), (600, 300));
    }

    #[test]
    fn large_regions_keep_their_size() {
        let region = GrayImage::from_pixel(400, 350, Luma([128]));
        let enhanced = enhance(&region).unwrap();
        assert_eq!(enhanced.dimensions(), (400, 350));
    }

    #[test]
    fn output_is_strictly_two_valued() {
        let mut region = GrayImage::from_pixel(320, 320, Luma([200]));
        for y in 100..160 {
            for x in 40..280 {
                region.put_pixel(x, y, Luma([40]));
            }
        }
        let enhanced = enhance(&region).unwrap();
        assert!(enhanced.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
