//! Grayscale raster primitives.
//!
//! Gaussian smoothing, adaptive and Otsu thresholding, CLAHE, and
//! square-element morphology over `GrayImage` buffers, with `ndarray`
//! carrying float intermediates. Kernels and sigmas follow the usual
//! computer-vision conventions so the constants in the segmentation code
//! keep their customary meaning.

use image::{GrayImage, Luma};
use ndarray::Array2;

/// Foreground value of binary masks.
pub const FOREGROUND: u8 = 255;
/// Background value of binary masks.
pub const BACKGROUND: u8 = 0;

/// 1-D Gaussian kernel of odd size, sigma derived from the size.
fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    debug_assert!(ksize % 2 == 1, "kernel size must be odd");
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-(i as f32).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian filter with replicated borders; float output.
fn gaussian_filter(image: &GrayImage, ksize: usize) -> Array2<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(ksize);
    let half = ksize / 2;

    let src =
        Array2::from_shape_fn((h, w), |(y, x)| image.get_pixel(x as u32, y as u32)[0] as f32);

    let mut rows = Array2::<f32>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sx = (x + i).saturating_sub(half).min(w - 1);
                acc += src[[y, sx]] * k;
            }
            rows[[y, x]] = acc;
        }
    }

    let mut out = Array2::<f32>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sy = (y + i).saturating_sub(half).min(h - 1);
                acc += rows[[sy, x]] * k;
            }
            out[[y, x]] = acc;
        }
    }
    out
}

/// 5×5 Gaussian blur, the standard scan-noise suppression step.
pub fn gaussian_blur(image: &GrayImage) -> GrayImage {
    let blurred = gaussian_filter(image, 5);
    let (h, w) = blurred.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([blurred[[y as usize, x as usize]].round().clamp(0.0, 255.0) as u8])
    })
}

/// Adaptive threshold against a Gaussian-weighted local mean, inverted so
/// that ink becomes foreground.
///
/// `block_size` is the odd neighborhood side; `bias` is subtracted from
/// the local mean before comparison.
pub fn adaptive_threshold_inv(image: &GrayImage, block_size: usize, bias: f32) -> GrayImage {
    let surface = gaussian_filter(image, block_size);
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let threshold = surface[[y as usize, x as usize]] - bias;
        if (image.get_pixel(x, y)[0] as f32) > threshold {
            Luma([BACKGROUND])
        } else {
            Luma([FOREGROUND])
        }
    })
}

/// Otsu's automatic threshold: maximizes between-class variance.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }
    let total = image.width() as u64 * image.height() as u64;
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut best = 0u8;
    let mut best_variance = 0.0f64;
    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0f64;
    for threshold in 0..256usize {
        weight_bg += histogram[threshold];
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += threshold as f64 * histogram[threshold] as f64;
        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;
        let variance = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best = threshold as u8;
        }
    }
    best
}

/// Binarize with the Otsu threshold; output is strictly two-valued.
pub fn otsu_binarize(image: &GrayImage) -> GrayImage {
    let threshold = otsu_threshold(image);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// `clip_limit` is relative to the uniform bin height of a tile; clipped
/// excess is redistributed evenly. Tile mappings are blended bilinearly.
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: (u32, u32)) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let (tiles_x, tiles_y) = tiles;
    let tile_w = width.div_ceil(tiles_x).max(1);
    let tile_h = height.div_ceil(tiles_y).max(1);

    // Tiles that fall entirely off the image keep an identity mapping.
    let identity: [u8; 256] = std::array::from_fn(|v| v as u8);
    let mut mappings = vec![identity; (tiles_x * tiles_y) as usize];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = ((tx + 1) * tile_w).min(width);
            let y1 = ((ty + 1) * tile_h).min(height);
            if x0 >= x1 || y0 >= y1 {
                continue;
            }

            let mut hist = [0f32; 256];
            let count = ((x1 - x0) * (y1 - y0)) as f32;
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x, y)[0] as usize] += 1.0;
                }
            }

            let limit = (clip_limit * count / 256.0).max(1.0);
            let mut excess = 0.0;
            for bin in &mut hist {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let bonus = excess / 256.0;

            let mapping = &mut mappings[(ty * tiles_x + tx) as usize];
            let mut cdf = 0.0;
            for value in 0..256usize {
                cdf += hist[value] + bonus;
                mapping[value] = ((cdf / count) * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let value = image.get_pixel(x, y)[0] as usize;

        let fx = ((x as f32 + 0.5) / tile_w as f32 - 0.5).clamp(0.0, (tiles_x - 1) as f32);
        let fy = ((y as f32 + 0.5) / tile_h as f32 - 0.5).clamp(0.0, (tiles_y - 1) as f32);
        let tx0 = fx.floor() as u32;
        let ty0 = fy.floor() as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wx = fx - tx0 as f32;
        let wy = fy - ty0 as f32;

        let map = |tx: u32, ty: u32| mappings[(ty * tiles_x + tx) as usize][value] as f32;
        let top = map(tx0, ty0) * (1.0 - wx) + map(tx1, ty0) * wx;
        let bottom = map(tx0, ty1) * (1.0 - wx) + map(tx1, ty1) * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

/// Morphological closing (dilation then erosion) with a square element.
pub fn close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    erode(&dilate(mask, kernel_size), kernel_size)
}

/// Square-element dilation: sliding-window maximum.
pub fn dilate(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    window_filter(mask, kernel_size, u8::max, u8::MIN)
}

/// Square-element erosion: sliding-window minimum.
pub fn erode(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    window_filter(mask, kernel_size, u8::min, u8::MAX)
}

/// Separable square-window reduction with replicated borders.
fn window_filter(
    mask: &GrayImage,
    kernel_size: u32,
    reduce: impl Fn(u8, u8) -> u8 + Copy,
    init: u8,
) -> GrayImage {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return mask.clone();
    }
    let k = kernel_size.max(1) as i64;
    let anchor = k / 2;

    let mut rows = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width as i64 {
            let mut acc = init;
            for i in 0..k {
                let sx = (x - anchor + i).clamp(0, width as i64 - 1) as u32;
                acc = reduce(acc, mask.get_pixel(sx, y)[0]);
            }
            rows.put_pixel(x as u32, y, Luma([acc]));
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width {
            let mut acc = init;
            for i in 0..k {
                let sy = (y - anchor + i).clamp(0, height as i64 - 1) as u32;
                acc = reduce(acc, rows.get_pixel(x, sy)[0]);
            }
            out.put_pixel(x, y as u32, Luma([acc]));
        }
    }
    out
}
