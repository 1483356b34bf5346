//! Image preprocessing for OCR
//!
//! Nameplate photos go through a fixed filter chain before recognition:
//! grayscale, contrast boost around the mean luminance, a 3x3 sharpen, and
//! an optional binarization for the worst-lit plates. Every step is a pure
//! function over the decoded image; only the initial decode can fail.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageError, ImageFormat};

/// Contrast multiplier applied around the mean luminance. 1.0 is identity;
/// stamped low-contrast plates need the doubling.
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Default luminance cutoff when binarization is enabled.
pub const BINARIZE_THRESHOLD: u8 = 140;

/// 3x3 sharpening kernel: ring of -2/16 around a 32/16 center.
const SHARPEN_KERNEL: [f32; 9] = [
    -0.125, -0.125, -0.125, //
    -0.125, 2.0, -0.125, //
    -0.125, -0.125, -0.125,
];

/// Knobs for [`preprocess`].
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    pub contrast: f32,
    pub binarize: bool,
    pub threshold: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            contrast: CONTRAST_FACTOR,
            binarize: false,
            threshold: BINARIZE_THRESHOLD,
        }
    }
}

/// Decode raw photo bytes and run the filter chain.
pub fn prepare_for_ocr(bytes: &[u8], opts: &PreprocessOptions) -> Result<GrayImage, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(preprocess(&decoded, opts))
}

/// Run the filter chain over an already decoded image.
pub fn preprocess(image: &DynamicImage, opts: &PreprocessOptions) -> GrayImage {
    let gray = image.to_luma8();
    let contrasted = boost_contrast(&gray, opts.contrast);
    let sharpened = sharpen(&contrasted);
    if opts.binarize {
        binarize(&sharpened, opts.threshold)
    } else {
        sharpened
    }
}

/// Scale every pixel's distance from the image's mean luminance by `factor`.
pub fn boost_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let mean = mean_luminance(image);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let value = pixel.0[0] as f32;
        pixel.0[0] = (mean + (value - mean) * factor).clamp(0.0, 255.0) as u8;
    }
    out
}

fn mean_luminance(image: &GrayImage) -> f32 {
    let count = (image.width() as u64) * (image.height() as u64);
    if count == 0 {
        return 0.0;
    }
    let total: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    total as f32 / count as f32
}

/// Apply the fixed 3x3 sharpen.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    image::imageops::filter3x3(image, &SHARPEN_KERNEL)
}

/// Threshold to pure black and white. Pixels below `threshold` go black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] < threshold { 0 } else { 255 };
    }
    out
}

/// Encode a processed image as PNG for handing to a recognition backend.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn uniform(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = prepare_for_ocr(b"definitely not an image", &PreprocessOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn decodes_and_preserves_dimensions() {
        let png = encode_png(&uniform(32, 16, 127)).unwrap();
        let processed = prepare_for_ocr(&png, &PreprocessOptions::default()).unwrap();
        assert_eq!(processed.dimensions(), (32, 16));
    }

    #[test]
    fn contrast_identity_leaves_pixels_alone() {
        let mut image = uniform(4, 4, 100);
        image.put_pixel(0, 0, Luma([200]));
        let boosted = boost_contrast(&image, 1.0);
        assert_eq!(boosted.get_pixel(0, 0).0[0], 200);
        assert_eq!(boosted.get_pixel(1, 1).0[0], 100);
    }

    #[test]
    fn contrast_spreads_values_from_the_mean() {
        // Half 100, half 150: mean 125, factor 2 pushes to 75 and 175.
        let mut image = uniform(2, 1, 100);
        image.put_pixel(1, 0, Luma([150]));
        let boosted = boost_contrast(&image, 2.0);
        assert_eq!(boosted.get_pixel(0, 0).0[0], 75);
        assert_eq!(boosted.get_pixel(1, 0).0[0], 175);
    }

    #[test]
    fn contrast_clamps_to_byte_range() {
        let mut image = uniform(2, 1, 10);
        image.put_pixel(1, 0, Luma([250]));
        let boosted = boost_contrast(&image, 4.0);
        assert_eq!(boosted.get_pixel(0, 0).0[0], 0);
        assert_eq!(boosted.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn uniform_image_is_a_contrast_fixed_point() {
        let image = uniform(8, 8, 77);
        let boosted = boost_contrast(&image, 3.0);
        assert!(boosted.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn binarize_splits_at_threshold() {
        let mut image = uniform(3, 1, 139);
        image.put_pixel(1, 0, Luma([140]));
        image.put_pixel(2, 0, Luma([255]));
        let bw = binarize(&image, 140);
        assert_eq!(bw.get_pixel(0, 0).0[0], 0);
        assert_eq!(bw.get_pixel(1, 0).0[0], 255);
        assert_eq!(bw.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn sharpen_keeps_dimensions() {
        let sharpened = sharpen(&uniform(10, 7, 50));
        assert_eq!(sharpened.dimensions(), (10, 7));
    }

    #[test]
    fn full_chain_with_binarization_yields_bilevel_output() {
        let mut image = uniform(6, 6, 90);
        image.put_pixel(3, 3, Luma([220]));
        let opts = PreprocessOptions {
            binarize: true,
            ..PreprocessOptions::default()
        };
        let processed = preprocess(&DynamicImage::ImageLuma8(image), &opts);
        assert!(processed.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn encoded_png_round_trips() {
        let image = uniform(5, 5, 42);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(2, 2).0[0], 42);
    }
}
