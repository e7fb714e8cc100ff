use image::{imageops::FilterType, GrayImage, RgbImage};

/// Resizes a frame down to an `side x side` grayscale square, the shape the
/// perceptual hash grid and the motion-score hash both consume.
#[must_use]
pub fn resize_to_gray_square(frame: &RgbImage, side: u32) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(frame.clone()).into_luma8();
    image::imageops::resize(&gray, side, side, FilterType::Triangle)
}

/// Resizes a frame to a fixed square used as the sampling basis for color
/// histograms, so that histogram weight does not depend on source
/// resolution.
#[must_use]
pub fn resize_to_rgb_square(frame: &RgbImage, side: u32) -> RgbImage {
    image::imageops::resize(frame, side, side, FilterType::Triangle)
}
