use std::path::PathBuf;
use std::sync::OnceLock;

use image::RgbImage;
use log::warn;

/// Given two RGB frames of identical dimensions, produces `n` intermediate
/// frames at uniform timesteps `k / (n + 1)` for `k` in `1..=n`, exclusive of
/// the two endpoints. Callers guarantee `a` and `b` share dimensions.
pub trait FrameInterpolator: Send + Sync {
    fn interpolate(&self, a: &RgbImage, b: &RgbImage, n: usize) -> Vec<RgbImage>;
}

/// Required fallback: blends pixel-wise, `a * (1 - t) + b * t`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBlendInterpolator;

impl FrameInterpolator for LinearBlendInterpolator {
    fn interpolate(&self, a: &RgbImage, b: &RgbImage, n: usize) -> Vec<RgbImage> {
        (1..=n)
            .map(|k| {
                let t = k as f32 / (n + 1) as f32;
                blend(a, b, t)
            })
            .collect()
    }
}

fn blend(a: &RgbImage, b: &RgbImage, t: f32) -> RgbImage {
    let (width, height) = a.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let pa = a.get_pixel(x, y).0;
        let pb = b.get_pixel(x, y).0;
        let mut out = [0u8; 3];
        for channel in 0..3 {
            let value = f32::from(pa[channel]) * (1.0 - t) + f32::from(pb[channel]) * t;
            out[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
        image::Rgb(out)
    })
}

/// Adapter around a learned interpolation model loaded from a weights file.
///
/// Mirrors the lazy, fallible model-loading pattern of a production
/// interpolation service: the weights are probed once, on first use, rather
/// than at construction. If loading fails for any reason — file absent,
/// unreadable, or failing a basic header check — a warning is logged once
/// and every subsequent call degrades transparently to
/// `LinearBlendInterpolator`. Construction itself never fails.
pub struct LearnedInterpolator {
    weights_path: PathBuf,
    loaded: OnceLock<bool>,
    fallback: LinearBlendInterpolator,
}

impl LearnedInterpolator {
    #[must_use]
    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        Self {
            weights_path: weights_path.into(),
            loaded: OnceLock::new(),
            fallback: LinearBlendInterpolator,
        }
    }

    fn is_usable(&self) -> bool {
        *self.loaded.get_or_init(|| match self.probe_weights() {
            Ok(()) => true,
            Err(reason) => {
                warn!(
                    "learned frame interpolator weights at {} unusable ({reason}); falling back to linear blend",
                    self.weights_path.display()
                );
                false
            }
        })
    }

    /// A basic header check: the weights file must exist, be non-empty, and
    /// readable. This stands in for validating a real model's serialized
    /// header; actual tensor loading is out of scope here.
    fn probe_weights(&self) -> Result<(), String> {
        let metadata = std::fs::metadata(&self.weights_path).map_err(|e| e.to_string())?;
        if metadata.len() == 0 {
            return Err("weights file is empty".to_string());
        }
        Ok(())
    }
}

impl FrameInterpolator for LearnedInterpolator {
    fn interpolate(&self, a: &RgbImage, b: &RgbImage, n: usize) -> Vec<RgbImage> {
        // A real deployment would run the loaded model here once `is_usable`
        // confirms the weights probed clean. Without model weights to
        // execute against, the learned path collapses to the same blend the
        // fallback uses either way; the point of this adapter is the
        // lazy-load-and-degrade lifecycle, not a from-scratch model
        // implementation.
        let _ = self.is_usable();
        self.fallback.interpolate(a, b, n)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn linear_blend_returns_n_frames_with_correct_endpoints_ratio() {
        let a = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let b = RgbImage::from_pixel(4, 4, image::Rgb([100, 100, 100]));

        let frames = LinearBlendInterpolator.interpolate(&a, &b, 3);
        assert_eq!(frames.len(), 3);

        let first_pixel = frames[0].get_pixel(0, 0).0;
        let expected_t = 1.0 / 4.0;
        let expected = (100.0 * expected_t).round() as u8;
        assert_eq!(first_pixel[0], expected);
    }

    #[test]
    fn missing_weights_file_falls_back_without_panicking() {
        let interpolator = LearnedInterpolator::new("/nonexistent/path/to/weights.bin");
        let a = RgbImage::from_pixel(2, 2, image::Rgb([10, 10, 10]));
        let b = RgbImage::from_pixel(2, 2, image::Rgb([20, 20, 20]));
        let frames = interpolator.interpolate(&a, &b, 1);
        assert_eq!(frames.len(), 1);
    }
}
