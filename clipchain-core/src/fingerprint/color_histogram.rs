use serde::{Deserialize, Serialize};

use clipchain_common::resize_to_rgb_square;

use crate::definitions::CHI_SQUARE_EPSILON;

/// A per-channel, L1-normalized color histogram: `bins_per_channel` buckets
/// for each of R, G, B, concatenated. All entries sum to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorHistogram {
    bins: Vec<f64>,
    bins_per_channel: usize,
}

impl ColorHistogram {
    const SAMPLE_SIDE: u32 = 64;

    #[must_use]
    pub fn from_frame(frame: &image::RgbImage, bins_per_channel: usize) -> Self {
        let sample = resize_to_rgb_square(frame, Self::SAMPLE_SIDE);
        let mut counts = vec![0u64; bins_per_channel * 3];

        for pixel in sample.pixels() {
            for (channel, &value) in pixel.0.iter().enumerate() {
                let bin = bin_of(value, bins_per_channel);
                counts[channel * bins_per_channel + bin] += 1;
            }
        }

        let total: u64 = counts.iter().sum();
        let bins = if total == 0 {
            vec![0.0; bins_per_channel * 3]
        } else {
            counts
                .into_iter()
                .map(|c| c as f64 / total as f64)
                .collect()
        };

        Self {
            bins,
            bins_per_channel,
        }
    }

    #[must_use]
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    #[must_use]
    pub const fn bins_per_channel(&self) -> usize {
        self.bins_per_channel
    }

    /// Chi-square distance between two histograms of equal bin layout:
    /// `Σ (p_i - q_i)^2 / (p_i + q_i + ε)`.
    #[must_use]
    pub fn chi_square(&self, other: &Self) -> f64 {
        self.bins
            .iter()
            .zip(other.bins.iter())
            .map(|(p, q)| {
                let diff = p - q;
                diff * diff / (p + q + CHI_SQUARE_EPSILON)
            })
            .sum()
    }
}

fn bin_of(value: u8, bins_per_channel: usize) -> usize {
    let bin = (usize::from(value) * bins_per_channel) / 256;
    bin.min(bins_per_channel - 1)
}

#[cfg(any(test, feature = "test-util"))]
impl ColorHistogram {
    #[doc(hidden)]
    #[must_use]
    pub fn from_bins(bins: Vec<f64>, bins_per_channel: usize) -> Self {
        Self {
            bins,
            bins_per_channel,
        }
    }

    #[doc(hidden)]
    #[must_use]
    pub fn uniform(bins_per_channel: usize) -> Self {
        let n = bins_per_channel * 3;
        Self::from_bins(vec![1.0 / n as f64; n], bins_per_channel)
    }
}

#[cfg(test)]
mod test {
    use super::ColorHistogram;

    #[test]
    fn normalizes_to_unit_sum() {
        let img = image::RgbImage::from_fn(32, 32, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 8) as u8, 128])
        });
        let hist = ColorHistogram::from_frame(&img, 32);
        let sum: f64 = hist.bins().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identical_histograms_have_zero_chi_square() {
        let a = ColorHistogram::uniform(32);
        let b = ColorHistogram::uniform(32);
        assert!(a.chi_square(&b).abs() < 1e-12);
    }

    #[test]
    fn bins_never_negative() {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 200, 50]));
        let hist = ColorHistogram::from_frame(&img, 32);
        assert!(hist.bins().iter().all(|&b| b >= 0.0));
    }
}
