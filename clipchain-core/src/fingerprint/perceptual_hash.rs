use bitvec::prelude::*;
use image::GrayImage;
use serde::{Deserialize, Serialize};

use clipchain_common::resize_to_gray_square;

use crate::definitions::{HASH_BITS, HASH_WORDS, MAX_HASH_GRID_SIZE};

/// An average-hash of a single video frame, packed into fixed-size storage
/// sized for the largest supported grid (`MAX_HASH_GRID_SIZE`). Grids smaller
/// than that simply leave the trailing bits unset.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct PerceptualHash {
    bits: [usize; HASH_WORDS],
    grid_size: u32,
}

impl PerceptualHash {
    /// Computes an average-hash over `frame` using a `grid_size x grid_size`
    /// sampling grid: resize to the grid, then set bit `i` when pixel `i` is
    /// at or above the mean pixel value of the resized grid.
    #[must_use]
    pub fn from_frame(frame: &image::RgbImage, grid_size: u32) -> Self {
        let gray = resize_to_gray_square(frame, grid_size);
        Self::from_gray_grid(&gray, grid_size)
    }

    fn from_gray_grid(gray: &GrayImage, grid_size: u32) -> Self {
        let pixels: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        let mean = if pixels.is_empty() {
            0.0
        } else {
            pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / pixels.len() as f64
        };

        let mut bitarr: BitArray<[usize; HASH_WORDS], Lsb0> = BitArray::ZERO;
        for (mut bit, &pixel) in bitarr.iter_mut().zip(pixels.iter()) {
            *bit = f64::from(pixel) >= mean;
        }

        Self {
            bits: bitarr.into_inner(),
            grid_size,
        }
    }

    #[must_use]
    pub const fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of meaningful bits in this hash (`grid_size^2`), as distinct
    /// from the fixed storage width `HASH_BITS`.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        (self.grid_size * self.grid_size) as usize
    }

    /// Hamming distance to `other`. Only meaningful when both hashes share a
    /// `grid_size`; callers that mix grid sizes get a distance over the
    /// smaller of the two bit lengths.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        let bit_len = self.bit_len().min(other.bit_len());
        let self_slice = &BitSlice::<usize, Lsb0>::from_slice(&self.bits)[..bit_len];
        let other_slice = &BitSlice::<usize, Lsb0>::from_slice(&other.bits)[..bit_len];

        self_slice
            .iter()
            .by_vals()
            .zip(other_slice.iter().by_vals())
            .filter(|(a, b)| a != b)
            .count() as u32
    }

    /// High-order bits of the hash, used as a bucketing prefix. `bits` is
    /// clamped to `bit_len()`.
    #[must_use]
    pub fn prefix(&self, bits: u32) -> u32 {
        let bits = bits.min(self.bit_len() as u32).min(32);
        let slice = &BitSlice::<usize, Lsb0>::from_slice(&self.bits)[..self.bit_len()];
        let mut value: u32 = 0;
        for bit in slice.iter().by_vals().take(bits as usize) {
            value = (value << 1) | u32::from(bit);
        }
        value
    }
}

#[doc(hidden)]
#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use bitvec::prelude::*;
    use rand::prelude::*;

    use super::PerceptualHash;
    use crate::definitions::{HASH_WORDS, MAX_HASH_GRID_SIZE};

    impl PerceptualHash {
        #[must_use]
        pub fn empty_hash() -> Self {
            Self {
                bits: [0; HASH_WORDS],
                grid_size: MAX_HASH_GRID_SIZE,
            }
        }

        #[must_use]
        pub fn full_hash() -> Self {
            Self {
                bits: [usize::MAX; HASH_WORDS],
                grid_size: MAX_HASH_GRID_SIZE,
            }
        }

        #[must_use]
        pub fn random_hash(rng: &mut StdRng) -> Self {
            let mut hash: BitArray<[usize; HASH_WORDS], Lsb0> = BitArray::ZERO;
            for mut bit in hash.iter_mut().take((MAX_HASH_GRID_SIZE * MAX_HASH_GRID_SIZE) as usize)
            {
                *bit = rng.random_bool(0.5);
            }
            Self {
                bits: hash.into_inner(),
                grid_size: MAX_HASH_GRID_SIZE,
            }
        }

        /// Flips bits in a clone of this hash until its distance from `self`
        /// equals `target_distance`.
        #[must_use]
        pub fn hash_with_distance(&self, target_distance: u32, rng: &mut StdRng) -> Self {
            let mut ret = self.clone();
            let mut flip = |bits: &mut [usize; HASH_WORDS]| {
                let word = rng.random_range(0..bits.len());
                let bit = rng.random_range(0..usize::BITS);
                bits[word] ^= 1usize << bit;
            };
            while self.hamming_distance(&ret) < target_distance {
                flip(&mut ret.bits);
            }
            ret
        }
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::PerceptualHash;

    #[test]
    fn identity_distance_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let hash = PerceptualHash::random_hash(&mut rng);
            assert_eq!(hash.hamming_distance(&hash), 0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1_000 {
            let a = PerceptualHash::random_hash(&mut rng);
            let b = PerceptualHash::random_hash(&mut rng);
            assert_eq!(a.hamming_distance(&b), b.hamming_distance(&a));
        }
    }

    #[test]
    fn triangle_inequality_holds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let a = PerceptualHash::random_hash(&mut rng);
            let b = PerceptualHash::random_hash(&mut rng);
            let c = PerceptualHash::random_hash(&mut rng);
            assert!(a.hamming_distance(&c) <= a.hamming_distance(&b) + b.hamming_distance(&c));
        }
    }

    #[test]
    fn empty_and_full_hashes_are_self_consistent() {
        assert_eq!(
            PerceptualHash::empty_hash().hamming_distance(&PerceptualHash::empty_hash()),
            0
        );
        assert_eq!(
            PerceptualHash::full_hash().hamming_distance(&PerceptualHash::full_hash()),
            0
        );
        assert_eq!(
            PerceptualHash::empty_hash().hamming_distance(&PerceptualHash::full_hash()),
            crate::definitions::MAX_HASH_GRID_SIZE * crate::definitions::MAX_HASH_GRID_SIZE
        );
    }
}
