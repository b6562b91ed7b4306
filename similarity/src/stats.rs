use image::RgbImage;

use crate::error::Error;
use crate::FaceSimilarity;

/// Mean-difference tolerance per channel, in 8-bit pixel units. Deltas at or
/// beyond this saturate the mean term to full dissimilarity.
const MEAN_TOLERANCE: f32 = 64.0;
/// Stddev-difference tolerance per channel, in 8-bit pixel units.
const STD_TOLERANCE: f32 = 48.0;
/// Mean differences dominate perceived identity drift in this proxy metric.
const MEAN_WEIGHT: f32 = 0.7;
const STD_WEIGHT: f32 = 0.3;

/// Per-channel mean/stddev comparison.
///
/// This is a weak proxy for facial similarity — it tracks global tone and
/// contrast drift, not geometry — and stands in until an embedding-backed
/// metric is wired through [`crate::embedding::EmbeddingSimilarity`]. Its
/// one virtue is that it is cheap, deterministic and size-agnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStatistics;

#[derive(Debug, Clone, Copy)]
struct ChannelMoments {
    mean: [f32; 3],
    std: [f32; 3],
}

fn moments(image: &RgbImage) -> Result<ChannelMoments, Error> {
    let pixel_count = (image.width() as u64 * image.height() as u64) as f32;
    if pixel_count == 0.0 {
        return Err(Error::EmptyRegion);
    }

    let mut sums = [0.0f64; 3];
    for pixel in image.pixels() {
        for (c, sum) in sums.iter_mut().enumerate() {
            *sum += pixel.0[c] as f64;
        }
    }
    let mean = [
        (sums[0] / pixel_count as f64) as f32,
        (sums[1] / pixel_count as f64) as f32,
        (sums[2] / pixel_count as f64) as f32,
    ];

    let mut sq = [0.0f64; 3];
    for pixel in image.pixels() {
        for (c, acc) in sq.iter_mut().enumerate() {
            let d = pixel.0[c] as f64 - mean[c] as f64;
            *acc += d * d;
        }
    }
    let std = [
        (sq[0] / pixel_count as f64).sqrt() as f32,
        (sq[1] / pixel_count as f64).sqrt() as f32,
        (sq[2] / pixel_count as f64).sqrt() as f32,
    ];

    Ok(ChannelMoments { mean, std })
}

impl FaceSimilarity for ChannelStatistics {
    fn score(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<f32, Error> {
        let a = moments(reference)?;
        let b = moments(candidate)?;

        let mut mean_term = 0.0f32;
        let mut std_term = 0.0f32;
        for c in 0..3 {
            mean_term += ((a.mean[c] - b.mean[c]).abs() / MEAN_TOLERANCE).min(1.0);
            std_term += ((a.std[c] - b.std[c]).abs() / STD_TOLERANCE).min(1.0);
        }
        mean_term /= 3.0;
        std_term /= 3.0;

        let score = 1.0 - (MEAN_WEIGHT * mean_term + STD_WEIGHT * std_term);
        Ok(score.clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "channel-statistics"
    }
}
