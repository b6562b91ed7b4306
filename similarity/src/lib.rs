use image::RgbImage;

pub mod embedding;
pub mod error;
pub mod stats;

pub use error::Error;

/// Similarity between two face-region crops, in [0, 1].
///
/// Implementations do not require the two regions to share dimensions; any
/// normalization is internal to the metric. Higher is more similar. The gate
/// thresholds consuming these scores are tuned per metric and do not
/// transfer between implementations without revalidation.
pub trait FaceSimilarity: Send + Sync {
    fn score(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<f32, Error>;

    /// Short metric name for logging.
    fn name(&self) -> &'static str;
}
