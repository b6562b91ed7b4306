use image::RgbImage;

use crate::error::Error;
use crate::FaceSimilarity;

/// Produces a fixed-length face embedding from a face-region crop.
///
/// Adapters over real recognition models (ArcFace-style ONNX graphs, hosted
/// embedding endpoints) implement this; the pipeline only ever sees the
/// [`FaceSimilarity`] trait built on top of it.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, face: &RgbImage) -> Result<Vec<f32>, Error>;
}

/// Cosine similarity over embeddings from a pluggable [`FaceEmbedder`].
///
/// Strictly more reliable than the channel-statistics proxy. Gate thresholds
/// must be re-tuned when switching to this metric.
pub struct EmbeddingSimilarity<E> {
    embedder: E,
}

impl<E: FaceEmbedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32, Error> {
    if left.len() != right.len() {
        return Err(Error::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    let mut dot = 0.0f32;
    let mut norm_l = 0.0f32;
    let mut norm_r = 0.0f32;
    for (a, b) in left.iter().zip(right.iter()) {
        dot += a * b;
        norm_l += a * a;
        norm_r += b * b;
    }
    if norm_l == 0.0 || norm_r == 0.0 {
        return Err(Error::ZeroVector);
    }
    Ok(dot / (norm_l.sqrt() * norm_r.sqrt()))
}

impl<E: FaceEmbedder> FaceSimilarity for EmbeddingSimilarity<E> {
    fn score(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<f32, Error> {
        if reference.width() == 0 || candidate.width() == 0 {
            return Err(Error::EmptyRegion);
        }
        let left = self.embedder.embed(reference)?;
        let right = self.embedder.embed(candidate)?;
        // face embeddings live in the positive-cosine region; negative
        // similarity carries no extra signal for gating
        Ok(cosine_similarity(&left, &right)?.clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "embedding-cosine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct MeanEmbedder;

    impl FaceEmbedder for MeanEmbedder {
        fn embed(&self, face: &RgbImage) -> Result<Vec<f32>, Error> {
            let n = (face.width() * face.height()) as f32;
            let mut sums = [0.0f32; 3];
            for p in face.pixels() {
                for c in 0..3 {
                    sums[c] += p.0[c] as f32;
                }
            }
            Ok(sums.iter().map(|s| s / n).collect())
        }
    }

    #[test]
    fn cosine_rejects_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { left: 2, right: 3 });
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn embedding_metric_scores_identical_faces_at_one() {
        let img = RgbImage::from_pixel(16, 16, image::Rgb([120, 80, 40]));
        let metric = EmbeddingSimilarity::new(MeanEmbedder);
        let score = metric.score(&img, &img).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }
}
