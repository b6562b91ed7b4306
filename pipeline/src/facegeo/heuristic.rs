use anprobe_types::attempt::DetectedFace;
use anprobe_types::geometry::NormalizedBox;
use image::DynamicImage;

use super::{FaceGeometry, FaceGeometryProvider, SubjectFaceDetector};

/// Aspect ratio below which an image is treated as portrait-tall.
const PORTRAIT_ASPECT_MAX: f32 = 0.90;
/// Aspect ratio above which an image is treated as landscape.
const LANDSCAPE_ASPECT_MIN: f32 = 1.20;

/// Estimates a face bounding box from image dimensions alone.
///
/// Intentionally approximate: with no landmark model wired in, this gives
/// *some* workable region per aspect-ratio class. Portrait-tall framing puts
/// the face in the upper part of the frame; landscape framing centers it in
/// a mid-frame band; square-ish images get a default band between the two.
pub fn estimate_bounds(width: u32, height: u32) -> NormalizedBox {
    let aspect = width as f32 / height.max(1) as f32;

    let (left, top, right, bottom) = if aspect < PORTRAIT_ASPECT_MAX {
        // face occupies the upper ~45% of height
        (0.25, 0.05, 0.75, 0.45)
    } else if aspect > LANDSCAPE_ASPECT_MIN {
        // centered band spanning roughly 30-85% of the horizontal axis
        (0.30, 0.10, 0.85, 0.62)
    } else {
        (0.28, 0.08, 0.72, 0.50)
    };

    // the fixed fractions are always monotonic and in range
    NormalizedBox::new(left, top, right, bottom)
        .expect("heuristic bands are monotonic by construction")
}

/// The fallback [`FaceGeometryProvider`] and [`SubjectFaceDetector`]: one
/// face per image, located purely by the aspect-ratio heuristic, with no
/// landmark or orientation estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct AspectRatioHeuristic;

impl FaceGeometryProvider for AspectRatioHeuristic {
    fn detect(&self, image: &DynamicImage) -> Option<FaceGeometry> {
        Some(FaceGeometry {
            bounds: estimate_bounds(image.width(), image.height()),
            landmarks: None,
        })
    }
}

impl SubjectFaceDetector for AspectRatioHeuristic {
    fn detect_faces(&self, image: &DynamicImage) -> Vec<DetectedFace> {
        let (width, height) = (image.width(), image.height());
        let bounds = estimate_bounds(width, height).to_pixels(width, height);
        vec![DetectedFace::from_bounds(bounds, None, None, width, height)]
    }
}
