pub mod heuristic;
pub mod polygon;
pub mod selector;

use anprobe_types::attempt::DetectedFace;
use anprobe_types::geometry::{NormalizedBox, Point2};
use image::DynamicImage;

/// Face geometry for one image: a normalized bounding box, plus landmarks
/// when the provider can supply them (order: left eye, right eye, nose tip,
/// left mouth corner, right mouth corner).
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    pub bounds: NormalizedBox,
    pub landmarks: Option<[Point2; 5]>,
}

/// Pluggable face-geometry source for identity images.
///
/// The pipeline does not care whether the region came from a real landmark
/// model or the aspect-ratio heuristic; [`heuristic::AspectRatioHeuristic`]
/// is the always-available fallback, real-detector adapters are preferred
/// when wired in.
pub trait FaceGeometryProvider: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Option<FaceGeometry>;
}

/// Face detection over *generated* images, where reflections, posters, and
/// background people can produce multiple candidates.
pub trait SubjectFaceDetector: Send + Sync {
    fn detect_faces(&self, image: &DynamicImage) -> Vec<DetectedFace>;
}
