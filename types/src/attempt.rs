use serde::{Deserialize, Serialize};

use crate::engine::{Engine, UseCase};
use crate::geometry::PixelBox;
use crate::identity::ImageHash;

/// Free-text description of the garment being tried on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarmentDescription(pub String);

impl GarmentDescription {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Final instruction payload for the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledPrompt {
    pub text: String,
    pub model_id: String,
    pub temperature: f32,
    /// Directive block identifiers that must be present in `text`; callers
    /// use these for presence assertions and observability.
    pub required_assertions: Vec<String>,
}

/// One face found in a generated image during subject selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bounds: PixelBox,
    pub area: f32,
    pub center_distance: f32,
    pub yaw_degrees: Option<f32>,
    pub roll_degrees: Option<f32>,
    pub score: f32,
}

impl DetectedFace {
    /// Builds a detection with area and center distance derived from the
    /// bounding box relative to the full image.
    pub fn from_bounds(
        bounds: PixelBox,
        yaw_degrees: Option<f32>,
        roll_degrees: Option<f32>,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let image_center = crate::geometry::Point2::new(
            image_width as f32 / 2.0,
            image_height as f32 / 2.0,
        );
        let center_distance = bounds.center().distance_to(&image_center);
        Self {
            area: bounds.area(),
            bounds,
            center_distance,
            yaw_degrees,
            roll_degrees,
            score: 0.0,
        }
    }
}

/// Terminal verdict of one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttemptVerdict {
    Accepted,
    SimilarityRejected { sim_before: f32, sim_after: f32 },
    DetectionFailed,
    Failed { message: String },
}

/// The unit of work flowing through the pipeline. One attempt produces at
/// most one accepted image; rejected attempts are surfaced to the caller and
/// never retried automatically by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAttempt {
    pub use_case: UseCase,
    pub engine: Engine,
    pub identity_image: ImageHash,
    pub garment_image: ImageHash,
    pub prompt: Option<AssembledPrompt>,
    #[serde(skip)]
    pub result_image: Option<Vec<u8>>,
    pub sim_before: Option<f32>,
    pub sim_after: Option<f32>,
    pub verdict: Option<AttemptVerdict>,
}

impl GenerationAttempt {
    pub fn new(
        use_case: UseCase,
        engine: Engine,
        identity_image: ImageHash,
        garment_image: ImageHash,
    ) -> Self {
        Self {
            use_case,
            engine,
            identity_image,
            garment_image,
            prompt: None,
            result_image: None,
            sim_before: None,
            sim_after: None,
            verdict: None,
        }
    }
}
