use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Fixed, enumerated set of person-agnostic scene presets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenePreset {
    StudioWhite,
    UrbanStreet,
    CafeInterior,
    LoftDaylight,
    CoastalGoldenHour,
    GardenOvercast,
    OfficeModern,
    NightCityBokeh,
}

/// Lighting is always derived from the resolved environment, never from a
/// per-request override. Single-variant by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum LightingMode {
    #[default]
    #[serde(rename = "environment-coherent")]
    #[strum(serialize = "environment-coherent")]
    EnvironmentCoherent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum PosePolicy {
    #[default]
    #[serde(rename = "inherit-from-identity")]
    #[strum(serialize = "inherit-from-identity")]
    InheritFromIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum FacePolicy {
    #[default]
    #[serde(rename = "immutable")]
    #[strum(serialize = "immutable")]
    Immutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum CameraPolicy {
    #[default]
    #[serde(rename = "inherit")]
    #[strum(serialize = "inherit")]
    Inherit,
}

/// Record of a scene resolution that fell back to the deterministic safe
/// preset instead of a model-resolved scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub reason: String,
    pub safe_preset: ScenePreset,
}

/// Resolved scene intelligence consumed by the prompt assembler.
///
/// The four policy fields are architectural guarantees forced to their fixed
/// values by the resolver regardless of what any external model returns. The
/// anchor zone describes an empty environment only; person descriptions are
/// screened out downstream by the biometric filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneIntelOutput {
    pub preset: ScenePreset,
    pub variant_label: String,
    pub anchor_zone: String,
    pub lighting_mode: LightingMode,
    pub pose_policy: PosePolicy,
    pub face_policy: FacePolicy,
    pub camera_policy: CameraPolicy,
    pub realism_guidance: Option<String>,
    pub lighting_guidance: Option<String>,
    pub fallback: Option<FallbackRecord>,
}

/// Intended stylistic mood of one variant in a three-variant run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariantMood {
    Editorial,
    Candid,
    Environmental,
}

impl VariantMood {
    pub fn all() -> [VariantMood; 3] {
        [
            VariantMood::Editorial,
            VariantMood::Candid,
            VariantMood::Environmental,
        ]
    }

    pub fn description(&self) -> &'static str {
        match self {
            VariantMood::Editorial => {
                "polished magazine framing, deliberate negative space, controlled contrast"
            }
            VariantMood::Candid => {
                "off-guard moment, loose framing, natural motion and imperfect light"
            }
            VariantMood::Environmental => {
                "wide framing where the location dominates, subject integrated into the setting"
            }
        }
    }
}
