//! Versioned prompt-directive blocks.
//!
//! These are append-only configuration assets: the exact wording is load
//! bearing (it is what the biometric filter and the presence assertions are
//! tested against), so blocks are named constants composed by pure
//! functions, never re-derived per request. A wording change is a new
//! version, not an edit.

use once_cell::sync::Lazy;

pub const IDENTITY_LOCK_DIRECTIVE_V1: &str = "Identity lock: reuse the pixels of the face in \
Image 1 exactly as supplied. Do not beautify, symmetrize, or reinterpret the face. The face must \
match Image 1 exactly.";

pub const NEGATIVE_DRIFT_BANS_V1: &str = "Strictly banned: inventing facial features; smoothing \
or retouching skin; changing eye, eyebrow, or lip geometry; balancing or correcting asymmetry; \
altering apparent age.";

pub const POSE_ANCHOR_DIRECTIVE_V1: &str = "Pose anchor: keep head orientation within 4 degrees \
of the identity image. Body pose follows the identity image unless the garment requires \
adjustment.";

pub const FACE_DEEMPHASIS_DIRECTIVE_V1: &str = "Composition: the face must not be the optically \
dominant element of the frame. Emphasize the garment and the scene; keep the face in natural, \
unexaggerated focus.";

pub const CREATIVE_RESEMBLANCE_DIRECTIVE_V1: &str = "The subject should strongly resemble the \
person in Image 1. Mild photographic refinement is acceptable; do not change who the person \
appears to be.";

/// Block identifiers reported as required assertions with each assembled
/// prompt, in composition order.
pub const IDENTITY_BLOCK_IDS: [&str; 4] = [
    "identity-lock/v1",
    "negative-drift/v1",
    "pose-anchor/v1",
    "face-deemphasis/v1",
];

pub const CREATIVE_BLOCK_IDS: [&str; 1] = ["creative-resemblance/v1"];

/// The fixed, non-negotiable blocks for identity-critical engines, in the
/// order they are composed.
pub fn identity_critical_blocks() -> [&'static str; 4] {
    [
        IDENTITY_LOCK_DIRECTIVE_V1,
        NEGATIVE_DRIFT_BANS_V1,
        POSE_ANCHOR_DIRECTIVE_V1,
        FACE_DEEMPHASIS_DIRECTIVE_V1,
    ]
}

/// The identity-critical blocks pre-joined once; assembled per request by
/// concatenation with the scene and garment sections, never re-derived.
pub static IDENTITY_PREAMBLE_V1: Lazy<String> =
    Lazy::new(|| identity_critical_blocks().join("\n\n"));
