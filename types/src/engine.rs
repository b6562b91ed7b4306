use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Business use case a generation request belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum UseCase {
    #[serde(rename = "tryon")]
    #[strum(serialize = "tryon")]
    TryOn,
    #[serde(rename = "ugc")]
    #[strum(serialize = "ugc")]
    Ugc,
    #[serde(rename = "campaign")]
    #[strum(serialize = "campaign")]
    Campaign,
}

/// A named (model, temperature, prompt-style) generation configuration.
///
/// The identity-critical engines carry the pixel-reuse guarantee; the
/// free-creative engine has no identity constraint and is known to drift
/// facial identity, which is why routing forbids it for try-on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Engine {
    #[serde(rename = "identity-fast")]
    #[strum(serialize = "identity-fast")]
    IdentityFast,
    #[serde(rename = "identity-locked-high-fidelity")]
    #[strum(serialize = "identity-locked-high-fidelity")]
    IdentityLockedHighFidelity,
    #[serde(rename = "creative-free")]
    #[strum(serialize = "creative-free")]
    CreativeFree,
}

impl Engine {
    pub fn is_identity_critical(&self) -> bool {
        matches!(self, Engine::IdentityFast | Engine::IdentityLockedHighFidelity)
    }

    /// Human-readable description emitted with routing records.
    pub fn description(&self) -> &'static str {
        match self {
            Engine::IdentityFast => "low-latency identity-preserving engine",
            Engine::IdentityLockedHighFidelity => {
                "high-fidelity engine with full identity lock and face-crop reference"
            }
            Engine::CreativeFree => "unconstrained creative engine without identity guarantees",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_serialize_to_wire_names() {
        assert_eq!(UseCase::TryOn.to_string(), "tryon");
        assert_eq!(
            Engine::IdentityLockedHighFidelity.to_string(),
            "identity-locked-high-fidelity"
        );
        let json = serde_json::to_string(&Engine::CreativeFree).unwrap();
        assert_eq!(json, "\"creative-free\"");
    }

    #[test]
    fn identity_critical_split() {
        assert!(Engine::IdentityFast.is_identity_critical());
        assert!(Engine::IdentityLockedHighFidelity.is_identity_critical());
        assert!(!Engine::CreativeFree.is_identity_critical());
    }
}
