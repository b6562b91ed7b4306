use crate::error::PipelineError;

/// Forbidden biometric-descriptor patterns, matched case-insensitively as
/// substrings of the assembled prompt.
///
/// This is a denylist of *descriptive biometric claims* — language that
/// states facial structure, proportion, attractiveness, or demographics as
/// an aesthetic target. Neutral structural words ("face", "gaze",
/// "posture") and photographic vocabulary ("depth of field", "candid") are
/// deliberately not listed; banning anatomy words outright would make the
/// system impossible to operate.
pub const FORBIDDEN_BIOMETRIC_PATTERNS: &[&str] = &[
    // structure/proportion claims
    "jawline is",
    "jawline looks",
    "sharper jawline",
    "cheekbones are",
    "cheekbones look",
    "high cheekbones",
    "face shape is",
    "facial proportions",
    "nose is straighter",
    "eyes are larger",
    "eyes are brighter",
    "fuller lips",
    "slimmer face",
    "symmetrical face",
    // skin/complexion claims
    "skin tone is",
    "complexion is",
    "flawless skin",
    "perfect skin",
    // attractiveness claims
    "more attractive",
    "more beautiful",
    "more handsome",
    "stunningly beautiful",
    // demographics as descriptor
    "young woman",
    "young man",
    "middle-aged woman",
    "middle-aged man",
    "youthful appearance",
    "caucasian",
    "east asian features",
    "african features",
    "hispanic features",
    "ethnically",
];

/// Scans assembled prompt text for forbidden biometric descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiometricFilter;

impl BiometricFilter {
    /// Returns the first forbidden pattern found, if any.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        FORBIDDEN_BIOMETRIC_PATTERNS
            .iter()
            .find(|pattern| lowered.contains(*pattern))
            .copied()
    }

    /// Fails assembly with a policy violation when a forbidden pattern
    /// matches. The text is never silently stripped.
    pub fn scan(&self, text: &str) -> Result<(), PipelineError> {
        match self.first_match(text) {
            Some(pattern) => {
                tracing::error!(pattern, "biometric descriptor found in assembled prompt");
                Err(PipelineError::BiometricDescriptor {
                    pattern: pattern.to_string(),
                })
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("jawline is angular"; "structure claim")]
    #[test_case("make the SKIN TONE IS warmer"; "case insensitive")]
    #[test_case("a portrait of a young woman in a coat"; "demographic descriptor")]
    #[test_case("give her fuller lips and a softer look"; "geometry claim")]
    fn forbidden_descriptors_are_rejected(text: &str) {
        assert!(BiometricFilter.scan(text).is_err());
    }

    #[test_case("face must match Image 1 exactly"; "neutral structural language")]
    #[test_case("shallow depth of field"; "photographic vocabulary")]
    #[test_case("relaxed posture, candid gaze toward the street"; "neutral pose words")]
    #[test_case("do not beautify, symmetrize, or reinterpret the face"; "prohibition language")]
    fn neutral_language_is_permitted(text: &str) {
        assert_eq!(BiometricFilter.scan(text), Ok(()));
    }

    #[test]
    fn first_match_reports_the_pattern() {
        let matched = BiometricFilter.first_match("the jawline is angular here");
        assert_eq!(matched, Some("jawline is"));
    }
}
