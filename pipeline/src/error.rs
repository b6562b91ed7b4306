use anprobe_types::engine::{Engine, UseCase};
use thiserror::Error;

use crate::client::ExternalService;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    // -- configuration / policy violations: programming errors, never retried
    #[error("engine [{engine}] is architecturally forbidden for use case [{use_case}]")]
    ForbiddenEngineForUseCase { use_case: UseCase, engine: Engine },
    #[error("assembled prompt contains forbidden biometric descriptor [{pattern}]")]
    BiometricDescriptor { pattern: String },
    #[error("generation call carries {got} reference images, contract requires two or three")]
    WrongImageCount { got: usize },

    // -- input errors: rejected request, caller supplies better input
    #[error("input image could not be used: {0}")]
    InvalidInputImage(String),
    #[error("garment description is missing or empty")]
    MissingGarment,

    // -- detection failures: attempt failed, caller may retry the whole attempt
    #[error("no usable subject face in the generated image")]
    NoSubjectFace,
    #[error("face region extraction failed: {0}")]
    FaceRegionExtraction(String),

    // -- similarity-gate failure: generation happened but failed the identity check
    #[error("similarity gate failed: before {sim_before:.3}, after {sim_after:.3}")]
    SimilarityGateFailed { sim_before: f32, sim_after: f32 },

    // -- external-service failures
    #[error("{service} unavailable: {message}")]
    ServiceUnavailable {
        service: ExternalService,
        message: String,
    },
    #[error("{service} rejected the request with status {status}: {message}")]
    ServiceRejectedRequest {
        service: ExternalService,
        status: u16,
        message: String,
    },
    #[error("{service} returned malformed output: {message}")]
    MalformedModelOutput {
        service: ExternalService,
        message: String,
    },

    #[error("request was cancelled by the caller")]
    Cancelled,

    #[error("similarity metric error: {0}")]
    Similarity(#[from] anprobe_similarity::Error),
    #[error("geometry error: {0}")]
    Geometry(#[from] anprobe_types::geometry::GeometryError),
}

impl PipelineError {
    /// Whether the failure is a transient transport condition eligible for
    /// the single bounded automatic retry. Content-policy and validation
    /// failures are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::ServiceUnavailable { .. })
    }

    /// Configuration/policy violations are programming errors and always
    /// fatal; callers surface these as internal errors rather than
    /// "try a different photo" or "try again".
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            PipelineError::ForbiddenEngineForUseCase { .. }
                | PipelineError::BiometricDescriptor { .. }
                | PipelineError::WrongImageCount { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification_is_transport_only() {
        let transient = PipelineError::ServiceUnavailable {
            service: ExternalService::GenerativeModel,
            message: "timeout".into(),
        };
        assert!(transient.is_transient());

        let rejected = PipelineError::ServiceRejectedRequest {
            service: ExternalService::GenerativeModel,
            status: 422,
            message: "content policy".into(),
        };
        assert!(!rejected.is_transient());
        assert!(!PipelineError::NoSubjectFace.is_transient());
    }

    #[test]
    fn policy_violations_are_flagged_fatal() {
        assert!(PipelineError::WrongImageCount { got: 5 }.is_policy_violation());
        assert!(!PipelineError::NoSubjectFace.is_policy_violation());
    }
}
