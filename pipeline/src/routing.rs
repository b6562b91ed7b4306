use anprobe_types::engine::{Engine, UseCase};

use crate::error::PipelineError;

/// Routing authorization for one (use case, engine) pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub use_case: UseCase,
    pub engine: Engine,
    /// Present when the pairing is allowed but known to be
    /// quality-suboptimal for the use case.
    pub quality_note: Option<&'static str>,
}

/// Enforces which generation engine may serve which use case. Runs before
/// any external network call.
pub struct RoutingGuard;

impl RoutingGuard {
    #[tracing::instrument]
    pub fn authorize(use_case: UseCase, engine: Engine) -> Result<RoutingDecision, PipelineError> {
        let quality_note = match (use_case, engine) {
            // the free-creative engine has no identity constraint and drifts
            // facial identity, so it can never serve try-on
            (UseCase::TryOn, Engine::CreativeFree) => {
                tracing::error!(
                    use_case = %use_case,
                    engine = %engine,
                    "rejected forbidden engine/use-case pairing"
                );
                return Err(PipelineError::ForbiddenEngineForUseCase { use_case, engine });
            }
            (UseCase::TryOn, _) => None,
            (UseCase::Ugc | UseCase::Campaign, Engine::IdentityFast) => {
                Some("identity-fast is quality-suboptimal outside try-on")
            }
            (UseCase::Ugc | UseCase::Campaign, _) => None,
        };

        if let Some(note) = quality_note {
            tracing::warn!(use_case = %use_case, engine = %engine, note, "suboptimal routing");
        }
        tracing::info!(
            use_case = %use_case,
            engine = %engine,
            engine_description = engine.description(),
            "authorized generation route"
        );

        Ok(RoutingDecision {
            use_case,
            engine,
            quality_note,
        })
    }
}
