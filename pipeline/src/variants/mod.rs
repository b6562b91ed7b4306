use std::sync::Arc;
use std::time::Duration;

use anprobe_types::scene::VariantMood;
use serde::Deserialize;

use crate::client::{call_with_guardrails, ExternalService, ReasoningModel};
use crate::config::PipelineConfig;
use crate::error::PipelineError;

const VARIANT_COMPARE_INSTRUCTIONS_V1: &str = "Compare the two attached renders of the same \
person, garment, and scene request. Score how visually different they are from 0 (identical) to \
100 (completely different), weighing lighting, framing, background emphasis, and pose energy \
equally. Reply with strict JSON: {\"difference\": <0-100>}.";

/// One candidate in a three-variant run.
#[derive(Debug, Clone)]
pub struct VariantCandidate {
    pub mood: VariantMood,
    pub image: Vec<u8>,
}

/// Pairwise difference between two variants. `score` is `None` when the
/// judge call failed and the pair was assumed sufficiently different.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub left: VariantMood,
    pub right: VariantMood,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantReport {
    pub pair_scores: Vec<PairScore>,
    pub too_similar: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompareReply {
    difference: u8,
}

/// Confirms that the three stylistic variants of one request are visually
/// distinct enough to ship together.
///
/// Judge failures fail open: a pair that could not be compared is assumed
/// sufficiently different rather than blocking the pipeline.
pub struct MultiVariantValidator {
    reasoning: Arc<dyn ReasoningModel>,
    difference_floor: u8,
    call_timeout: Duration,
}

impl MultiVariantValidator {
    pub fn new(reasoning: Arc<dyn ReasoningModel>, config: &PipelineConfig) -> Self {
        Self {
            reasoning,
            difference_floor: config.variant_difference_floor,
            call_timeout: config.external_call_timeout,
        }
    }

    #[tracing::instrument(skip(self, candidates))]
    pub async fn validate(&self, candidates: &[VariantCandidate; 3]) -> VariantReport {
        let mut pair_scores = Vec::with_capacity(3);
        for (i, j) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let score = match self.score_pair(&candidates[i], &candidates[j]).await {
                Ok(score) => Some(score),
                Err(err) => {
                    tracing::warn!(
                        left = %candidates[i].mood,
                        right = %candidates[j].mood,
                        %err,
                        "variant comparison failed, assuming sufficiently different"
                    );
                    None
                }
            };
            pair_scores.push(PairScore {
                left: candidates[i].mood,
                right: candidates[j].mood,
                score,
            });
        }

        let too_similar = pair_scores
            .iter()
            .any(|pair| matches!(pair.score, Some(s) if s < self.difference_floor));
        if too_similar {
            tracing::warn!(?pair_scores, "variant set is too similar, caller should regenerate");
        }

        VariantReport {
            pair_scores,
            too_similar,
        }
    }

    async fn score_pair(
        &self,
        left: &VariantCandidate,
        right: &VariantCandidate,
    ) -> Result<u8, PipelineError> {
        let value = call_with_guardrails(ExternalService::ReasoningModel, self.call_timeout, || {
            self.reasoning.judge(
                VARIANT_COMPARE_INSTRUCTIONS_V1.to_string(),
                vec![left.image.clone(), right.image.clone()],
            )
        })
        .await?;
        let reply: CompareReply =
            serde_json::from_value(value).map_err(|e| PipelineError::MalformedModelOutput {
                service: ExternalService::ReasoningModel,
                message: e.to_string(),
            })?;
        Ok(reply.difference.min(100))
    }
}

/// Stronger per-variant differentiation instructions for a regeneration
/// round after a too-similar verdict.
pub fn differentiation_block(moods: &[VariantMood]) -> String {
    let mut out = String::from(
        "Each variant must be clearly distinguishable at a glance. Commit fully to the assigned \
mood; do not converge on a middle ground:",
    );
    for mood in moods {
        out.push_str(&format!("\n- {mood}: {}", mood.description()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SequencedJudge {
        scores: Vec<Result<serde_json::Value, ()>>,
        cursor: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ReasoningModel for SequencedJudge {
        async fn judge(
            &self,
            _instructions: String,
            images: Vec<Vec<u8>>,
        ) -> Result<serde_json::Value, PipelineError> {
            assert_eq!(images.len(), 2);
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.scores[index]
                .clone()
                .map_err(|_| PipelineError::ServiceRejectedRequest {
                    service: ExternalService::ReasoningModel,
                    status: 422,
                    message: "scripted".into(),
                })
        }
    }

    fn candidates() -> [VariantCandidate; 3] {
        VariantMood::all().map(|mood| VariantCandidate {
            mood,
            image: vec![mood as u8; 8],
        })
    }

    fn validator(scores: Vec<Result<serde_json::Value, ()>>) -> MultiVariantValidator {
        MultiVariantValidator::new(
            Arc::new(SequencedJudge {
                scores,
                cursor: AtomicUsize::new(0),
            }),
            &PipelineConfig::default(),
        )
    }

    fn difference(score: u8) -> Result<serde_json::Value, ()> {
        Ok(serde_json::json!({ "difference": score }))
    }

    #[tokio::test]
    async fn one_low_pair_flags_the_whole_set() {
        let report = validator(vec![difference(45), difference(50), difference(20)])
            .validate(&candidates())
            .await;

        assert!(report.too_similar);
        assert_eq!(report.pair_scores.len(), 3);
        assert_eq!(report.pair_scores[2].score, Some(20));
    }

    #[tokio::test]
    async fn distinct_variants_pass() {
        let report = validator(vec![difference(45), difference(50), difference(31)])
            .validate(&candidates())
            .await;
        assert!(!report.too_similar);
    }

    #[tokio::test]
    async fn judge_failure_fails_open() {
        let report = validator(vec![Err(()), Err(()), Err(())])
            .validate(&candidates())
            .await;

        assert!(!report.too_similar);
        assert!(report.pair_scores.iter().all(|p| p.score.is_none()));
    }

    #[tokio::test]
    async fn boundary_score_at_the_floor_is_not_too_similar() {
        let report = validator(vec![difference(30), difference(80), difference(80)])
            .validate(&candidates())
            .await;
        assert!(!report.too_similar);
    }

    #[test]
    fn differentiation_block_names_every_mood() {
        let block = differentiation_block(&VariantMood::all());
        assert!(block.contains("editorial"));
        assert!(block.contains("candid"));
        assert!(block.contains("environmental"));
    }
}
