use std::sync::Arc;

use anprobe_similarity::FaceSimilarity;
use image::RgbImage;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Outcome of the similarity gate for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateReport {
    pub passed: bool,
    pub sim_before: f32,
    pub sim_after: f32,
}

/// Hard accept/reject verdict around the untrusted generation step.
///
/// Two gates, both mandatory: compositing must improve similarity by at
/// least the configured margin, and the post-composite similarity must
/// clear the absolute floor. When either fails, the pre-composite image is
/// discarded — callers get an error, never best-effort pixels.
pub struct SimilarityGate {
    metric: Arc<dyn FaceSimilarity>,
    improvement_min: f32,
    absolute_floor: f32,
}

impl SimilarityGate {
    pub fn new(metric: Arc<dyn FaceSimilarity>, config: &PipelineConfig) -> Self {
        Self {
            metric,
            improvement_min: config.sim_improvement_min,
            absolute_floor: config.sim_absolute_floor,
        }
    }

    /// Pure threshold verdict over a pair of similarity scores.
    pub fn judge(&self, sim_before: f32, sim_after: f32) -> bool {
        sim_after >= sim_before + self.improvement_min && sim_after >= self.absolute_floor
    }

    /// Scores the original face against the pre- and post-composite regions
    /// and applies both gates.
    #[tracing::instrument(skip_all)]
    pub fn assert_improved(
        &self,
        original: &RgbImage,
        before_composite: &RgbImage,
        after_composite: &RgbImage,
    ) -> Result<GateReport, PipelineError> {
        let sim_before = self.metric.score(original, before_composite)?;
        let sim_after = self.metric.score(original, after_composite)?;
        let passed = self.judge(sim_before, sim_after);

        tracing::info!(
            metric = self.metric.name(),
            sim_before,
            sim_after,
            passed,
            "similarity gate verdict"
        );

        Ok(GateReport {
            passed,
            sim_before,
            sim_after,
        })
    }

    /// Maps a failed report to the gate error so callers cannot keep the
    /// rejected pixels by accident.
    pub fn enforce(&self, report: GateReport) -> Result<GateReport, PipelineError> {
        if report.passed {
            Ok(report)
        } else {
            Err(PipelineError::SimilarityGateFailed {
                sim_before: report.sim_before,
                sim_after: report.sim_after,
            })
        }
    }
}
