pub mod presets;

use std::sync::Arc;
use std::time::Duration;

use anprobe_types::identity::ImageHash;
use anprobe_types::scene::{FallbackRecord, SceneIntelOutput, ScenePreset};
use serde::Deserialize;

use crate::client::{call_with_guardrails, ExternalService, ReasoningModel};
use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// The deterministic safe preset every failure path lands on.
pub const SAFE_PRESET: ScenePreset = ScenePreset::StudioWhite;

const DEFAULT_REALISM_GUIDANCE: &str =
    "natural photographic grain, believable contact shadows, unforced color";

const SCENE_MAPPING_INSTRUCTIONS_V1: &str = "Map the user's scene request onto exactly one of \
the listed preset ids. Describe only the empty environment (location, light quality, camera \
intent). Never describe a person. Reply with strict JSON: {\"preset\": \"<id>\", \
\"variant_label\": \"<short label>\", \"anchor_zone\": \"<environment description>\", \
\"realism_guidance\": \"<optional>\", \"lighting_guidance\": \"<optional>\"}.";

const SCENE_REFINEMENT_INSTRUCTIONS_V1: &str = "The scene description below is authoritative \
and must not be replaced. Supply only camera and lighting realism language that fits it. Reply \
with strict JSON: {\"realism_guidance\": \"<text>\", \"lighting_guidance\": \"<optional>\"}.";

/// Caller-supplied scene request. A concrete preset description wins over a
/// preset id, which wins over free text.
#[derive(Debug, Clone, Default)]
pub struct SceneRequest {
    pub free_text: Option<String>,
    pub preset: Option<ScenePreset>,
    pub preset_description: Option<String>,
    pub identity_image: Option<ImageHash>,
}

impl SceneRequest {
    pub fn preset(preset: ScenePreset) -> Self {
        Self {
            preset: Some(preset),
            ..Default::default()
        }
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            free_text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MappingReply {
    preset: ScenePreset,
    variant_label: Option<String>,
    anchor_zone: String,
    realism_guidance: Option<String>,
    lighting_guidance: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RefinementReply {
    realism_guidance: String,
    lighting_guidance: Option<String>,
}

/// Turns a scene request into a strict, person-agnostic environment
/// description.
///
/// Resolution is infallible by contract: any external failure degrades to a
/// deterministic output rather than erroring the pipeline. The four policy
/// fields are fixed architectural guarantees and are set by construction —
/// nothing the external model returns can move them.
pub struct SceneResolver {
    reasoning: Arc<dyn ReasoningModel>,
    call_timeout: Duration,
}

impl SceneResolver {
    pub fn new(reasoning: Arc<dyn ReasoningModel>, config: &PipelineConfig) -> Self {
        Self {
            reasoning,
            call_timeout: config.external_call_timeout,
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn resolve(&self, request: &SceneRequest) -> SceneIntelOutput {
        if let Some(description) = &request.preset_description {
            let preset = request.preset.unwrap_or(SAFE_PRESET);
            return self.resolve_authoritative(preset, description).await;
        }
        if let Some(preset) = request.preset {
            return self
                .resolve_authoritative(preset, presets::anchor_zone(preset))
                .await;
        }
        if let Some(text) = &request.free_text {
            match self.map_free_text(text).await {
                Ok(output) => return output,
                Err(err) => {
                    tracing::warn!(%err, "free-text scene mapping failed, using safe preset");
                    return safe_fallback(format!("free-text mapping failed: {err}"));
                }
            }
        }
        safe_fallback("no scene request supplied".to_string())
    }

    /// A supplied description is never replaced; the model is only asked to
    /// refine realism language around it, with a local default if that fails.
    async fn resolve_authoritative(
        &self,
        preset: ScenePreset,
        description: &str,
    ) -> SceneIntelOutput {
        let (realism, lighting) = match self.refine_guidance(description).await {
            Ok(reply) => (reply.realism_guidance, reply.lighting_guidance),
            Err(err) => {
                tracing::debug!(%err, "guidance refinement degraded to local default");
                (DEFAULT_REALISM_GUIDANCE.to_string(), None)
            }
        };

        SceneIntelOutput {
            preset,
            variant_label: "base".to_string(),
            anchor_zone: description.to_string(),
            lighting_mode: Default::default(),
            pose_policy: Default::default(),
            face_policy: Default::default(),
            camera_policy: Default::default(),
            realism_guidance: Some(realism),
            lighting_guidance: lighting,
            fallback: None,
        }
    }

    async fn refine_guidance(&self, description: &str) -> Result<RefinementReply, PipelineError> {
        let instructions =
            format!("{SCENE_REFINEMENT_INSTRUCTIONS_V1}\n\nScene description: {description}");
        let value = call_with_guardrails(ExternalService::ReasoningModel, self.call_timeout, || {
            self.reasoning.judge(instructions.clone(), Vec::new())
        })
        .await?;
        serde_json::from_value(value).map_err(|e| PipelineError::MalformedModelOutput {
            service: ExternalService::ReasoningModel,
            message: e.to_string(),
        })
    }

    async fn map_free_text(&self, text: &str) -> Result<SceneIntelOutput, PipelineError> {
        let instructions = format!(
            "{SCENE_MAPPING_INSTRUCTIONS_V1}\n\nPreset ids: {}\n\nUser request: {text}",
            presets::preset_id_listing()
        );
        let value = call_with_guardrails(ExternalService::ReasoningModel, self.call_timeout, || {
            self.reasoning.judge(instructions.clone(), Vec::new())
        })
        .await?;
        let reply: MappingReply =
            serde_json::from_value(value).map_err(|e| PipelineError::MalformedModelOutput {
                service: ExternalService::ReasoningModel,
                message: e.to_string(),
            })?;

        Ok(SceneIntelOutput {
            preset: reply.preset,
            variant_label: reply.variant_label.unwrap_or_else(|| "base".to_string()),
            anchor_zone: reply.anchor_zone,
            lighting_mode: Default::default(),
            pose_policy: Default::default(),
            face_policy: Default::default(),
            camera_policy: Default::default(),
            realism_guidance: reply.realism_guidance,
            lighting_guidance: reply.lighting_guidance,
            fallback: None,
        })
    }
}

/// The hard-coded deterministic landing spot for every resolution failure.
pub fn safe_fallback(reason: String) -> SceneIntelOutput {
    SceneIntelOutput {
        preset: SAFE_PRESET,
        variant_label: "base".to_string(),
        anchor_zone: presets::anchor_zone(SAFE_PRESET).to_string(),
        lighting_mode: Default::default(),
        pose_policy: Default::default(),
        face_policy: Default::default(),
        camera_policy: Default::default(),
        realism_guidance: Some(DEFAULT_REALISM_GUIDANCE.to_string()),
        lighting_guidance: None,
        fallback: Some(FallbackRecord {
            reason,
            safe_preset: SAFE_PRESET,
        }),
    }
}
