pub mod biometric;
pub mod directives;

use anprobe_types::attempt::{AssembledPrompt, GarmentDescription};
use anprobe_types::engine::{Engine, UseCase};
use anprobe_types::scene::SceneIntelOutput;

use crate::config::engine_settings;
use crate::error::PipelineError;
use biometric::BiometricFilter;
use directives::{
    CREATIVE_BLOCK_IDS, CREATIVE_RESEMBLANCE_DIRECTIVE_V1, IDENTITY_BLOCK_IDS,
    IDENTITY_PREAMBLE_V1,
};

/// Composes the final instruction payload for the generative model and
/// screens it for forbidden biometric-descriptor language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    filter: BiometricFilter,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(skip(self, scene, garment), fields(engine = %engine))]
    pub fn assemble(
        &self,
        use_case: UseCase,
        engine: Engine,
        scene: &SceneIntelOutput,
        garment: &GarmentDescription,
    ) -> Result<AssembledPrompt, PipelineError> {
        if garment.is_empty() {
            return Err(PipelineError::MissingGarment);
        }

        let settings = engine_settings(engine);
        let mut sections: Vec<String> = Vec::new();

        let required_assertions: Vec<String> = if engine.is_identity_critical() {
            sections.push(IDENTITY_PREAMBLE_V1.clone());
            IDENTITY_BLOCK_IDS.iter().map(|id| id.to_string()).collect()
        } else {
            sections.push(CREATIVE_RESEMBLANCE_DIRECTIVE_V1.to_string());
            CREATIVE_BLOCK_IDS.iter().map(|id| id.to_string()).collect()
        };

        sections.push(render_scene_section(scene));
        sections.push(render_garment_section(garment));

        let text = sections.join("\n\n");
        // a match is a policy violation; retry requires regenerated
        // scene/garment text, not silent stripping
        self.filter.scan(&text)?;

        tracing::debug!(
            use_case = %use_case,
            model_id = settings.model_id,
            chars = text.len(),
            "assembled generation prompt"
        );

        Ok(AssembledPrompt {
            text,
            model_id: settings.model_id.to_string(),
            temperature: settings.temperature,
            required_assertions,
        })
    }
}

fn render_scene_section(scene: &SceneIntelOutput) -> String {
    let mut out = format!(
        "Scene (empty environment, no people): {anchor}\nLighting mode: {lighting}. \
Pose policy: {pose}. Face policy: {face}. Camera: {camera}.",
        anchor = scene.anchor_zone,
        lighting = scene.lighting_mode,
        pose = scene.pose_policy,
        face = scene.face_policy,
        camera = scene.camera_policy,
    );
    if scene.variant_label != "base" {
        out.push_str(&format!("\nVariant mood: {}.", scene.variant_label));
    }
    if let Some(realism) = &scene.realism_guidance {
        out.push_str(&format!("\nRealism: {realism}"));
    }
    if let Some(lighting) = &scene.lighting_guidance {
        out.push_str(&format!("\nLighting notes: {lighting}"));
    }
    out
}

fn render_garment_section(garment: &GarmentDescription) -> String {
    format!(
        "Garment (from Image 2): {}. Fit the garment naturally to the subject; preserve its \
fabric, color, and construction details.",
        garment.0.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anprobe_types::scene::ScenePreset;
    use pretty_assertions::assert_eq;

    fn studio_scene() -> SceneIntelOutput {
        SceneIntelOutput {
            preset: ScenePreset::StudioWhite,
            variant_label: "base".to_string(),
            anchor_zone: "clean neutral studio backdrop with seamless paper sweep".to_string(),
            lighting_mode: Default::default(),
            pose_policy: Default::default(),
            face_policy: Default::default(),
            camera_policy: Default::default(),
            realism_guidance: Some("shallow depth of field, natural grain".to_string()),
            lighting_guidance: None,
            fallback: None,
        }
    }

    fn garment() -> GarmentDescription {
        GarmentDescription("indigo denim chore jacket with corozo buttons".to_string())
    }

    #[test]
    fn identity_prompt_carries_all_fixed_blocks() {
        let prompt = PromptAssembler::new()
            .assemble(
                UseCase::TryOn,
                Engine::IdentityLockedHighFidelity,
                &studio_scene(),
                &garment(),
            )
            .unwrap();

        assert!(prompt.text.contains("Identity lock"));
        assert!(prompt.text.contains("Strictly banned"));
        assert!(prompt.text.contains("Pose anchor"));
        assert!(prompt.text.contains("must not be the optically dominant"));
        assert!(prompt.text.contains("chore jacket"));
        assert_eq!(prompt.temperature, 0.05);
        assert_eq!(
            prompt.required_assertions,
            vec![
                "identity-lock/v1",
                "negative-drift/v1",
                "pose-anchor/v1",
                "face-deemphasis/v1"
            ]
        );
    }

    #[test]
    fn creative_prompt_uses_loose_resemblance_directive() {
        let prompt = PromptAssembler::new()
            .assemble(
                UseCase::Campaign,
                Engine::CreativeFree,
                &studio_scene(),
                &garment(),
            )
            .unwrap();

        assert!(prompt.text.contains("strongly resemble"));
        assert!(!prompt.text.contains("Identity lock"));
        assert_eq!(prompt.temperature, 0.30);
    }

    #[test]
    fn temperature_is_engine_fixed_not_request_tunable() {
        let a = PromptAssembler::new()
            .assemble(UseCase::TryOn, Engine::IdentityFast, &studio_scene(), &garment())
            .unwrap();
        let b = PromptAssembler::new()
            .assemble(UseCase::TryOn, Engine::IdentityFast, &studio_scene(), &garment())
            .unwrap();
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.model_id, b.model_id);
    }

    #[test]
    fn biometric_descriptor_in_scene_text_fails_assembly() {
        let mut scene = studio_scene();
        scene.anchor_zone = "studio where the subject's jawline is angular".to_string();
        let err = PromptAssembler::new()
            .assemble(UseCase::TryOn, Engine::IdentityFast, &scene, &garment())
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::BiometricDescriptor {
                pattern: "jawline is".to_string()
            }
        );
    }

    #[test]
    fn empty_garment_is_an_input_error() {
        let err = PromptAssembler::new()
            .assemble(
                UseCase::TryOn,
                Engine::IdentityFast,
                &studio_scene(),
                &GarmentDescription("   ".to_string()),
            )
            .unwrap_err();
        assert_eq!(err, PipelineError::MissingGarment);
    }
}
