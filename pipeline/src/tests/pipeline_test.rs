use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anprobe_similarity::stats::ChannelStatistics;
use anprobe_types::attempt::{AttemptVerdict, GarmentDescription};
use anprobe_types::engine::{Engine, UseCase};
use anprobe_types::identity::SessionId;
use anprobe_types::scene::ScenePreset;
use image::{DynamicImage, ImageFormat, RgbImage};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use crate::client::{AspectRatio, GenerationRequest, GenerativeModel, ReasoningModel};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::facegeo::heuristic::{estimate_bounds, AspectRatioHeuristic};
use crate::orchestrator::{PipelineDependencies, TryOnPipeline, TryOnRequest};
use crate::scene::SceneRequest;

fn encode(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Portrait identity photo, aspect 0.75, with enough texture for the
/// statistics metric to see tone drift.
fn identity_png() -> Vec<u8> {
    let img = RgbImage::from_fn(384, 512, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(&DynamicImage::ImageRgb8(img))
}

fn garment_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, image::Rgb([40, 52, 110]));
    encode(&DynamicImage::ImageRgb8(img))
}

/// Generative-model stand-in: echoes the identity image back, optionally
/// with a strong tone drift across the face region and a painted garment
/// band, the way a drifting generator would.
struct EchoingGenerator {
    drift_face: bool,
    calls: AtomicUsize,
}

impl EchoingGenerator {
    fn new(drift_face: bool) -> Self {
        Self {
            drift_face,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl GenerativeModel for EchoingGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<u8>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let identity = image::load_from_memory(&request.images[0].bytes).unwrap();
        let mut out = identity.to_rgb8();
        let (w, h) = (out.width(), out.height());

        if self.drift_face {
            let face = estimate_bounds(w, h).to_pixels(w, h);
            for y in face.y..face.bottom() {
                for x in face.x..face.right() {
                    let p = out.get_pixel_mut(x, y);
                    for c in 0..3 {
                        p.0[c] = p.0[c].saturating_add(90);
                    }
                }
            }
        }
        // painted garment band over the torso
        for y in (h * 6 / 10)..h {
            for x in 0..w {
                out.put_pixel(x, y, image::Rgb([40, 52, 110]));
            }
        }
        Ok(encode(&DynamicImage::ImageRgb8(out)))
    }
}

/// Reasoning-model stand-in that answers both scene refinement and variant
/// comparison, the latter from a scripted score sequence.
struct ScriptedReasoning {
    compare_scores: Vec<u8>,
    compare_cursor: AtomicUsize,
}

impl ScriptedReasoning {
    fn new(compare_scores: Vec<u8>) -> Self {
        Self {
            compare_scores,
            compare_cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ReasoningModel for ScriptedReasoning {
    async fn judge(
        &self,
        instructions: String,
        _images: Vec<Vec<u8>>,
    ) -> Result<serde_json::Value, PipelineError> {
        if instructions.contains("Score how visually different") {
            let index = self.compare_cursor.fetch_add(1, Ordering::SeqCst);
            let score = self.compare_scores[index % self.compare_scores.len()];
            return Ok(serde_json::json!({ "difference": score }));
        }
        Ok(serde_json::json!({
            "realism_guidance": "soft natural grain",
            "lighting_guidance": null
        }))
    }
}

fn pipeline(drift_face: bool, compare_scores: Vec<u8>) -> (TryOnPipeline, Arc<EchoingGenerator>) {
    let generator = Arc::new(EchoingGenerator::new(drift_face));
    let deps = PipelineDependencies {
        generative: generator.clone(),
        reasoning: Arc::new(ScriptedReasoning::new(compare_scores)),
        geometry_provider: Arc::new(AspectRatioHeuristic),
        subject_detector: Arc::new(AspectRatioHeuristic),
        metric: Arc::new(ChannelStatistics),
    };
    (TryOnPipeline::new(deps, PipelineConfig::default()), generator)
}

fn tryon_request(engine: Engine) -> TryOnRequest {
    TryOnRequest {
        session: SessionId("session-e2e".into()),
        use_case: UseCase::TryOn,
        engine,
        identity_image: identity_png(),
        garment_image: garment_png(),
        garment: GarmentDescription("indigo denim chore jacket".into()),
        scene: SceneRequest::preset(ScenePreset::StudioWhite),
        aspect_ratio: AspectRatio::Portrait,
    }
}

#[tokio::test]
async fn drifted_generation_is_recovered_and_accepted() {
    let (pipeline, _) = pipeline(true, vec![]);
    let accepted = pipeline
        .run_attempt(
            tryon_request(Engine::IdentityLockedHighFidelity),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(accepted.report.passed);
    assert!(accepted.report.sim_after >= 0.80);
    assert!(accepted.report.sim_after >= accepted.report.sim_before + 0.05);
    assert_eq!(accepted.attempt.verdict, Some(AttemptVerdict::Accepted));
    // the output is a decodable image of the generated dimensions
    let out = image::load_from_memory(&accepted.png).unwrap();
    assert_eq!((out.width(), out.height()), (384, 512));
    // the prompt that produced it carried the identity-lock blocks
    let prompt = accepted.attempt.prompt.unwrap();
    assert!(prompt.text.contains("Identity lock"));
    assert_eq!(prompt.temperature, 0.05);
}

#[tokio::test]
async fn outcome_is_always_accept_or_gate_failure() {
    // a generator that does not drift leaves no room for improvement, so
    // the improvement gate must reject; there is no third outcome
    let (pipeline, _) = pipeline(false, vec![]);
    let result = pipeline
        .run_attempt(
            tryon_request(Engine::IdentityLockedHighFidelity),
            CancellationToken::new(),
        )
        .await;

    match result {
        Ok(accepted) => assert!(accepted.report.sim_after >= 0.80),
        Err(PipelineError::SimilarityGateFailed { sim_after, .. }) => {
            // the rejected image is discarded; only scores surface
            assert!(sim_after <= 1.0);
        }
        Err(other) => panic!("unexpected outcome: {other}"),
    }
}

#[tokio::test]
async fn unchanged_generation_fails_the_improvement_gate() {
    let (pipeline, _) = pipeline(false, vec![]);
    let err = pipeline
        .run_attempt(
            tryon_request(Engine::IdentityFast),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::SimilarityGateFailed { .. }));
}

#[tokio::test]
async fn forbidden_routing_aborts_before_any_model_call() {
    let (pipeline, generator) = pipeline(true, vec![]);
    let err = pipeline
        .run_attempt(tryon_request(Engine::CreativeFree), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PipelineError::ForbiddenEngineForUseCase {
            use_case: UseCase::TryOn,
            engine: Engine::CreativeFree,
        }
    );
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_caller_stops_the_attempt() {
    let (pipeline, _) = pipeline(true, vec![]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .run_attempt(tryon_request(Engine::IdentityFast), cancel)
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::Cancelled);
}

#[tokio::test]
async fn variant_run_flags_a_near_duplicate_pair() {
    let (pipeline, generator) = pipeline(true, vec![45, 50, 20]);
    let run = pipeline
        .run_variants(
            tryon_request(Engine::IdentityLockedHighFidelity),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.variants.len(), 3);
    assert!(run.report.too_similar);
    // three independent generations, one per mood
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    let scores: Vec<Option<u8>> = run.report.pair_scores.iter().map(|p| p.score).collect();
    assert_eq!(scores, vec![Some(45), Some(50), Some(20)]);
}

#[tokio::test]
async fn distinct_variant_run_passes_validation() {
    let (pipeline, _) = pipeline(true, vec![62, 55, 48]);
    let run = pipeline
        .run_variants(
            tryon_request(Engine::IdentityLockedHighFidelity),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!run.report.too_similar);
    for (mood, accepted) in &run.variants {
        assert!(accepted.report.passed, "variant {mood} failed the gate");
    }
}

#[tokio::test]
async fn lock_store_is_shared_across_attempts_of_one_session() {
    let (pipeline, _) = pipeline(true, vec![]);
    let request = tryon_request(Engine::IdentityLockedHighFidelity);

    pipeline
        .run_attempt(request.clone(), CancellationToken::new())
        .await
        .unwrap();
    pipeline
        .run_attempt(request, CancellationToken::new())
        .await
        .unwrap();

    // both attempts keyed the same (session, hash) entry
    assert!(pipeline.lock_store().entry_count() <= 1);
}
