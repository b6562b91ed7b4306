use std::future::Future;
use std::sync::Arc;

use anprobe_similarity::FaceSimilarity;
use anprobe_types::attempt::{AttemptVerdict, GarmentDescription, GenerationAttempt};
use anprobe_types::engine::{Engine, UseCase};
use anprobe_types::geometry::PixelBox;
use anprobe_types::identity::{FaceLockState, ImageHash, SessionId};
use anprobe_types::scene::VariantMood;
use futures::stream::FuturesOrdered;
use futures::StreamExt;
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use crate::client::{
    AspectRatio, ExternalService, GenerationInvoker, GenerationRequest, GenerativeModel,
    ImagePayload, ImageRole, ReasoningModel,
};
use crate::compositor::FaceCompositor;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::facegeo::polygon::core_interior_box;
use crate::facegeo::selector::select_primary_face;
use crate::facegeo::{FaceGeometryProvider, SubjectFaceDetector};
use crate::gate::{GateReport, SimilarityGate};
use crate::lock::{encode_png, FaceLockStore};
use crate::prompt::PromptAssembler;
use crate::routing::RoutingGuard;
use crate::scene::{SceneRequest, SceneResolver};
use crate::variants::{MultiVariantValidator, VariantCandidate, VariantReport};

/// One caller request flowing into the pipeline.
#[derive(Clone)]
pub struct TryOnRequest {
    pub session: SessionId,
    pub use_case: UseCase,
    pub engine: Engine,
    pub identity_image: Vec<u8>,
    pub garment_image: Vec<u8>,
    pub garment: GarmentDescription,
    pub scene: SceneRequest,
    pub aspect_ratio: AspectRatio,
}

/// The single accepted output of a generation attempt.
#[derive(Debug)]
pub struct AcceptedImage {
    pub png: Vec<u8>,
    pub report: GateReport,
    pub attempt: GenerationAttempt,
}

/// Result of a three-variant run: the accepted variants in mood order plus
/// the pairwise-difference report.
pub struct VariantRun {
    pub variants: Vec<(VariantMood, AcceptedImage)>,
    pub report: VariantReport,
}

/// External collaborators injected into the pipeline.
pub struct PipelineDependencies {
    pub generative: Arc<dyn GenerativeModel>,
    pub reasoning: Arc<dyn ReasoningModel>,
    pub geometry_provider: Arc<dyn FaceGeometryProvider>,
    pub subject_detector: Arc<dyn SubjectFaceDetector>,
    pub metric: Arc<dyn FaceSimilarity>,
}

/// The identity-lock and generation-orchestration pipeline.
///
/// Within one attempt the steps run strictly in order: routing → scene
/// resolve → face lock → prompt assembly → generation → subject selection →
/// compositing → similarity gate. Attempts from different sessions are
/// fully independent and safe to run concurrently; the lock store is the
/// only shared state.
pub struct TryOnPipeline {
    config: PipelineConfig,
    lock_store: Arc<FaceLockStore>,
    scene_resolver: SceneResolver,
    assembler: PromptAssembler,
    invoker: GenerationInvoker,
    compositor: Arc<FaceCompositor>,
    gate: Arc<SimilarityGate>,
    subject_detector: Arc<dyn SubjectFaceDetector>,
    validator: MultiVariantValidator,
}

impl TryOnPipeline {
    pub fn new(deps: PipelineDependencies, config: PipelineConfig) -> Self {
        Self {
            lock_store: Arc::new(FaceLockStore::new(deps.geometry_provider, &config)),
            scene_resolver: SceneResolver::new(Arc::clone(&deps.reasoning), &config),
            assembler: PromptAssembler::new(),
            invoker: GenerationInvoker::new(deps.generative, config.external_call_timeout),
            compositor: Arc::new(FaceCompositor::new(config.feather_radius_px)),
            gate: Arc::new(SimilarityGate::new(deps.metric, &config)),
            subject_detector: deps.subject_detector,
            validator: MultiVariantValidator::new(deps.reasoning, &config),
            config,
        }
    }

    pub fn lock_store(&self) -> &FaceLockStore {
        &self.lock_store
    }

    /// Runs one generation attempt end to end. Rejections are surfaced to
    /// the caller; the core never retries a whole attempt on its own.
    pub async fn run_attempt(
        &self,
        request: TryOnRequest,
        cancel: CancellationToken,
    ) -> Result<AcceptedImage, PipelineError> {
        self.run_attempt_with_mood(request, None, cancel).await
    }

    #[tracing::instrument(
        skip(self, request, cancel),
        fields(session = %request.session, engine = %request.engine, mood = ?mood)
    )]
    async fn run_attempt_with_mood(
        &self,
        request: TryOnRequest,
        mood: Option<VariantMood>,
        cancel: CancellationToken,
    ) -> Result<AcceptedImage, PipelineError> {
        // must precede any external call
        RoutingGuard::authorize(request.use_case, request.engine)?;

        let mut scene = cancellable(&cancel, self.scene_resolver.resolve(&request.scene)).await?;
        if let Some(mood) = mood {
            scene.variant_label = mood.to_string();
            scene.realism_guidance = Some(match scene.realism_guidance.take() {
                Some(existing) => format!("{existing}; {}", mood.description()),
                None => mood.description().to_string(),
            });
        }

        let lock = cancellable(
            &cancel,
            self.lock_store.acquire(&request.session, &request.identity_image),
        )
        .await??;

        let prompt =
            self.assembler
                .assemble(request.use_case, request.engine, &scene, &request.garment)?;

        let mut attempt = GenerationAttempt::new(
            request.use_case,
            request.engine,
            lock.image_hash,
            ImageHash::of(&request.garment_image),
        );
        attempt.prompt = Some(prompt.clone());

        let mut images = vec![
            ImagePayload {
                role: ImageRole::Identity,
                bytes: request.identity_image.clone(),
            },
            ImagePayload {
                role: ImageRole::Garment,
                bytes: request.garment_image.clone(),
            },
        ];
        // the high-fidelity engine additionally receives the locked face crop
        if request.engine == Engine::IdentityLockedHighFidelity {
            images.push(ImagePayload {
                role: ImageRole::FaceCrop,
                bytes: lock.face_crop_png.clone(),
            });
        }

        let generation = GenerationRequest {
            model_id: prompt.model_id.clone(),
            prompt: prompt.text.clone(),
            temperature: prompt.temperature,
            aspect_ratio: request.aspect_ratio,
            images,
        };
        let generated = cancellable(&cancel, self.invoker.invoke(generation)).await??;

        // CPU-bound post-processing runs off the async workers
        let compositor = Arc::clone(&self.compositor);
        let gate = Arc::clone(&self.gate);
        let detector = Arc::clone(&self.subject_detector);
        let lock_ref = Arc::clone(&lock);
        let feather = self.config.feather_radius_px;
        let gated = cancellable(
            &cancel,
            tokio::task::spawn_blocking(move || {
                composite_and_gate(
                    detector.as_ref(),
                    compositor.as_ref(),
                    gate.as_ref(),
                    lock_ref.as_ref(),
                    feather,
                    &generated,
                )
            }),
        )
        .await?
        .map_err(|e| PipelineError::FaceRegionExtraction(e.to_string()))?;

        match gated {
            Ok(output) => {
                attempt.sim_before = Some(output.report.sim_before);
                attempt.sim_after = Some(output.report.sim_after);
                attempt.result_image = Some(output.png.clone());
                attempt.verdict = Some(AttemptVerdict::Accepted);
                Ok(AcceptedImage {
                    png: output.png,
                    report: output.report,
                    attempt,
                })
            }
            Err(err) => {
                let verdict = match &err {
                    PipelineError::SimilarityGateFailed {
                        sim_before,
                        sim_after,
                    } => AttemptVerdict::SimilarityRejected {
                        sim_before: *sim_before,
                        sim_after: *sim_after,
                    },
                    PipelineError::NoSubjectFace => AttemptVerdict::DetectionFailed,
                    other => AttemptVerdict::Failed {
                        message: other.to_string(),
                    },
                };
                tracing::info!(?verdict, "generation attempt rejected");
                Err(err)
            }
        }
    }

    /// Runs three stylistic variants of the same request concurrently, then
    /// validates pairwise visual difference. A too-similar report signals
    /// the caller to regenerate with
    /// [`crate::variants::differentiation_block`].
    #[tracing::instrument(skip(self, request, cancel), fields(session = %request.session))]
    pub async fn run_variants(
        &self,
        request: TryOnRequest,
        cancel: CancellationToken,
    ) -> Result<VariantRun, PipelineError> {
        let mut pending = FuturesOrdered::new();
        for mood in VariantMood::all() {
            let request = request.clone();
            let cancel = cancel.clone();
            pending.push_back(async move {
                let result = self.run_attempt_with_mood(request, Some(mood), cancel).await;
                (mood, result)
            });
        }

        let mut variants = Vec::with_capacity(3);
        while let Some((mood, result)) = pending.next().await {
            variants.push((mood, result?));
        }

        let candidates: Vec<VariantCandidate> = variants
            .iter()
            .map(|(mood, accepted)| VariantCandidate {
                mood: *mood,
                image: accepted.png.clone(),
            })
            .collect();
        let candidates: [VariantCandidate; 3] = candidates
            .try_into()
            .map_err(|_| PipelineError::FaceRegionExtraction("variant run incomplete".into()))?;

        let report = self.validator.validate(&candidates).await;
        Ok(VariantRun { variants, report })
    }
}

struct GatedOutput {
    png: Vec<u8>,
    report: GateReport,
}

/// Synchronous post-generation stage: decode, select the subject face,
/// composite the locked face back, and apply the similarity gate. On a gate
/// failure the pre-composite image is dropped here and never returned.
fn composite_and_gate(
    detector: &dyn SubjectFaceDetector,
    compositor: &FaceCompositor,
    gate: &SimilarityGate,
    lock: &FaceLockState,
    feather_radius: u32,
    generated_bytes: &[u8],
) -> Result<GatedOutput, PipelineError> {
    let generated =
        image::load_from_memory(generated_bytes).map_err(|e| PipelineError::MalformedModelOutput {
            service: ExternalService::GenerativeModel,
            message: format!("generated bytes are not a decodable image: {e}"),
        })?;

    let faces = detector.detect_faces(&generated);
    let subject = select_primary_face(faces, generated.width(), generated.height())
        .ok_or(PipelineError::NoSubjectFace)?;

    let outcome = compositor.composite_face_back(&generated, lock, &subject)?;
    if !outcome.composited {
        return Err(PipelineError::FaceRegionExtraction(
            "core face region fell outside the generated image".to_string(),
        ));
    }

    // compare the inscribed core-interior regions: the original lock crop
    // against the same region of the generated image before and after
    // compositing. The inset keeps the feather band out of the comparison.
    let inset = feather_radius * 2;
    let original_crop = image::load_from_memory(&lock.face_crop_png)
        .map_err(|e| PipelineError::FaceRegionExtraction(e.to_string()))?;
    let crop_box = PixelBox::new(0, 0, original_crop.width(), original_crop.height())?;
    let original_interior = core_interior_box(&crop_box, inset);
    let original_core = original_crop
        .crop_imm(
            original_interior.x,
            original_interior.y,
            original_interior.width,
            original_interior.height,
        )
        .to_rgb8();

    let region = core_interior_box(&subject.bounds, inset);
    let before = image::imageops::crop_imm(
        &generated.to_rgba8(),
        region.x,
        region.y,
        region.width,
        region.height,
    )
    .to_image();
    let before = DynamicImage::ImageRgba8(before).to_rgb8();
    let after =
        image::imageops::crop_imm(&outcome.image, region.x, region.y, region.width, region.height)
            .to_image();
    let after = DynamicImage::ImageRgba8(after).to_rgb8();

    let report = gate.assert_improved(&original_core, &before, &after)?;
    gate.enforce(report)?;

    let png = encode_png(&DynamicImage::ImageRgba8(outcome.image))?;
    Ok(GatedOutput { png, report })
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    tokio::select! {
        // cancellation always wins over a ready result
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        value = operation => Ok(value),
    }
}
