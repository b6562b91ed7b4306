pub mod http;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::TRANSIENT_RETRY_LIMIT;
use crate::error::PipelineError;

/// The two black-box services the core talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExternalService {
    #[strum(serialize = "generative image model")]
    GenerativeModel,
    #[strum(serialize = "reasoning model")]
    ReasoningModel,
}

/// Role a reference image plays in a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Identity,
    Garment,
    FaceCrop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub role: ImageRole,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Output aspect ratio requested from the generative model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    Square,
    Portrait,
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
        }
    }
}

/// One generation call: prompt plus reference images.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub temperature: f32,
    pub aspect_ratio: AspectRatio,
    pub images: Vec<ImagePayload>,
}

impl GenerationRequest {
    /// Exactly two or three reference images per call; anything else is a
    /// contract violation that must abort before the network call.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let got = self.images.len();
        if !(2..=3).contains(&got) {
            return Err(PipelineError::WrongImageCount { got });
        }
        Ok(())
    }
}

/// The external generative image model: prompt + reference images in, raw
/// image bytes out.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<u8>, PipelineError>;
}

/// The external reasoning/vision model: structured instructions plus
/// optional images in, strict JSON out. Malformed JSON is a failure at the
/// adapter layer, never partially parsed.
#[async_trait::async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn judge(
        &self,
        instructions: String,
        images: Vec<Vec<u8>>,
    ) -> Result<serde_json::Value, PipelineError>;
}

/// Applies the mandatory timeout and the single bounded retry for transient
/// transport failures. Content-policy and validation failures pass through
/// on the first attempt.
pub(crate) async fn call_with_guardrails<T, F, Fut>(
    service: ExternalService,
    timeout: Duration,
    call: F,
) -> Result<T, PipelineError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, call()).await {
            Ok(inner) => inner,
            Err(_) => Err(PipelineError::ServiceUnavailable {
                service,
                message: format!("call timed out after {timeout:?}"),
            }),
        };

        match result {
            Err(err) if err.is_transient() && attempt < TRANSIENT_RETRY_LIMIT => {
                attempt += 1;
                tracing::warn!(%service, %err, attempt, "transient failure, retrying once");
            }
            other => return other,
        }
    }
}

/// The single integration point that performs generation network I/O.
pub struct GenerationInvoker {
    model: std::sync::Arc<dyn GenerativeModel>,
    call_timeout: Duration,
}

impl GenerationInvoker {
    pub fn new(model: std::sync::Arc<dyn GenerativeModel>, call_timeout: Duration) -> Self {
        Self {
            model,
            call_timeout,
        }
    }

    #[tracing::instrument(skip(self, request), fields(model_id = %request.model_id, images = request.images.len()))]
    pub async fn invoke(&self, request: GenerationRequest) -> Result<Vec<u8>, PipelineError> {
        request.validate()?;
        call_with_guardrails(ExternalService::GenerativeModel, self.call_timeout, || {
            self.model.generate(request.clone())
        })
        .await
    }
}
