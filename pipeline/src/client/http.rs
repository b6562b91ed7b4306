//! Reqwest adapters for the two external services.
//!
//! Wire shape is the minimal JSON contract both hosted endpoints share:
//! base64 image payloads in, either a base64 image or a JSON judgment out.
//! Transport and 5xx conditions map to the transient error class; 4xx maps
//! to a non-retryable rejection; undecodable bodies are malformed output.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ExternalService, GenerationRequest, GenerativeModel, ReasoningModel};
use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct HttpModelConfig {
    pub endpoint: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

fn build_client(
    service: ExternalService,
    config: &HttpModelConfig,
) -> Result<reqwest::Client, PipelineError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| PipelineError::ServiceUnavailable {
            service,
            message: format!("client construction failed: {e}"),
        })
}

fn classify_transport_error(service: ExternalService, err: reqwest::Error) -> PipelineError {
    PipelineError::ServiceUnavailable {
        service,
        message: err.to_string(),
    }
}

async fn classify_status(
    service: ExternalService,
    response: reqwest::Response,
) -> Result<reqwest::Response, PipelineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    if status.is_server_error() || status.as_u16() == 408 || status.as_u16() == 429 {
        Err(PipelineError::ServiceUnavailable {
            service,
            message: format!("status {status}: {message}"),
        })
    } else {
        Err(PipelineError::ServiceRejectedRequest {
            service,
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Serialize)]
struct WireImage<'a> {
    role: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    aspect_ratio: &'a str,
    images: Vec<WireImage<'a>>,
}

#[derive(Deserialize)]
struct GenerateReply {
    image: String,
}

pub struct HttpGenerativeModel {
    client: reqwest::Client,
    config: HttpModelConfig,
}

impl HttpGenerativeModel {
    pub fn new(config: HttpModelConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_client(ExternalService::GenerativeModel, &config)?,
            config,
        })
    }
}

#[async_trait::async_trait]
impl GenerativeModel for HttpGenerativeModel {
    #[tracing::instrument(skip_all, fields(model_id = %request.model_id))]
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<u8>, PipelineError> {
        let service = ExternalService::GenerativeModel;
        let body = GenerateBody {
            model: &request.model_id,
            prompt: &request.prompt,
            temperature: request.temperature,
            aspect_ratio: request.aspect_ratio.as_str(),
            images: request
                .images
                .iter()
                .map(|img| WireImage {
                    role: match img.role {
                        super::ImageRole::Identity => "identity",
                        super::ImageRole::Garment => "garment",
                        super::ImageRole::FaceCrop => "face_crop",
                    },
                    data: BASE64.encode(&img.bytes),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(service, e))?;
        let response = classify_status(service, response).await?;

        let reply: GenerateReply =
            response
                .json()
                .await
                .map_err(|e| PipelineError::MalformedModelOutput {
                    service,
                    message: e.to_string(),
                })?;
        BASE64
            .decode(reply.image)
            .map_err(|e| PipelineError::MalformedModelOutput {
                service,
                message: format!("image payload is not valid base64: {e}"),
            })
    }
}

#[derive(Serialize)]
struct JudgeBody<'a> {
    instructions: &'a str,
    images: Vec<String>,
}

pub struct HttpReasoningModel {
    client: reqwest::Client,
    config: HttpModelConfig,
}

impl HttpReasoningModel {
    pub fn new(config: HttpModelConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_client(ExternalService::ReasoningModel, &config)?,
            config,
        })
    }
}

#[async_trait::async_trait]
impl ReasoningModel for HttpReasoningModel {
    #[tracing::instrument(skip_all, fields(images = images.len()))]
    async fn judge(
        &self,
        instructions: String,
        images: Vec<Vec<u8>>,
    ) -> Result<serde_json::Value, PipelineError> {
        let service = ExternalService::ReasoningModel;
        let body = JudgeBody {
            instructions: &instructions,
            images: images.iter().map(|b| BASE64.encode(b)).collect(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(service, e))?;
        let response = classify_status(service, response).await?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PipelineError::MalformedModelOutput {
                service,
                message: e.to_string(),
            })
    }
}
