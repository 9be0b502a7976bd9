//! The generation backend: an opaque remote capability that takes a prompt
//! plus a list of encoded images and returns one or more encoded images.
//!
//! The backend used to live as process-global state constructed at load
//! time. Here it is an explicitly constructed object behind the
//! [`GenerationBackend`] trait, injected via
//! [`crate::config::CollageConfigBuilder::backend`]; its lifecycle belongs
//! to the caller. When nothing is injected, [`resolve_backend`] builds the
//! OpenAI-style implementation from the environment.
//!
//! No retry or backoff lives here: a failed generation call is a fatal
//! [`CollageError`], surfaced to the caller as-is.

use crate::config::CollageConfig;
use crate::error::CollageError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default image-edit model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-image-1";

/// Default API base for the built-in backend.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// An image-synthesis service invoked with a prompt and reference images.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind an
/// `Arc` and calls [`generate`](GenerationBackend::generate) exactly once
/// per compose.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Produce one or more composite images from the references.
    ///
    /// `images` arrive in LinkMap order (plus any trailing augmentation
    /// image); implementations must not reorder them — the prompt may refer
    /// to them positionally.
    async fn generate(
        &self,
        prompt: &str,
        images: &[EncodedImage],
    ) -> Result<Vec<EncodedImage>, CollageError>;
}

/// OpenAI-style `images/edits` client.
///
/// Posts the reference images as multipart file parts together with the
/// prompt, and reads base64 results from `data[].b64_json`. Works against
/// the real endpoint or any API-compatible proxy via `api_base`.
pub struct OpenAiImageBackend {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiImageBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

/// Response shape of the images API: `{"data": [{"b64_json": "…"}, …]}`.
#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[async_trait]
impl GenerationBackend for OpenAiImageBackend {
    async fn generate(
        &self,
        prompt: &str,
        images: &[EncodedImage],
    ) -> Result<Vec<EncodedImage>, CollageError> {
        let url = format!("{}/images/edits", self.api_base.trim_end_matches('/'));
        info!(
            "Requesting composite from {} ({} reference image(s), model {})",
            url,
            images.len(),
            self.model
        );

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string());

        for (i, encoded) in images.iter().enumerate() {
            let bytes = encoded
                .decode()
                .map_err(|e| CollageError::Internal(format!("reference image {i} is not valid base64: {e}")))?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(format!("image_{i}.png"))
                .mime_str("image/png")
                .map_err(|e| CollageError::Internal(e.to_string()))?;
            form = form.part("image[]", part);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CollageError::BackendRequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollageError::BackendRequestFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: ImagesResponse =
            response
                .json()
                .await
                .map_err(|e| CollageError::BackendResponseMalformed {
                    detail: e.to_string(),
                })?;

        let results: Vec<EncodedImage> = parsed
            .data
            .into_iter()
            .filter_map(|d| d.b64_json)
            .map(EncodedImage::from_base64)
            .collect();

        if results.is_empty() {
            return Err(CollageError::BackendResponseMalformed {
                detail: "response contained no b64_json entries".to_string(),
            });
        }

        debug!("Backend returned {} image(s)", results.len());
        Ok(results)
    }
}

/// Resolve the generation backend, from most-specific to least-specific.
///
/// 1. **Injected backend** (`config.backend`) — the caller constructed and
///    configured the object entirely; used as-is. This is also how tests
///    substitute a stub.
/// 2. **`OPENAI_API_KEY` env** — build an [`OpenAiImageBackend`], honouring
///    `config.model` / `config.api_base` overrides.
///
/// Anything else is [`CollageError::BackendNotConfigured`].
pub fn resolve_backend(config: &CollageConfig) -> Result<Arc<dyn GenerationBackend>, CollageError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let mut backend = OpenAiImageBackend::new(key);
            if let Some(ref model) = config.model {
                backend = backend.with_model(model.clone());
            }
            if let Some(ref base) = config.api_base {
                backend = backend.with_api_base(base.clone());
            }
            Ok(Arc::new(backend))
        }
        _ => Err(CollageError::BackendNotConfigured {
            hint: "Set OPENAI_API_KEY, or inject a backend via CollageConfigBuilder::backend()."
                .to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_backend_wins_over_environment() {
        struct Stub;

        #[async_trait]
        impl GenerationBackend for Stub {
            async fn generate(
                &self,
                _prompt: &str,
                images: &[EncodedImage],
            ) -> Result<Vec<EncodedImage>, CollageError> {
                Ok(images.to_vec())
            }
        }

        let config = CollageConfig::builder()
            .backend(Arc::new(Stub))
            .build()
            .unwrap();
        assert!(resolve_backend(&config).is_ok());
    }

    #[test]
    fn builder_style_overrides_compose() {
        let backend = OpenAiImageBackend::new("sk-test")
            .with_model("custom-model")
            .with_api_base("http://localhost:9000/v1/");
        assert_eq!(backend.model, "custom-model");
        assert_eq!(backend.api_base, "http://localhost:9000/v1/");
    }

    #[test]
    fn images_response_parses_expected_shape() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"data": [{"b64_json": "aGk="}, {"b64_json": null}]}"#)
                .unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].b64_json.as_deref(), Some("aGk="));
        assert!(parsed.data[1].b64_json.is_none());
    }
}
