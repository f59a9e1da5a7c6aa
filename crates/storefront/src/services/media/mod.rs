//! AI image generation client.
//!
//! Relays generation tasks between the browser and the image API. The
//! storefront keeps no task state: the browser starts a task, then polls
//! its status until it succeeds or fails.

mod error;
pub mod token;
mod types;

pub use error::MediaError;
pub use types::{
    ASPECT_RATIOS, GenerationRequest, GenerationTask, MAX_IMAGES, MAX_PROMPT_CHARS, TaskStatus,
};

use std::fmt;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use crate::config::MediaConfig;

use token::Claims;
use types::{CreateTaskBody, Envelope, TaskData};

/// Client for the image generation API.
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    api_base_url: String,
    access_key: String,
    secret_key: SecretString,
    model: String,
}

impl fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaClient")
            .field("api_base_url", &self.api_base_url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl MediaClient {
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            model: config.model.clone(),
        }
    }

    fn bearer_token(&self) -> Result<String, MediaError> {
        let claims = Claims::issued_at(&self.access_key, chrono::Utc::now().timestamp());
        token::sign(&claims, self.secret_key.expose_secret().as_bytes())
    }

    fn generations_url(&self) -> String {
        format!("{}/v1/images/generations", self.api_base_url)
    }

    /// Start a generation task.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Validation`] for requests outside the API's
    /// limits, or an error if the API call fails.
    #[instrument(skip(self, request), fields(n = request.n, aspect_ratio = %request.aspect_ratio))]
    pub async fn create_task(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationTask, MediaError> {
        request.validate()?;

        let body = CreateTaskBody {
            model_name: &self.model,
            prompt: request.prompt.trim(),
            negative_prompt: request
                .negative_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty()),
            n: request.n,
            aspect_ratio: &request.aspect_ratio,
            image: request.image.as_deref().filter(|i| !i.is_empty()),
        };

        let response = self
            .client
            .post(self.generations_url())
            .bearer_auth(self.bearer_token()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;

        let task: GenerationTask = read_envelope::<TaskData>(response).await?.into();
        debug!(task_id = %task.task_id, status = ?task.status, "Generation task created");
        Ok(task)
    }

    /// Current state of a generation task.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or reports an error.
    #[instrument(skip(self))]
    pub async fn task_status(&self, task_id: &str) -> Result<GenerationTask, MediaError> {
        let well_formed = task_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if task_id.is_empty() || !well_formed {
            return Err(MediaError::Validation("invalid task id".to_string()));
        }

        let response = self
            .client
            .get(format!("{}/{task_id}", self.generations_url()))
            .bearer_auth(self.bearer_token()?)
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;

        Ok(read_envelope::<TaskData>(response).await?.into())
    }
}

/// Unwrap the `{ code, message, data }` envelope.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MediaError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| MediaError::Response(e.to_string()))?;

    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
        error!(
            status = %status,
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Unreadable image API response"
        );
        MediaError::Response(format!("HTTP {status}: {e}"))
    })?;

    if envelope.code != 0 {
        error!(code = envelope.code, message = %envelope.message, "Image API error");
        return Err(MediaError::Api {
            code: envelope.code,
            message: envelope.message,
        });
    }

    envelope
        .data
        .ok_or_else(|| MediaError::Response("response has no data".to_string()))
}
