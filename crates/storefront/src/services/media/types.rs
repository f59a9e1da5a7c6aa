//! Request and response types for the image generation API.

use serde::{Deserialize, Serialize};

use super::MediaError;

/// Longest prompt or negative prompt accepted, in characters.
pub const MAX_PROMPT_CHARS: usize = 2500;

/// Most images one task may produce.
pub const MAX_IMAGES: u8 = 9;

/// Aspect ratios the API accepts.
pub const ASPECT_RATIOS: [&str; 8] = ["1:1", "16:9", "9:16", "4:3", "3:4", "3:2", "2:3", "21:9"];

fn default_count() -> u8 {
    1
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

/// Generation request as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_count")]
    pub n: u8,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Reference image URL or base64 payload for image-to-image.
    #[serde(default)]
    pub image: Option<String>,
}

impl GenerationRequest {
    /// Check the request against the API's limits.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Validation`] naming the first problem found.
    pub fn validate(&self) -> Result<(), MediaError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(MediaError::Validation("prompt is required".to_string()));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(MediaError::Validation(format!(
                "prompt must be at most {MAX_PROMPT_CHARS} characters"
            )));
        }
        if self
            .negative_prompt
            .as_deref()
            .is_some_and(|p| p.chars().count() > MAX_PROMPT_CHARS)
        {
            return Err(MediaError::Validation(format!(
                "negative_prompt must be at most {MAX_PROMPT_CHARS} characters"
            )));
        }
        if !(1..=MAX_IMAGES).contains(&self.n) {
            return Err(MediaError::Validation(format!(
                "n must be between 1 and {MAX_IMAGES}"
            )));
        }
        if !ASPECT_RATIOS.contains(&self.aspect_ratio.as_str()) {
            return Err(MediaError::Validation(format!(
                "aspect_ratio must be one of {}",
                ASPECT_RATIOS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Body sent to the create-task endpoint.
#[derive(Debug, Serialize)]
pub(super) struct CreateTaskBody<'a> {
    pub model_name: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<&'a str>,
    pub n: u8,
    pub aspect_ratio: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TaskImage {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TaskResult {
    #[serde(default)]
    pub images: Vec<TaskImage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TaskData {
    pub task_id: String,
    pub task_status: String,
    #[serde(default)]
    pub task_status_msg: Option<String>,
    #[serde(default)]
    pub task_result: Option<TaskResult>,
}

/// Where a generation task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Submitted,
    Processing,
    Succeeded,
    Failed,
    Unknown,
}

impl TaskStatus {
    /// Map the API's status string.
    #[must_use]
    pub fn from_api(value: &str) -> Self {
        match value {
            "submitted" => Self::Submitted,
            "processing" => Self::Processing,
            "succeed" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// True once the task will not change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Task state relayed to the browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationTask {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub images: Vec<String>,
}

impl From<TaskData> for GenerationTask {
    fn from(data: TaskData) -> Self {
        Self {
            task_id: data.task_id,
            status: TaskStatus::from_api(&data.task_status),
            message: data.task_status_msg.filter(|m| !m.is_empty()),
            images: data
                .task_result
                .unwrap_or_default()
                .images
                .into_iter()
                .map(|i| i.url)
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            negative_prompt: None,
            n: 1,
            aspect_ratio: "1:1".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_defaults_from_json() {
        let req: GenerationRequest =
            serde_json::from_value(serde_json::json!({ "prompt": "a tide pool" })).unwrap();
        assert_eq!(req.n, 1);
        assert_eq!(req.aspect_ratio, "1:1");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_prompt_bounds() {
        assert!(request("   ").validate().is_err());
        assert!(request(&"a".repeat(MAX_PROMPT_CHARS)).validate().is_ok());
        assert!(request(&"a".repeat(MAX_PROMPT_CHARS + 1)).validate().is_err());

        let mut req = request("ok");
        req.negative_prompt = Some("b".repeat(MAX_PROMPT_CHARS + 1));
        assert!(matches!(req.validate(), Err(MediaError::Validation(_))));
    }

    #[test]
    fn test_count_and_ratio_bounds() {
        let mut req = request("ok");
        req.n = 0;
        assert!(req.validate().is_err());
        req.n = 9;
        assert!(req.validate().is_ok());
        req.n = 10;
        assert!(req.validate().is_err());

        let mut req = request("ok");
        req.aspect_ratio = "5:4".to_string();
        assert!(req.validate().is_err());
        for ratio in ASPECT_RATIOS {
            req.aspect_ratio = ratio.to_string();
            assert!(req.validate().is_ok(), "{ratio}");
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(TaskStatus::from_api("submitted"), TaskStatus::Submitted);
        assert_eq!(TaskStatus::from_api("processing"), TaskStatus::Processing);
        assert_eq!(TaskStatus::from_api("succeed"), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from_api("failed"), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_api("queued"), TaskStatus::Unknown);
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
    }

    #[test]
    fn test_relay_from_task_data() {
        let data: TaskData = serde_json::from_value(serde_json::json!({
            "task_id": "t-1",
            "task_status": "succeed",
            "task_status_msg": "",
            "task_result": { "images": [{ "index": 0, "url": "https://img.example/1.png" }] }
        }))
        .unwrap();
        let task = GenerationTask::from(data);
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.message, None);
        assert_eq!(task.images, vec!["https://img.example/1.png"]);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert!(json.get("message").is_none());
    }
}
