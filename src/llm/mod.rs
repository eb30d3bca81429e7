pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request to generative model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generative model returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Generative model returned no text")]
    EmptyResponse,

    #[error("Could not decode generative model response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A hosted model that turns a prompt into free text
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}

/// Remove Markdown code fences that models like to wrap JSON in.
///
/// Only applies when the trimmed text starts with a fence; every fence
/// marker is then dropped, not just the outer pair.
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();

    if text.starts_with("```json") {
        text.replace("```json", "").replace("```", "").trim().to_string()
    } else if text.starts_with("```") {
        text.replace("```", "").trim().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers prompts with queued replies, in order; fails once they run out
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(reply: &str) -> Self {
            Self::new(vec![reply])
        }

        /// A model whose every call fails
        pub fn failing() -> Self {
            Self::new(Vec::new())
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop_front().ok_or(LlmError::Api {
                status: 503,
                body: "no scripted reply left".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }
}
