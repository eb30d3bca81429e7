use crate::browser::ScrollDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One browser action requested by the model, e.g. `{"click_element": {"index": 3}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    GoToUrl { url: String },
    SearchGoogle { query: String },
    ClickElement { index: usize },
    InputText { index: usize, text: String },
    Scroll { direction: ScrollDirection },
    GoBack {},
    ExtractContent { goal: String },
    Done {
        text: String,
        #[serde(default = "default_success")]
        success: bool,
    },
}

fn default_success() -> bool {
    true
}

impl Action {
    /// Whether the page the step's snapshot describes may be gone afterwards
    pub fn changes_page(&self) -> bool {
        matches!(
            self,
            Action::GoToUrl { .. }
                | Action::SearchGoogle { .. }
                | Action::ClickElement { .. }
                | Action::GoBack {}
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::GoToUrl { .. } => "go_to_url",
            Action::SearchGoogle { .. } => "search_google",
            Action::ClickElement { .. } => "click_element",
            Action::InputText { .. } => "input_text",
            Action::Scroll { .. } => "scroll",
            Action::GoBack {} => "go_back",
            Action::ExtractContent { .. } => "extract_content",
            Action::Done { .. } => "done",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str(self.name()),
        }
    }
}

/// The model's reasoning for a step
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentBrain {
    #[serde(default)]
    pub evaluation_previous_goal: String,
    #[serde(default)]
    pub memory: String,
    #[serde(default)]
    pub next_goal: String,
}

/// Full model answer for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    #[serde(default)]
    pub current_state: AgentBrain,
    #[serde(default)]
    pub action: Vec<Action>,
}

/// Outcome of executing one action
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub extracted_content: Option<String>,
    pub error: Option<String>,
    pub is_done: bool,
    pub success: Option<bool>,
}

impl ActionResult {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            extracted_content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn done(text: impl Into<String>, success: bool) -> Self {
        Self {
            extracted_content: Some(text.into()),
            is_done: true,
            success: Some(success),
            ..Default::default()
        }
    }
}
