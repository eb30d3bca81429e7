pub mod actions;
pub mod history;
pub mod prompt;
pub mod task;

pub use actions::{Action, ActionResult, AgentBrain, AgentOutput};
pub use history::{AgentHistory, AgentStep};
pub use task::SearchTask;

use crate::browser::{BrowserContext, PageSnapshot, ScrollDirection};
use crate::llm::{strip_code_fence, GenerativeModel};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Url;
use tracing::{debug, error, info, warn};

/// Step and action budgets for one run
#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub max_steps: u32,
    pub max_actions_per_step: usize,
    /// Consecutive failed steps tolerated before giving up
    pub max_failures: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_actions_per_step: 25,
            max_failures: 3,
        }
    }
}

/// Drives a browser context with a generative model until the task is done
pub struct Agent<'a> {
    task: String,
    model: &'a dyn GenerativeModel,
    context: &'a dyn BrowserContext,
    settings: AgentSettings,
}

impl<'a> Agent<'a> {
    pub fn new(
        task: impl Into<String>,
        model: &'a dyn GenerativeModel,
        context: &'a dyn BrowserContext,
        settings: AgentSettings,
    ) -> Self {
        Self {
            task: task.into(),
            model,
            context,
            settings,
        }
    }

    /// Run until `done`, the step budget, or too many consecutive failures.
    ///
    /// Running out of steps still returns the history; hitting the failure
    /// limit is an error.
    pub async fn run(&self) -> Result<AgentHistory> {
        info!("🚀 Starting task: {}", self.task);

        let mut history = AgentHistory::new(self.task.clone());
        let mut consecutive_failures = 0;

        for step in 1..=self.settings.max_steps {
            info!("📍 Step {}", step);
            let started_at = Utc::now();

            match self.step(step, &history).await {
                Ok(record) => {
                    consecutive_failures = 0;
                    let done = record.is_done();
                    history.push(record);
                    if done {
                        info!("✅ Task completed after {} steps", step);
                        return Ok(history);
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        "Step {} failed ({}/{}): {:#}",
                        step, consecutive_failures, self.settings.max_failures, e
                    );
                    history.push(AgentStep::failed(step, started_at, &e));

                    if consecutive_failures >= self.settings.max_failures {
                        error!("❌ Stopping after {} consecutive failures", consecutive_failures);
                        return Err(e.context(format!(
                            "Agent stopped after {} consecutive failures",
                            consecutive_failures
                        )));
                    }
                }
            }
        }

        warn!(
            "Reached the step limit ({}) without completing the task",
            self.settings.max_steps
        );
        Ok(history)
    }

    async fn step(&self, step: u32, history: &AgentHistory) -> Result<AgentStep> {
        let started_at = Utc::now();

        let snapshot = self
            .context
            .snapshot()
            .await
            .context("Failed to capture page state")?;

        let prompt = prompt::step_prompt(
            &self.task,
            history,
            &snapshot,
            step,
            self.settings.max_steps,
            self.settings.max_actions_per_step,
        );
        let reply = self.model.generate(&prompt).await?;
        let output = parse_output(&reply)?;

        let brain = output.current_state;
        debug!("Eval: {}", brain.evaluation_previous_goal);
        debug!("Memory: {}", brain.memory);
        info!("🎯 Next goal: {}", brain.next_goal);

        let mut requested = output.action;
        if requested.len() > self.settings.max_actions_per_step {
            warn!(
                "Model requested {} actions, keeping the first {}",
                requested.len(),
                self.settings.max_actions_per_step
            );
            requested.truncate(self.settings.max_actions_per_step);
        }

        let total = requested.len();
        let mut actions = Vec::with_capacity(total);
        let mut results = Vec::with_capacity(total);

        for action in requested {
            debug!("🛠️  Action {}/{}: {}", actions.len() + 1, total, action);
            let result = self.execute(&action, &snapshot).await;
            let stop = result.is_done || action.changes_page();

            actions.push(action);
            results.push(result);

            if stop {
                if actions.len() < total {
                    debug!("Page changed, skipping {} remaining actions", total - actions.len());
                }
                break;
            }
        }

        Ok(AgentStep {
            step,
            url: snapshot.url,
            title: snapshot.title,
            brain: Some(brain),
            actions,
            results,
            started_at,
        })
    }

    /// Execute one action. Failures become error results rather than errors.
    async fn execute(&self, action: &Action, snapshot: &PageSnapshot) -> ActionResult {
        let outcome = match action {
            Action::GoToUrl { url } => self
                .context
                .navigate(url)
                .await
                .map(|_| format!("Navigated to {}", url)),
            Action::SearchGoogle { query } => match google_search_url(query) {
                Ok(url) => self
                    .context
                    .navigate(url.as_str())
                    .await
                    .map(|_| format!("Searched for \"{}\" in Google", query)),
                Err(e) => Err(e),
            },
            Action::ClickElement { index } => match element_text(snapshot, *index) {
                Ok(text) => self
                    .context
                    .click(*index)
                    .await
                    .map(|_| format!("Clicked element {}: {}", index, text)),
                Err(e) => Err(e),
            },
            Action::InputText { index, text } => match element_text(snapshot, *index) {
                Ok(_) => self
                    .context
                    .input_text(*index, text)
                    .await
                    .map(|_| format!("Input \"{}\" into element {}", text, index)),
                Err(e) => Err(e),
            },
            Action::Scroll { direction } => {
                self.context.scroll(*direction).await.map(|_| match direction {
                    ScrollDirection::Down => "Scrolled down".to_string(),
                    ScrollDirection::Up => "Scrolled up".to_string(),
                })
            }
            Action::GoBack {} => self
                .context
                .go_back()
                .await
                .map(|_| "Navigated back".to_string()),
            Action::ExtractContent { goal } => self.extract(goal).await,
            Action::Done { text, success } => return ActionResult::done(text.clone(), *success),
        };

        match outcome {
            Ok(content) => {
                info!("📄 {}", content);
                ActionResult::content(content)
            }
            Err(e) => {
                warn!("Action {} failed: {:#}", action.name(), e);
                ActionResult::error(format!("{:#}", e))
            }
        }
    }

    async fn extract(&self, goal: &str) -> Result<String> {
        let snapshot = self.context.snapshot().await?;
        let extracted = self
            .model
            .generate(&prompt::extraction_prompt(goal, &snapshot))
            .await?;
        Ok(format!("Extracted from {}: {}", snapshot.url, extracted.trim()))
    }
}

fn parse_output(reply: &str) -> Result<AgentOutput> {
    let text = strip_code_fence(reply);
    serde_json::from_str(&text)
        .with_context(|| format!("Model reply is not a valid action list: {}", text))
}

fn element_text(snapshot: &PageSnapshot, index: usize) -> Result<&str> {
    snapshot
        .elements
        .iter()
        .find(|el| el.index == index)
        .map(|el| el.text.as_str())
        .with_context(|| format!("Element with index {} does not exist", index))
}

fn google_search_url(query: &str) -> Result<Url> {
    Url::parse_with_params("https://www.google.com/search", &[("q", query), ("udm", "14")])
        .context("Failed to build search URL")
}
