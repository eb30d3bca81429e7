use super::folders;
use crate::agent::{Agent, AgentHistory, AgentSettings, SearchTask};
use crate::browser::{with_context, BrowserContext, BrowserSettings, ChromeContext};
use crate::config::ScoutConfig;
use crate::llm::{GeminiClient, GenerativeModel};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the agent in `context` and save its history under `output_root`.
///
/// The context is closed whether or not the agent succeeds; nothing is saved
/// when it fails.
pub async fn run_search(
    context: Arc<dyn BrowserContext>,
    model: &dyn GenerativeModel,
    task: &str,
    settings: AgentSettings,
    output_root: &Path,
) -> Result<PathBuf> {
    let history = with_context(context, |ctx| async move {
        Agent::new(task, model, &*ctx, settings).run().await
    })
    .await?;

    let output_file = folders::save_output(output_root, &history.to_string()).await?;
    info!("💾 Saved agent output to {}", output_file.display());

    Ok(output_file)
}

/// Run the agent in `context` and hand back its history without saving it
pub async fn run_local_search(
    context: Arc<dyn BrowserContext>,
    model: &dyn GenerativeModel,
    task: &str,
    settings: AgentSettings,
) -> Result<AgentHistory> {
    let history = with_context(context, |ctx| async move {
        Agent::new(task, model, &*ctx, settings).run().await
    })
    .await?;

    match history.final_result() {
        Some(result) => info!("Final result: {}", result),
        None => warn!("Agent finished without a final result"),
    }

    Ok(history)
}

fn agent_model(config: &ScoutConfig) -> Result<GeminiClient> {
    GeminiClient::new(
        config.gemini_endpoint.as_str(),
        config.agent_model.as_str(),
        config.gemini_api_key.clone(),
    )
    .context("Failed to create Gemini client")
}

/// Managed-browser search whose history lands in a new task folder
pub async fn search_and_save(
    config: &ScoutConfig,
    task: &SearchTask,
    browser: BrowserSettings,
    settings: AgentSettings,
) -> Result<PathBuf> {
    let model = agent_model(config)?;
    let context: Arc<dyn BrowserContext> = Arc::new(ChromeContext::open(browser).await?);

    run_search(context, &model, &task.describe(), settings, &config.output_root).await
}

/// Search in the user's own Chrome; the history is only logged
pub async fn search_with_local_browser(
    config: &ScoutConfig,
    task: &SearchTask,
    browser: BrowserSettings,
    settings: AgentSettings,
) -> Result<AgentHistory> {
    let model = agent_model(config)?;
    let context: Arc<dyn BrowserContext> = Arc::new(ChromeContext::open(browser).await?);

    run_local_search(context, &model, &task.describe(), settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakeContext;
    use crate::llm::testing::ScriptedModel;
    use std::sync::atomic::Ordering;

    fn settings() -> AgentSettings {
        AgentSettings {
            max_steps: 5,
            max_actions_per_step: 4,
            max_failures: 1,
        }
    }

    #[tokio::test]
    async fn history_is_saved_and_browser_closed() {
        let dir = tempfile::tempdir().unwrap();
        let context = Arc::new(FakeContext::new());
        let model = ScriptedModel::new(vec![
            r#"{"action": [{"done": {"text": "[{\"price\": \"$250,000\"}]"}}]}"#,
        ]);

        let path = run_search(context.clone(), &model, "find flats", settings(), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("workflow1").join("output.txt"));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("Task: find flats\n"));
        assert!(saved.contains(r#"[{"price": "$250,000"}]"#));
        assert!(context.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn two_runs_get_two_folders() {
        let dir = tempfile::tempdir().unwrap();
        let done = r#"{"action": [{"done": {"text": "ok"}}]}"#;

        for _ in 0..2 {
            let model = ScriptedModel::replying(done);
            run_search(Arc::new(FakeContext::new()), &model, "t", settings(), dir.path())
                .await
                .unwrap();
        }

        assert!(dir.path().join("workflow1").join("output.txt").is_file());
        assert!(dir.path().join("workflow2").join("output.txt").is_file());
    }

    #[tokio::test]
    async fn browser_closed_and_nothing_saved_when_agent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let context = Arc::new(FakeContext::new());
        let model = ScriptedModel::failing();

        let result = run_search(context.clone(), &model, "find flats", settings(), dir.path()).await;

        assert!(result.is_err());
        assert!(context.closed.load(Ordering::SeqCst));
        assert!(!dir.path().join("workflow1").exists());
    }

    #[tokio::test]
    async fn local_search_returns_history_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let context = Arc::new(FakeContext::new());
        let model = ScriptedModel::new(vec![
            r#"{"action": [{"go_to_url": {"url": "https://listings.test"}}]}"#,
            r#"{"action": [{"done": {"text": "5 flats"}}]}"#,
        ]);

        let history = run_local_search(context.clone(), &model, "find flats", settings())
            .await
            .unwrap();

        assert_eq!(history.final_result(), Some("5 flats"));
        assert!(context.closed.load(Ordering::SeqCst));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
