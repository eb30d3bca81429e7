use super::actions::{Action, ActionResult, AgentBrain};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record of one agent step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub step: u32,
    pub url: String,
    pub title: String,
    pub brain: Option<AgentBrain>,
    pub actions: Vec<Action>,
    pub results: Vec<ActionResult>,
    pub started_at: DateTime<Utc>,
}

impl AgentStep {
    /// A step that failed before any action ran
    pub fn failed(step: u32, started_at: DateTime<Utc>, error: &anyhow::Error) -> Self {
        Self {
            step,
            url: String::new(),
            title: String::new(),
            brain: None,
            actions: Vec::new(),
            results: vec![ActionResult::error(format!("{:#}", error))],
            started_at,
        }
    }

    pub fn is_done(&self) -> bool {
        self.results.iter().any(|r| r.is_done)
    }
}

/// Everything the agent did for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHistory {
    pub task: String,
    pub steps: Vec<AgentStep>,
}

impl AgentHistory {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: AgentStep) {
        self.steps.push(step);
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_done(&self) -> bool {
        self.steps.last().map(AgentStep::is_done).unwrap_or(false)
    }

    /// Text of the `done` action, if the task finished
    pub fn final_result(&self) -> Option<&str> {
        self.steps
            .last()?
            .results
            .iter()
            .find(|r| r.is_done)
            .and_then(|r| r.extracted_content.as_deref())
    }

    pub fn errors(&self) -> Vec<&str> {
        self.results().filter_map(|r| r.error.as_deref()).collect()
    }

    pub fn extracted_content(&self) -> Vec<&str> {
        self.results()
            .filter_map(|r| r.extracted_content.as_deref())
            .collect()
    }

    /// Distinct URLs visited, in order
    pub fn urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !step.url.is_empty() && urls.last() != Some(&step.url.as_str()) {
                urls.push(&step.url);
            }
        }
        urls
    }

    fn results(&self) -> impl Iterator<Item = &ActionResult> {
        self.steps.iter().flat_map(|s| s.results.iter())
    }
}

impl fmt::Display for AgentHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task: {}", self.task)?;
        writeln!(
            f,
            "Steps: {} | Done: {} | Errors: {}",
            self.total_steps(),
            self.is_done(),
            self.errors().len()
        )?;

        for step in &self.steps {
            writeln!(f)?;
            writeln!(f, "## Step {} ({})", step.step, step.started_at.to_rfc3339())?;
            if !step.url.is_empty() {
                writeln!(f, "URL: {} | {}", step.url, step.title)?;
            }
            if let Some(brain) = &step.brain {
                writeln!(f, "Evaluation: {}", brain.evaluation_previous_goal)?;
                writeln!(f, "Memory: {}", brain.memory)?;
                writeln!(f, "Next goal: {}", brain.next_goal)?;
            }
            for action in &step.actions {
                writeln!(f, "Action: {}", action)?;
            }
            for result in &step.results {
                if let Some(content) = &result.extracted_content {
                    writeln!(f, "Result: {}", content)?;
                }
                if let Some(error) = &result.error {
                    writeln!(f, "Error: {}", error)?;
                }
            }
        }

        if let Some(result) = self.final_result() {
            writeln!(f)?;
            writeln!(f, "## Final result")?;
            writeln!(f, "{}", result)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, url: &str, results: Vec<ActionResult>) -> AgentStep {
        AgentStep {
            step: n,
            url: url.to_string(),
            title: "Listings".to_string(),
            brain: Some(AgentBrain {
                evaluation_previous_goal: "Success".to_string(),
                memory: "Searching".to_string(),
                next_goal: format!("goal {}", n),
            }),
            actions: vec![Action::Scroll {
                direction: crate::browser::ScrollDirection::Down,
            }],
            results,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn queries_over_a_finished_history() {
        let mut history = AgentHistory::new("find flats");
        history.push(step(1, "https://a.test", vec![ActionResult::content("Scrolled down")]));
        history.push(step(1, "https://a.test", vec![ActionResult::error("element 9 missing")]));
        history.push(step(
            3,
            "https://b.test",
            vec![ActionResult::done(r#"[{"price": "$250,000"}]"#, true)],
        ));

        assert!(history.is_done());
        assert_eq!(history.total_steps(), 3);
        assert_eq!(history.final_result(), Some(r#"[{"price": "$250,000"}]"#));
        assert_eq!(history.errors(), vec!["element 9 missing"]);
        assert_eq!(history.urls(), vec!["https://a.test", "https://b.test"]);
        assert_eq!(history.extracted_content().len(), 2);
    }

    #[test]
    fn unfinished_history_has_no_final_result() {
        let mut history = AgentHistory::new("find flats");
        history.push(AgentStep::failed(
            1,
            Utc::now(),
            &anyhow::anyhow!("model timed out"),
        ));

        assert!(!history.is_done());
        assert_eq!(history.final_result(), None);
        assert_eq!(history.errors(), vec!["model timed out"]);
    }

    #[test]
    fn display_includes_goals_actions_and_final_result() {
        let mut history = AgentHistory::new("find flats");
        history.push(step(1, "https://a.test", vec![ActionResult::done("3 flats found", true)]));

        let text = history.to_string();
        assert!(text.starts_with("Task: find flats\nSteps: 1 | Done: true | Errors: 0\n"));
        assert!(text.contains("URL: https://a.test | Listings"));
        assert!(text.contains("Next goal: goal 1"));
        assert!(text.contains(r#"Action: {"scroll":{"direction":"down"}}"#));
        assert!(text.ends_with("## Final result\n3 flats found\n"));
    }
}
