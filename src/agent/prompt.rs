use super::history::AgentHistory;
use crate::browser::PageSnapshot;
use std::fmt::Write;

/// Longest result text carried into the memory section
const MEMORY_RESULT_CHARS: usize = 400;

const SYSTEM_RULES: &str = r#"You are a browser automation agent. You see the current page as a list of
interactive elements, each with a numeric index, followed by the visible page text.
Complete the task by choosing actions. Rules:
- Only use indexes that appear in the current element list.
- After navigating or clicking, the page may change; later actions in the same step are skipped.
- Use extract_content to capture information you will need for the final answer.
- When the task is complete, or cannot be completed, call done with the full answer in "text".

Respond with JSON only, in exactly this shape:
{
  "current_state": {
    "evaluation_previous_goal": "Success|Failed|Unknown - short reason",
    "memory": "what has been done and what to remember",
    "next_goal": "what the next actions should achieve"
  },
  "action": [ one or more actions ]
}

Available actions:
{"go_to_url": {"url": "https://..."}}
{"search_google": {"query": "..."}}
{"click_element": {"index": 0}}
{"input_text": {"index": 0, "text": "..."}}
{"scroll": {"direction": "down"}}     (or "up")
{"go_back": {}}
{"extract_content": {"goal": "what to extract from the page"}}
{"done": {"text": "final answer", "success": true}}
"#;

/// Prompt for one agent step
pub fn step_prompt(
    task: &str,
    history: &AgentHistory,
    snapshot: &PageSnapshot,
    step: u32,
    max_steps: u32,
    max_actions: usize,
) -> String {
    let mut prompt = String::from(SYSTEM_RULES);
    let _ = writeln!(prompt, "Use at most {} actions per step.", max_actions);
    let _ = writeln!(prompt, "\nTask:\n{}", task);

    prompt.push_str("\nPrevious steps:\n");
    if history.steps.is_empty() {
        prompt.push_str("(none)\n");
    }
    for past in &history.steps {
        let goal = past
            .brain
            .as_ref()
            .map(|brain| brain.next_goal.as_str())
            .unwrap_or("");
        let _ = writeln!(prompt, "Step {}: {}", past.step, goal);
        for (action, result) in past.actions.iter().zip(&past.results) {
            let _ = writeln!(prompt, "  {} -> {}", action, summarize(result));
        }
        if past.actions.is_empty() {
            for result in &past.results {
                let _ = writeln!(prompt, "  {}", summarize(result));
            }
        }
    }

    let _ = writeln!(prompt, "\nStep {} of {}. Current page:", step, max_steps);
    prompt.push_str(&snapshot.render());
    prompt.push('\n');
    prompt
}

/// Prompt for pulling information out of page text
pub fn extraction_prompt(goal: &str, snapshot: &PageSnapshot) -> String {
    format!(
        "Extract the following from the page below: {}\n\
         Answer with the extracted information only. If it is not present, say so.\n\n\
         Page: {} ({})\n{}\n",
        goal, snapshot.title, snapshot.url, snapshot.text
    )
}

fn summarize(result: &super::actions::ActionResult) -> String {
    let text = match (&result.error, &result.extracted_content) {
        (Some(error), _) => format!("error: {}", error),
        (None, Some(content)) => content.clone(),
        (None, None) => "ok".to_string(),
    };

    match text.char_indices().nth(MEMORY_RESULT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::actions::{Action, ActionResult, AgentBrain};
    use crate::agent::history::AgentStep;
    use chrono::Utc;

    fn snapshot() -> PageSnapshot {
        PageSnapshot {
            url: "https://listings.test/search".to_string(),
            title: "Search".to_string(),
            elements: Vec::new(),
            text: "No results".to_string(),
        }
    }

    #[test]
    fn first_step_prompt_has_task_and_page() {
        let history = AgentHistory::new("Find 3 apartments");
        let prompt = step_prompt("Find 3 apartments", &history, &snapshot(), 1, 50, 25);

        assert!(prompt.contains("Use at most 25 actions per step."));
        assert!(prompt.contains("Task:\nFind 3 apartments"));
        assert!(prompt.contains("Previous steps:\n(none)"));
        assert!(prompt.contains("Step 1 of 50. Current page:"));
        assert!(prompt.contains("Current url: https://listings.test/search"));
    }

    #[test]
    fn memory_pairs_actions_with_results() {
        let mut history = AgentHistory::new("task");
        history.push(AgentStep {
            step: 1,
            url: "https://listings.test".to_string(),
            title: "Home".to_string(),
            brain: Some(AgentBrain {
                next_goal: "Search for flats".to_string(),
                ..Default::default()
            }),
            actions: vec![Action::ClickElement { index: 3 }],
            results: vec![ActionResult::error("No element with index 3")],
            started_at: Utc::now(),
        });

        let prompt = step_prompt("task", &history, &snapshot(), 2, 50, 25);

        assert!(prompt.contains("Step 1: Search for flats"));
        assert!(prompt.contains(r#"{"click_element":{"index":3}} -> error: No element with index 3"#));
    }

    #[test]
    fn long_results_are_shortened() {
        let result = ActionResult::content("x".repeat(1_000));
        let summary = summarize(&result);
        assert_eq!(summary.len(), MEMORY_RESULT_CHARS + 3);
    }
}
