use clap::Parser;
use listing_scout::agent::{AgentSettings, SearchTask};
use listing_scout::browser::BrowserSettings;
use listing_scout::workflow;
use listing_scout::ScoutConfig;
use std::path::PathBuf;
use tracing::info;

/// Search for New Cairo apartments in your own Chrome
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Chrome executable to start when none is listening for DevTools
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Maximum number of agent steps
    #[arg(long, default_value_t = 25)]
    max_steps: u32,

    /// Maximum number of actions per step
    #[arg(long, default_value_t = 4)]
    max_actions: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    listing_scout::init_logging();
    let args = Args::parse();
    let config = ScoutConfig::load()?;

    let executable = args.chrome_path.unwrap_or_else(|| config.chrome_executable());
    info!("🏠 Listing Scout - Local Chrome at {}", executable.display());

    let task = SearchTask::new_cairo();
    let settings = AgentSettings {
        max_steps: args.max_steps,
        max_actions_per_step: args.max_actions,
        ..AgentSettings::default()
    };

    let history = workflow::search_with_local_browser(
        &config,
        &task,
        BrowserSettings::local_instance(executable),
        settings,
    )
    .await?;
    info!("Agent ran {} steps", history.total_steps());

    Ok(())
}
