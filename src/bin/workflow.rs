use clap::Parser;
use listing_scout::agent::{AgentSettings, SearchTask};
use listing_scout::browser::BrowserSettings;
use listing_scout::workflow;
use listing_scout::ScoutConfig;
use tracing::info;

/// Search for New York apartments with a browser agent and save the run
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Maximum number of agent steps
    #[arg(long, default_value_t = 50)]
    max_steps: u32,

    /// Maximum number of actions per step
    #[arg(long, default_value_t = 25)]
    max_actions: usize,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    listing_scout::init_logging();
    let args = Args::parse();
    let config = ScoutConfig::load()?;

    info!("🏠 Listing Scout - Browser Agent");
    info!("================================");

    let task = SearchTask::new_york();
    let browser = BrowserSettings {
        headless: args.headless,
        ..BrowserSettings::managed()
    };
    let settings = AgentSettings {
        max_steps: args.max_steps,
        max_actions_per_step: args.max_actions,
        ..AgentSettings::default()
    };

    let output_file = workflow::search_and_save(&config, &task, browser, settings).await?;
    info!("✅ Agent output written to {}", output_file.display());

    Ok(())
}
