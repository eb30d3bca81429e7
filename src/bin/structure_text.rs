use clap::Parser;
use listing_scout::llm::GeminiClient;
use listing_scout::{ScoutConfig, TextStructurer};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Turn a saved agent output into a listings CSV
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Text file to structure
    #[arg(default_value = "extracted_data/workflow3/output.txt")]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    listing_scout::init_logging();
    let args = Args::parse();
    let config = ScoutConfig::load()?;

    let model = GeminiClient::new(
        config.gemini_endpoint.as_str(),
        config.structurer_model.as_str(),
        config.gemini_api_key.clone(),
    )?;
    let structurer = TextStructurer::new(model);

    // Failures are already logged by the structurer
    match structurer.extract_and_process_file(&args.path).await {
        Ok(csv_path) => {
            info!("Successfully processed and saved to CSV: {}", csv_path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
