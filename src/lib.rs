//! Browser-agent property search and listing structuring.
//!
//! Two halves meet at the filesystem: the agent runners drive Chrome with a
//! Gemini model and dump the run history to `extracted_data/workflowN/output.txt`,
//! and the structurer turns such a dump into `<name>_structured.csv`.

pub mod agent;
pub mod browser;
pub mod config;
pub mod llm;
pub mod models;
pub mod structurer;
pub mod workflow;

pub use config::{ConfigError, ScoutConfig};
pub use models::ListingRecord;
pub use structurer::{StructureError, TextStructurer};

/// Install the console subscriber used by every binary
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
