//! Turns a raw agent dump into a six-column listings CSV by asking a
//! generative model to restate it as JSON.

use crate::llm::{strip_code_fence, GenerativeModel, LlmError};
use crate::models::{ListingRecord, LISTING_FIELDS};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Error reading {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Error in Gemini processing: {0}")]
    Generation(#[from] LlmError),

    #[error("Error parsing Gemini response as JSON: {source}")]
    MalformedResponse {
        source: serde_json::Error,
        raw: String,
    },

    #[error("Unexpected JSON shape: {0}")]
    UnexpectedShape(String),

    #[error("Model returned no listings")]
    NoListings,

    #[error("Error writing {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

const STRUCTURE_PROMPT: &str = r#"
Analyze this data and structure it into a clean format suitable for CSV.
Return the data as a valid JSON array of objects, where each object represents a property listing
with these fields: name, location, price, bedrooms, bathrooms, area.
If a field is missing, use an empty string.
Format the response as pure JSON without any additional text or explanation.

Data to analyze: "#;

pub fn build_prompt(content: &str) -> String {
    format!("{}{}\n", STRUCTURE_PROMPT, content)
}

/// Normalize a parsed model answer into listing records
pub fn normalize_listings(value: Value) -> Result<Vec<ListingRecord>, StructureError> {
    let entries = match value {
        Value::Array(entries) => entries,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(StructureError::UnexpectedShape(format!(
                "expected an object or an array of objects, got {}",
                other
            )))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| match entry {
            Value::Object(object) => Ok(ListingRecord::from_object(object)),
            other => Err(StructureError::UnexpectedShape(format!(
                "listing {} is not an object: {}",
                idx, other
            ))),
        })
        .collect()
}

/// Write records to `<directory>/<base_filename>_structured.csv`
pub async fn save_to_csv(
    records: &[ListingRecord],
    directory: &Path,
    base_filename: &str,
) -> Result<PathBuf, StructureError> {
    let csv_path = directory.join(format!("{}_structured.csv", base_filename));
    let write_err = |source: csv::Error| StructureError::Write {
        path: csv_path.clone(),
        source,
    };

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(LISTING_FIELDS).map_err(write_err)?;
    for record in records {
        wtr.write_record(record.values()).map_err(write_err)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| write_err(e.into_error().into()))?;

    fs::create_dir_all(directory)
        .await
        .map_err(|e| write_err(e.into()))?;
    fs::write(&csv_path, bytes)
        .await
        .map_err(|e| write_err(e.into()))?;

    Ok(csv_path)
}

/// Structures raw text files with a generative model
pub struct TextStructurer<M> {
    model: M,
}

impl<M: GenerativeModel> TextStructurer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Ask the model to restate `content` as listings. One call, no retry.
    pub async fn process_with_gemini(
        &self,
        content: &str,
    ) -> Result<Vec<ListingRecord>, StructureError> {
        let response = self.model.generate(&build_prompt(content)).await?;
        let response_text = strip_code_fence(&response);

        let value: Value = serde_json::from_str(&response_text).map_err(|source| {
            StructureError::MalformedResponse {
                source,
                raw: response_text.clone(),
            }
        })?;

        normalize_listings(value)
    }

    /// Read `path`, structure it and save the CSV next to it.
    ///
    /// Every failure is logged here; callers get the reason back and can
    /// rely on no CSV having been written.
    pub async fn extract_and_process_file(&self, path: &Path) -> Result<PathBuf, StructureError> {
        let result = self.process_file(path).await;

        match &result {
            Ok(csv_path) => info!("Processed data saved to: {}", csv_path.display()),
            Err(StructureError::MalformedResponse { source, raw }) => {
                error!("Error parsing Gemini response as JSON: {}", source);
                error!("Raw response: {}", raw);
            }
            Err(StructureError::NoListings) => error!("Failed to structure the data"),
            Err(e) => error!("{}", e),
        }

        result
    }

    async fn process_file(&self, path: &Path) -> Result<PathBuf, StructureError> {
        let text = fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StructureError::FileNotFound(path.to_path_buf())
            } else {
                StructureError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        info!(
            "Structuring {} ({} bytes) with {}",
            path.display(),
            text.len(),
            self.model.model_name()
        );

        let records = self.process_with_gemini(&text).await?;
        if records.is_empty() {
            return Err(StructureError::NoListings);
        }

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let base_filename = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        save_to_csv(&records, directory, &base_filename).await
    }
}
