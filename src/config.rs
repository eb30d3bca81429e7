use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_AGENT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_STRUCTURER_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OUTPUT_ROOT: &str = "extracted_data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to read {path}: {source}")]
    Dotenv {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// Gemini API key, masked in debug output
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() < 4 {
            write!(f, "ApiKey(***)")
        } else {
            let prefix: String = self.0.chars().take(4).collect();
            write!(f, "ApiKey({prefix}***)")
        }
    }
}

/// Settings shared by every entry point, validated once at startup
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub gemini_api_key: ApiKey,
    pub agent_model: String,
    pub structurer_model: String,
    pub gemini_endpoint: String,
    pub output_root: PathBuf,
    pub chrome_path: Option<PathBuf>,
}

/// Shape of the merged configuration sources before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    gemini_api_key: Option<ApiKey>,
    #[serde(default = "default_agent_model")]
    agent_model: String,
    #[serde(default = "default_structurer_model")]
    structurer_model: String,
    #[serde(default = "default_endpoint")]
    gemini_endpoint: String,
    #[serde(default = "default_output_root")]
    output_root: PathBuf,
    chrome_path: Option<PathBuf>,
}

fn default_agent_model() -> String {
    DEFAULT_AGENT_MODEL.to_string()
}

fn default_structurer_model() -> String {
    DEFAULT_STRUCTURER_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

impl ScoutConfig {
    /// Load from the working directory: `.env`, then `scout.toml`, then the
    /// process environment, later sources winning.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let builder = dotenv_defaults(config::Config::builder(), &dir.join(".env"))?
            .add_source(
                config::File::from(dir.join("scout.toml"))
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(config::Environment::default());

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = builder.build()?.try_deserialize()?;

        let gemini_api_key = raw
            .gemini_api_key
            .filter(|key| !key.expose().trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let config = Self {
            gemini_api_key,
            agent_model: raw.agent_model,
            structurer_model: raw.structurer_model,
            gemini_endpoint: raw.gemini_endpoint,
            output_root: raw.output_root,
            chrome_path: raw.chrome_path,
        };
        debug!("Loaded configuration: {:?}", config);

        Ok(config)
    }

    /// Local Chrome executable, falling back to the platform's usual install path
    pub fn chrome_executable(&self) -> PathBuf {
        self.chrome_path.clone().unwrap_or_else(default_chrome_path)
    }
}

/// Seed `builder` with the `KEY=VALUE` pairs of an optional `.env` file.
///
/// Keys are lowercased to line up with the field names, and the pairs go in
/// as defaults so every other source overrides them. The process environment
/// is left untouched.
fn dotenv_defaults(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    path: &Path,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    if !path.is_file() {
        return Ok(builder);
    }

    let dotenv_err = |source: dotenvy::Error| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    };
    for item in dotenvy::from_path_iter(path).map_err(dotenv_err)? {
        let (key, value) = item.map_err(dotenv_err)?;
        builder = builder.set_default(key.to_lowercase(), value)?;
    }
    debug!("Read settings from {}", path.display());

    Ok(builder)
}

fn default_chrome_path() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
    } else {
        PathBuf::from("/usr/bin/google-chrome")
    }
}
