use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_KEY_FILE: &str = "key.env";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,

    /// Model to send every turn to
    pub model: String,

    /// Ask the server for a streamed reply (only the final text is used)
    pub stream: bool,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// dotenv-style file holding the API keys
    pub key_file: PathBuf,

    /// Run trace export
    pub tracing: TraceConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// groqchat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Run trace export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub project: String,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream: true,
            temperature: None,
            max_tokens: None,
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            tracing: TraceConfig::default(),
            ui: UiConfig::default(),
            home: default_home(),
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.smith.langchain.com".to_string(),
            project: "Groq_ChatBot".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Chat with AI".to_string(),
            placeholder: "Type your message here...".to_string(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".groqchat")
}

impl Config {
    /// Load configuration from an explicit path, or `~/.groqchat/config.toml`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".groqchat");
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| home.join("config.toml"));

        let mut config = Self::load_from_path(&config_path)?;
        config.home = home;
        Ok(config)
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, model: Option<String>, key_file: Option<PathBuf>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(key_file) = key_file {
            self.key_file = key_file;
        }
        self
    }

    /// Ensure the home directory exists (holds the log file)
    pub fn ensure_home(&self) -> Result<()> {
        fs::create_dir_all(&self.home)
            .with_context(|| format!("Failed to create {}", self.home.display()))
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("groqchat.log")
    }

    /// Chat completions endpoint for the configured base URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Render as TOML for `groqchat config`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
