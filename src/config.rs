use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ::config::{File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::editor;
use crate::error::{EzCommitError, Result};
use crate::utils;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant that generates clear and concise git commit messages.
Follow these guidelines:
- Use the imperative mood (\"Add feature\" not \"Added feature\")
- Keep the first line under 50 characters
- Provide more detailed explanation in subsequent paragraphs if necessary
- Reference relevant issue numbers if applicable
- Focus on the \"what\" and \"why\" of the changes, not the \"how\"
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overridden by `OPENAI_API_KEY` when that is set
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// May contain a `{diff}` placeholder
    pub system_prompt: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Parses a YAML document, filling missing fields from defaults.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let settings: Self = ::config::Config::builder()
            .add_source(File::from_str(source, FileFormat::Yaml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| EzCommitError::Config(format!("Invalid configuration: {}", e)))?;
        settings.normalized()
    }

    fn from_file(path: &Path) -> Result<Self> {
        let settings: Self = ::config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| {
                EzCommitError::Config(format!("Failed to load {}: {}", path.display(), e))
            })?;
        settings.normalized()
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| EzCommitError::Config(format!("Failed to serialize configuration: {}", e)))
    }

    fn normalized(mut self) -> Result<Self> {
        if self.temperature.is_nan() {
            return Err(EzCommitError::Config(
                "temperature must be a number between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            let clamped = self.temperature.clamp(0.0, 1.0);
            warn!(
                "temperature {} out of range [0.0, 1.0], using {}",
                self.temperature, clamped
            );
            self.temperature = clamped;
        }
        if self.max_tokens == 0 {
            return Err(EzCommitError::Config("max_tokens must be a positive integer".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(EzCommitError::Config(
                "request_timeout_secs must be a positive integer".to_string(),
            ));
        }
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
        Ok(self)
    }

    /// `OPENAI_API_KEY` if set and non-empty, else the stored key.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    /// Parses and validates `value`, then assigns it to `field`.
    pub fn apply(&mut self, field: Field, value: &str) -> Result<()> {
        match field {
            Field::ApiKey => self.api_key = Some(non_empty(value, "API key")?),
            Field::Model => self.model = non_empty(value, "Model name")?,
            Field::Temperature => self.temperature = parse_temperature(value)?,
            Field::MaxTokens => self.max_tokens = parse_positive(value, "max_tokens")?,
            Field::SystemPrompt => {
                let prompt = value.trim();
                if prompt.is_empty() {
                    return Err(EzCommitError::Config("System prompt cannot be empty".to_string()));
                }
                self.system_prompt = prompt.to_string();
            }
            Field::ApiBaseUrl => {
                self.api_base_url = non_empty(value, "API base URL")?.trim_end_matches('/').to_string()
            }
            Field::RequestTimeout => {
                self.request_timeout_secs = parse_positive(value, "request_timeout_secs")?
            }
        }
        Ok(())
    }
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EzCommitError::Config(format!("{} cannot be empty", what)));
    }
    Ok(value.to_string())
}

fn parse_temperature(value: &str) -> Result<f32> {
    let value = value.trim();
    if value.contains(|c: char| c.eq_ignore_ascii_case(&'e')) {
        return Err(EzCommitError::Config(
            "Temperature must be a decimal number between 0.0 and 1.0".to_string(),
        ));
    }
    let temperature: f32 = value.parse().map_err(|_| {
        EzCommitError::Config("Temperature must be a valid number between 0.0 and 1.0".to_string())
    })?;
    if !(0.0..=1.0).contains(&temperature) {
        return Err(EzCommitError::Config("Temperature must be between 0.0 and 1.0".to_string()));
    }
    Ok(temperature)
}

fn parse_positive<T>(value: &str, what: &str) -> Result<T>
where
    T: FromStr + PartialEq + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(EzCommitError::Config(format!("{} must be a positive integer", what))),
    }
}

/// A point-editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ApiKey,
    Model,
    Temperature,
    MaxTokens,
    SystemPrompt,
    ApiBaseUrl,
    RequestTimeout,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiKey => "api_key",
            Self::Model => "model",
            Self::Temperature => "temperature",
            Self::MaxTokens => "max_tokens",
            Self::SystemPrompt => "system_prompt",
            Self::ApiBaseUrl => "api_base_url",
            Self::RequestTimeout => "request_timeout_secs",
        };
        f.write_str(name)
    }
}

/// The settings document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(utils::default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the document with defaults if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "creating default configuration");
            self.save(&Settings::default())?;
        }
        Ok(())
    }

    pub fn get(&self) -> Result<Settings> {
        self.ensure_exists()?;
        Settings::from_file(&self.path)
    }

    /// Updates a single field and persists the document.
    pub fn set(&self, field: Field, value: &str) -> Result<Settings> {
        let mut settings = self.get()?;
        settings.apply(field, value)?;
        self.save(&settings)?;
        debug!(%field, "configuration updated");
        Ok(settings)
    }

    pub fn reset(&self) -> Result<Settings> {
        let settings = Settings::default();
        self.save(&settings)?;
        Ok(settings)
    }

    /// Edits the whole document in the user's editor.
    ///
    /// The stored file only changes when the edited text parses.
    pub fn edit(&self) -> Result<Settings> {
        let current = self.get()?.to_yaml()?;
        let edited = editor::edit_text(&current, ".yaml")?;
        let settings = Settings::from_yaml(&edited)?;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Edits only the system prompt in the user's editor.
    pub fn edit_prompt(&self) -> Result<Settings> {
        let mut settings = self.get()?;
        let edited = editor::edit_text(&settings.system_prompt, ".txt")?;
        settings.apply(Field::SystemPrompt, &edited)?;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Replaces the document atomically via a sibling temporary file.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let yaml = settings.to_yaml()?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.write_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(yaml.as_bytes()).map_err(|e| self.write_error(e))?;
        tmp.flush().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> EzCommitError {
        EzCommitError::Config(format!("Failed to write {}: {}", self.path.display(), e))
    }
}
