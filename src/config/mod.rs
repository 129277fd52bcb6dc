use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub mod file_config;

pub use file_config::{ApiSection, FileConfig, GenerationSection, RetrySection};

use crate::env::{apis, files, generation};
use crate::error::AdForgeError;
#[cfg(feature = "reqwest")]
use crate::services::google_ai::GoogleAiConfig;
use crate::services::google_ai::{ImageModel, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_TEXT_MODEL};

/// Effective configuration: built-in defaults, then the TOML file, then the
/// environment. CLI flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub text_model: String,
    pub image_model: ImageModel,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            max_concurrent_requests: 15,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: ImageModel::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Loads from `path`, or from `$ADFORGE_CONFIG` when no path is given,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(files::CONFIG_FILE).ok().map(PathBuf::from));

        if let Some(file_path) = file_path {
            let file = FileConfig::load_from_file(&file_path)?;
            config.apply_file(&file);
            tracing::debug!(path = %file_path.display(), "Loaded configuration file");
        }

        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: &FileConfig) {
        if let Some(api_key) = &file.api.api_key {
            self.api_key = api_key.clone();
        }
        if let Some(base_url) = &file.api.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(timeout) = file.api.timeout_secs {
            self.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(max) = file.api.max_concurrent_requests {
            self.max_concurrent_requests = max;
        }
        if let Some(model) = &file.generation.text_model {
            self.text_model = model.clone();
        }
        if let Some(image_model) = file.generation.image_model {
            self.image_model = image_model;
        }
        if let Some(max_attempts) = file.retry.max_attempts {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = file.retry.base_delay_ms {
            self.retry.base_delay = Duration::from_millis(base_delay_ms);
        }
    }

    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_env_from(|name| env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(apis::GEMINI_API_KEY).or_else(|| lookup(apis::API_KEY)) {
            self.api_key = api_key;
        }
        if let Some(base_url) = lookup(apis::BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(model) = lookup(generation::TEXT_MODEL) {
            self.text_model = model;
        }
        if let Some(image_model) = lookup(generation::IMAGE_MODEL) {
            self.image_model = ImageModel::from_str(&image_model)
                .map_err(|e| AdForgeError::validation(generation::IMAGE_MODEL, e))?;
        }
        if let Some(value) = lookup(generation::MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_env(generation::MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(generation::BASE_DELAY_MS) {
            self.retry.base_delay = Duration::from_millis(parse_env(generation::BASE_DELAY_MS, &value)?);
        }
        if let Some(value) = lookup(generation::TIMEOUT) {
            self.request_timeout = Duration::from_secs(parse_env(generation::TIMEOUT, &value)?);
        }
        if let Some(value) = lookup(generation::CONCURRENT) {
            self.max_concurrent_requests = parse_env(generation::CONCURRENT, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.retry.validate()?;

        if self.text_model.trim().is_empty() {
            return Err(AdForgeError::validation("text_model", "cannot be empty"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(AdForgeError::validation(
                "max_concurrent_requests",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Client settings. Fails if no API key was configured.
    #[cfg(feature = "reqwest")]
    pub fn google_ai_config(&self) -> crate::Result<GoogleAiConfig> {
        self.validate()?;

        if self.api_key.is_empty() {
            return Err(AdForgeError::invalid_config(format!(
                "No API key found. Please set it with: export {}=\"your-api-key\"",
                apis::GEMINI_API_KEY
            )));
        }

        Ok(GoogleAiConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.request_timeout)
            .with_max_concurrent_requests(self.max_concurrent_requests))
    }

    /// File form of the effective settings. The API key is left out so the
    /// written file is safe to share.
    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            api: ApiSection {
                api_key: None,
                base_url: Some(self.base_url.clone()),
                timeout_secs: Some(self.request_timeout.as_secs()),
                max_concurrent_requests: Some(self.max_concurrent_requests),
            },
            generation: GenerationSection {
                text_model: Some(self.text_model.clone()),
                image_model: Some(self.image_model),
            },
            retry: RetrySection {
                max_attempts: Some(self.retry.max_attempts),
                base_delay_ms: Some(self.retry.base_delay.as_millis() as u64),
            },
        }
    }

    /// API key with all but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return "(not set)".to_string();
        }
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let hidden = chars.len() - 4;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AdForgeError::validation(name, format!("invalid value '{value}'")))
}
