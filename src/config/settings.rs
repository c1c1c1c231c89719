use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

/// Used when neither the rc file, the environment nor a flag names a service
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "LEADBOARD_API_URL";
pub const ENV_API_TOKEN: &str = "LEADBOARD_API_TOKEN";

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Directory holding the rc file (`~/.leadboard`)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        Ok(home.join(".leadboard"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Resolve settings: defaults, then rc file, then environment, then the
    /// `--api-url` flag.
    pub fn load(api_url_flag: Option<&str>) -> Result<Settings> {
        let mut settings = Settings::default();

        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            settings.apply_rc(&content)
                .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
            log::debug!("Loaded config from {}", config_path.display());
        }

        settings.apply_env(|key| std::env::var(key).ok());

        if let Some(url) = api_url_flag {
            settings.api_url = url.to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Apply `key=value` lines from an rc file. Blank lines and `#` comments
    /// are skipped; unknown keys are ignored with a warning.
    pub fn apply_rc(&mut self, content: &str) -> Result<()> {
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=')
                .with_context(|| format!("Line {}: expected key=value, got '{}'", idx + 1, line))?;
            let value = value.trim();
            match key.trim() {
                "api.url" => self.api_url = value.to_string(),
                "api.token" => self.token = (!value.is_empty()).then(|| value.to_string()),
                "api.timeout" => {
                    self.timeout_secs = value.parse()
                        .with_context(|| format!("Line {}: api.timeout must be a number of seconds", idx + 1))?;
                }
                other => log::warn!("Ignoring unknown config key '{}'", other),
            }
        }
        Ok(())
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("Invalid API URL '{}'. It must start with http:// or https://", self.api_url);
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("api.timeout must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
