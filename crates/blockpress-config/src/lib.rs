use blockpress_engine::{EditorSettings, ScriptSettings};
use blockpress_engine::controllers::image::ImageLimits;
use blockpress_engine::save::SaveConfig;
use blockpress_engine::upload::{DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES, UploadPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let policy = UploadPolicy::default();
        Self {
            max_bytes: policy.max_bytes,
            allowed_mime_types: policy.allowed_mime_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub initial_max_width: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let limits = ImageLimits::default();
        Self {
            initial_max_width: limits.initial_max_width,
            min_width: limits.min_width,
            max_width: limits.max_width,
        }
    }
}

/// Limits for JavaScript run by embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub enabled: bool,
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        let settings = ScriptSettings::default();
        Self {
            enabled: settings.enabled,
            loop_iteration_limit: settings.loop_iteration_limit,
            recursion_limit: settings.recursion_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the stored `.html` post fragments
    pub content_path: PathBuf,
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
    #[serde(default = "default_save_timeout_ms")]
    pub save_timeout_ms: u64,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub scripts: ScriptConfig,
}

fn default_autosave_debounce_ms() -> u64 {
    5_000
}

fn default_save_timeout_ms() -> u64 {
    15_000
}

impl Config {
    pub fn new(content_path: impl Into<PathBuf>) -> Self {
        Self {
            content_path: content_path.into(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            save_timeout_ms: default_save_timeout_ms(),
            upload: UploadConfig::default(),
            image: ImageConfig::default(),
            scripts: ScriptConfig::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the content path
        config.content_path =
            Self::expand_path(&config.content_path).unwrap_or(config.content_path);
        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpress");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "save_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        let image = &self.image;
        if !(image.min_width > 0.0 && image.min_width <= image.max_width) {
            return Err(ConfigError::InvalidValue {
                field: "image.min_width",
                reason: format!(
                    "must be positive and at most image.max_width ({})",
                    image.max_width
                ),
            });
        }
        if self.scripts.loop_iteration_limit == 0 || self.scripts.recursion_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scripts",
                reason: "loop and recursion limits must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn save_config(&self) -> SaveConfig {
        SaveConfig {
            autosave_debounce: Duration::from_millis(self.autosave_debounce_ms),
            save_timeout: Duration::from_millis(self.save_timeout_ms),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.upload.max_bytes,
            allowed_mime_types: self.upload.allowed_mime_types.clone(),
        }
    }

    pub fn image_limits(&self) -> ImageLimits {
        ImageLimits {
            initial_max_width: self.image.initial_max_width,
            min_width: self.image.min_width,
            max_width: self.image.max_width,
        }
    }

    pub fn script_settings(&self) -> ScriptSettings {
        ScriptSettings {
            enabled: self.scripts.enabled,
            loop_iteration_limit: self.scripts.loop_iteration_limit,
            recursion_limit: self.scripts.recursion_limit,
        }
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            save: self.save_config(),
            upload: self.upload_policy(),
            image: self.image_limits(),
            scripts: self.script_settings(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
