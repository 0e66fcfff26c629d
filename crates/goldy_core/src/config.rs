//! Configuration for Goldy Bot
//!
//! Goldy reads its settings from `goldy.json` in the working directory. Every
//! lookup is path based: a missing key anywhere along the path yields `None`
//! (or the supplied default) instead of an error.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{GoldyError, Result};

/// Key used by the config template as a placeholder guild entry
pub const GUILD_TEMPLATE_KEY: &str = "{guild_id_here}";

/// A JSON configuration document loaded from disk
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    data: Value,
}

impl Config {
    /// Load a JSON config from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GoldyError::ConfigNotFound {
                    config_path: path.display().to_string(),
                    cause: e,
                }
            } else {
                GoldyError::io(path.display().to_string(), e)
            }
        })?;

        Self::parse(path, &content)
    }

    /// Parse a JSON config that claims to live at `path`
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let data = serde_json::from_str(content).map_err(|e| GoldyError::ConfigParseFailed {
            config_path: path.display().to_string(),
            cause: e,
        })?;

        Ok(Self { path, data })
    }

    pub fn from_value(path: impl Into<PathBuf>, data: Value) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Walk nested objects along `keys`, returning `None` if any key is missing
    pub fn get(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .try_fold(&self.data, |value, key| value.as_object()?.get(*key))
    }

    /// Like [`Config::get`] but deserializes the value, treating a type mismatch as missing
    pub fn get_as<T: DeserializeOwned>(&self, keys: &[&str]) -> Option<T> {
        self.get(keys)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn get_or<T: DeserializeOwned>(&self, keys: &[&str], default_value: T) -> T {
        self.get_as(keys).unwrap_or(default_value)
    }

    /// Write the config back to its path as pretty JSON
    pub async fn save(&self) -> Result<()> {
        save_json(&self.data, &self.path).await
    }
}

/// Goldy's own configuration file, `goldy.json`
///
/// All lookups return `None` (or their documented default) when not found in the config.
#[derive(Debug, Clone)]
pub struct GoldyConfig {
    inner: Config,
}

impl GoldyConfig {
    pub const FILE_NAME: &'static str = "goldy.json";

    /// Load `goldy.json` from the current working directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(".").join(Self::FILE_NAME))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Config::load(path).map(Self::from)
    }

    /// The document `goldybot setup` writes for a fresh environment
    pub fn template() -> Value {
        json!({
            "goldy": {
                "extensions": {
                    "folder_location": "./extensions",
                    "ignored_extensions": [],
                    "raise_on_load_error": true
                },
                "allowed_guilds": {
                    "{guild_id_here}": "{guild_code_name_here}"
                }
            }
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner
    }

    /// Code names of all ignored extensions
    pub fn ignored_extensions(&self) -> Vec<String> {
        self.inner
            .get_or(&["goldy", "extensions", "ignored_extensions"], Vec::new())
    }

    /// Location set for the extension folder
    pub fn extension_folder_location(&self) -> Option<String> {
        self.inner
            .get_as(&["goldy", "extensions", "folder_location"])
    }

    /// Whether a failing extension should stop the whole framework
    pub fn raise_on_extension_loader_error(&self) -> bool {
        self.inner
            .get_or(&["goldy", "extensions", "raise_on_load_error"], true)
    }

    /// `(guild id, guild code name)` pairs of the guilds allowed to operate in Goldy Bot
    pub fn allowed_guilds(&self) -> Result<Vec<(String, String)>> {
        let data = self
            .inner
            .get(&["goldy", "allowed_guilds"])
            .and_then(Value::as_object)
            .ok_or_else(|| GoldyError::ConfigFieldMissing {
                config_path: self.inner.path().display().to_string(),
                field: "allowed_guilds".to_string(),
            })?;

        Ok(data
            .iter()
            .filter(|(key, _)| key.as_str() != GUILD_TEMPLATE_KEY)
            .map(|(key, value)| (key.clone(), code_name_of(value)))
            .collect())
    }
}

impl From<Config> for GoldyConfig {
    fn from(inner: Config) -> Self {
        Self { inner }
    }
}

fn code_name_of(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories
pub async fn save_json(value: &Value, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GoldyError::io(parent.display().to_string(), e))?;
        }
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| GoldyError::ConfigParseFailed {
        config_path: path.display().to_string(),
        cause: e,
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| GoldyError::io(path.display().to_string(), e))
}
