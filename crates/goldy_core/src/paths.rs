use std::path::{Path, PathBuf};

use crate::config::GoldyConfig;

/// Files and folders that make up a Goldy Bot environment
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub const ENV_FILE: &'static str = ".env";
    pub const DEFAULT_EXTENSIONS_FOLDER: &'static str = "extensions";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Environment rooted at the current working directory
    pub fn current() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn goldy_config(&self) -> PathBuf {
        self.root.join(GoldyConfig::FILE_NAME)
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(Self::ENV_FILE)
    }

    /// Extensions folder, honouring `folder_location` from the config when given
    pub fn extensions_folder(&self, config: Option<&GoldyConfig>) -> PathBuf {
        match config.and_then(GoldyConfig::extension_folder_location) {
            Some(location) => {
                let location = PathBuf::from(location);
                if location.is_absolute() {
                    location
                } else {
                    self.root.join(location)
                }
            }
            None => self.root.join(Self::DEFAULT_EXTENSIONS_FOLDER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    #[test]
    fn test_paths_are_rooted() {
        let paths = Paths::new("/srv/goldy");
        assert_eq!(paths.goldy_config(), PathBuf::from("/srv/goldy/goldy.json"));
        assert_eq!(paths.env_file(), PathBuf::from("/srv/goldy/.env"));
        assert_eq!(
            paths.extensions_folder(None),
            PathBuf::from("/srv/goldy/extensions")
        );
    }

    #[test]
    fn test_extensions_folder_from_config() {
        let config: GoldyConfig = Config::from_value(
            "goldy.json",
            json!({"goldy": {"extensions": {"folder_location": "plugins"}}}),
        )
        .into();

        let paths = Paths::new("/srv/goldy");
        assert_eq!(
            paths.extensions_folder(Some(&config)),
            PathBuf::from("/srv/goldy/plugins")
        );
    }
}
