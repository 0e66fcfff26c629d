//! Extensions: named groups of commands that can be loaded, ignored and reloaded

pub mod loader;
pub mod reloader;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::{GoldyError, Result, commands::Command, utils::cache_lookup};

pub use loader::ExtensionLoader;
pub use reloader::ExtensionReloader;

/// A group of commands registered with Goldy under one code name
///
/// `commands` is called every time the extension is loaded, so a reload gets
/// freshly built commands. Handlers usually capture a clone of the `Arc` to
/// reach the extension's own state.
#[async_trait]
pub trait Extension: Send + Sync + 'static {
    /// Short unique identifier, matched against `ignored_extensions`
    fn code_name(&self) -> &str;

    fn commands(self: Arc<Self>) -> Vec<Command>;

    async fn on_load(&self) -> Result<()> {
        Ok(())
    }

    async fn on_unload(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
struct ExtensionEntry {
    extension: Arc<dyn Extension>,
    loaded: bool,
}

/// Every extension known to Goldy, in registration order
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: RwLock<Vec<(String, ExtensionEntry)>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, extension: Arc<dyn Extension>) -> Result<()> {
        let code_name = extension.code_name().to_string();
        let mut extensions = self.extensions.write();

        if cache_lookup(&code_name, extensions.as_slice()).is_some() {
            return Err(GoldyError::DuplicateExtension { code_name });
        }

        debug!(extension = %code_name, "Extension registered.");
        extensions.push((
            code_name,
            ExtensionEntry {
                extension,
                loaded: false,
            },
        ));
        Ok(())
    }

    pub fn get(&self, code_name: &str) -> Option<Arc<dyn Extension>> {
        cache_lookup(code_name, self.extensions.read().as_slice()).map(|entry| entry.extension.clone())
    }

    /// Like [`get`](Self::get), but unknown names become an error listing what exists
    pub fn require(&self, code_name: &str) -> Result<Arc<dyn Extension>> {
        self.get(code_name)
            .ok_or_else(|| GoldyError::ExtensionNotFound {
                code_name: code_name.to_string(),
                available: self.names(),
            })
    }

    pub fn list(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions
            .read()
            .iter()
            .map(|(_, entry)| entry.extension.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.extensions
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_loaded(&self, code_name: &str) -> bool {
        cache_lookup(code_name, self.extensions.read().as_slice()).is_some_and(|entry| entry.loaded)
    }

    pub fn loaded(&self) -> Vec<String> {
        self.extensions
            .read()
            .iter()
            .filter(|(_, entry)| entry.loaded)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.read().is_empty()
    }

    pub(crate) fn set_loaded(&self, code_name: &str, loaded: bool) {
        if let Some((_, entry)) = self
            .extensions
            .write()
            .iter_mut()
            .find(|(name, _)| name == code_name)
        {
            entry.loaded = loaded;
        }
    }
}
