use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Extension, ExtensionRegistry};
use crate::{GoldyError, Result, commands::CommandRegistry};

/// Registers the commands of every extension that is not ignored
pub struct ExtensionLoader<'a> {
    extensions: &'a ExtensionRegistry,
    commands: &'a CommandRegistry,
    ignored: Vec<String>,
    raise_on_load_error: bool,
}

impl<'a> ExtensionLoader<'a> {
    pub fn new(extensions: &'a ExtensionRegistry, commands: &'a CommandRegistry) -> Self {
        Self {
            extensions,
            commands,
            ignored: Vec::new(),
            raise_on_load_error: true,
        }
    }

    /// Code names of extensions to skip
    pub fn ignored(mut self, ignored: Vec<String>) -> Self {
        self.ignored = ignored;
        self
    }

    /// Whether a failing extension aborts loading or is skipped with a warning
    pub fn raise_on_load_error(mut self, raise: bool) -> Self {
        self.raise_on_load_error = raise;
        self
    }

    /// Whether a failing extension aborts loading
    pub fn raises(&self) -> bool {
        self.raise_on_load_error
    }

    pub fn is_ignored(&self, code_name: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == code_name)
    }

    /// Load every registered extension that is neither ignored nor loaded yet
    pub async fn load(&self) -> Result<usize> {
        let mut count = 0;

        for extension in self.extensions.list() {
            let code_name = extension.code_name();

            if self.is_ignored(code_name) {
                info!(extension = %code_name, "Ignoring extension '{}'.", code_name);
                continue;
            }
            if self.extensions.is_loaded(code_name) {
                continue;
            }

            match self.load_extension(&extension).await {
                Ok(()) => count += 1,
                Err(e) if self.raise_on_load_error => return Err(e),
                Err(e) => {
                    warn!(extension = %code_name, "Skipping extension that failed to load: {}", e);
                }
            }
        }

        info!("Loaded {} extension(s).", count);
        Ok(count)
    }

    /// Run the extension's load hook and add its commands to the registry
    ///
    /// Either every command of the extension is registered or none are.
    pub async fn load_extension(&self, extension: &Arc<dyn Extension>) -> Result<()> {
        let code_name = extension.code_name().to_string();
        debug!(extension = %code_name, "Loading extension '{}'...", code_name);

        let failed = |cause: GoldyError| GoldyError::ExtensionLoadFailed {
            code_name: code_name.clone(),
            cause: Box::new(cause),
        };

        extension.on_load().await.map_err(failed)?;

        let mut added = Vec::new();
        for mut command in extension.clone().commands() {
            command.set_extension(&code_name);

            match self.commands.add(command) {
                Ok(command) => added.push(command.qualified_name()),
                Err(e) => {
                    for name in &added {
                        self.commands.remove(name);
                    }
                    return Err(failed(e));
                }
            }
        }

        self.extensions.set_loaded(&code_name, true);
        info!(
            extension = %code_name,
            "Extension '{}' loaded with {} command(s).",
            code_name,
            added.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    struct Fixed {
        code_name: &'static str,
        names: Vec<&'static str>,
    }

    impl Fixed {
        fn new(code_name: &'static str, names: &[&'static str]) -> Arc<dyn Extension> {
            Arc::new(Self {
                code_name,
                names: names.to_vec(),
            })
        }
    }

    #[async_trait]
    impl Extension for Fixed {
        fn code_name(&self) -> &str {
            self.code_name
        }

        fn commands(self: Arc<Self>) -> Vec<Command> {
            self.names
                .iter()
                .map(|name| Command::builder(*name).build(|_| async { Ok(()) }))
                .collect()
        }
    }

    fn registries(extensions: Vec<Arc<dyn Extension>>) -> (ExtensionRegistry, CommandRegistry) {
        let registry = ExtensionRegistry::new();
        for extension in extensions {
            registry.register(extension).unwrap();
        }
        (registry, CommandRegistry::new())
    }

    #[tokio::test]
    async fn test_commands_are_tagged_with_their_extension() {
        let (extensions, commands) = registries(vec![Fixed::new("fun", &["joke", "meme"])]);

        let loaded = ExtensionLoader::new(&extensions, &commands)
            .load()
            .await
            .unwrap();

        assert_eq!(loaded, 1);
        assert!(extensions.is_loaded("fun"));
        assert_eq!(commands.by_extension("fun").len(), 2);
        assert_eq!(commands.get("joke").unwrap().extension(), Some("fun"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_ignored_extensions_are_skipped() {
        let (extensions, commands) = registries(vec![
            Fixed::new("fun", &["joke"]),
            Fixed::new("admin", &["ban"]),
        ]);

        ExtensionLoader::new(&extensions, &commands)
            .ignored(vec!["admin".to_string()])
            .load()
            .await
            .unwrap();

        assert!(commands.get("joke").is_some());
        assert!(commands.get("ban").is_none());
        assert!(!extensions.is_loaded("admin"));
        assert!(logs_contain("Ignoring extension 'admin'."));
    }

    #[tokio::test]
    async fn test_load_error_raises_by_default() {
        let (extensions, commands) = registries(vec![
            Fixed::new("fun", &["ping"]),
            Fixed::new("clash", &["extra", "ping"]),
        ]);

        let err = ExtensionLoader::new(&extensions, &commands)
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, GoldyError::ExtensionLoadFailed { ref code_name, .. } if code_name == "clash"));
        // The clashing extension left nothing behind
        assert!(commands.get("extra").is_none());
        assert!(!extensions.is_loaded("clash"));
    }

    #[tokio::test]
    async fn test_load_error_skipped_when_not_raising() {
        let (extensions, commands) = registries(vec![
            Fixed::new("fun", &["ping"]),
            Fixed::new("clash", &["extra", "ping"]),
            Fixed::new("admin", &["ban"]),
        ]);

        let loaded = ExtensionLoader::new(&extensions, &commands)
            .raise_on_load_error(false)
            .load()
            .await
            .unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(commands.names(), vec!["ban".to_string(), "ping".to_string()]);
    }
}
