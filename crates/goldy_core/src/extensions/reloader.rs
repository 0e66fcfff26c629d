use std::sync::Arc;

use tracing::{info, warn};

use super::{Extension, ExtensionLoader, ExtensionRegistry};
use crate::{Result, commands::CommandLoader};

/// Takes extensions down and brings them back with freshly built commands
pub struct ExtensionReloader<'a> {
    extensions: &'a ExtensionRegistry,
    loader: ExtensionLoader<'a>,
    command_loader: CommandLoader<'a>,
}

impl<'a> ExtensionReloader<'a> {
    pub fn new(
        extensions: &'a ExtensionRegistry,
        loader: ExtensionLoader<'a>,
        command_loader: CommandLoader<'a>,
    ) -> Self {
        Self {
            extensions,
            loader,
            command_loader,
        }
    }

    /// Reload one extension by code name, or all of them
    pub async fn reload(&self, code_name: Option<&str>) -> Result<()> {
        let targets = match code_name {
            Some(code_name) => vec![self.extensions.require(code_name)?],
            None => self.extensions.list(),
        };

        let mut failure = None;
        for extension in &targets {
            let name = extension.code_name();
            self.unload_extension(extension).await?;

            if self.loader.is_ignored(name) {
                info!(extension = %name, "Not reloading ignored extension.");
                continue;
            }

            if let Err(e) = self.loader.load_extension(extension).await {
                if self.loader.raises() {
                    failure = Some(e);
                    break;
                }
                warn!(extension = %name, "Skipping extension that failed to reload: {}", e);
            }
        }

        // Load what did come back before reporting a failure
        let loaded = self.command_loader.load().await;
        if let Some(e) = failure {
            return Err(e);
        }
        loaded?;

        match code_name {
            Some(code_name) => info!(extension = %code_name, "Reloaded extension '{}'.", code_name),
            None => info!("Reloaded {} extension(s).", targets.len()),
        }
        Ok(())
    }

    /// Delete the extension's commands and run its unload hook
    pub async fn unload_extension(&self, extension: &Arc<dyn Extension>) -> Result<()> {
        let code_name = extension.code_name();

        for command in self.command_loader.registry().by_extension(code_name) {
            // A failed Discord delete still drops the command locally
            if let Err(e) = self.command_loader.delete(&command.qualified_name()).await {
                warn!(extension = %code_name, "Failed to delete command cleanly: {}", e);
            }
        }

        if self.extensions.is_loaded(code_name) {
            extension.on_unload().await?;
            self.extensions.set_loaded(code_name, false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        GoldyError,
        commands::{Command, CommandRegistry},
        guilds::Guilds,
        test_support::RecordingSink,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gains one more command every time it is loaded
    #[derive(Default)]
    struct Growing {
        loads: AtomicUsize,
        unloads: AtomicUsize,
    }

    #[async_trait]
    impl Extension for Growing {
        fn code_name(&self) -> &str {
            "growing"
        }

        fn commands(self: Arc<Self>) -> Vec<Command> {
            let generation = self.loads.load(Ordering::SeqCst);
            (0..generation)
                .map(|n| Command::builder(format!("cmd{}", n)).build(|_| async { Ok(()) }))
                .collect()
        }

        async fn on_load(&self) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_unload(&self) -> Result<()> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Single(&'static str);

    #[async_trait]
    impl Extension for Single {
        fn code_name(&self) -> &str {
            self.0
        }

        fn commands(self: Arc<Self>) -> Vec<Command> {
            vec![Command::builder(self.0).build(|_| async { Ok(()) })]
        }
    }

    /// Loads once, then refuses every later load
    #[derive(Default)]
    struct Flaky {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl Extension for Flaky {
        fn code_name(&self) -> &str {
            "flaky"
        }

        fn commands(self: Arc<Self>) -> Vec<Command> {
            vec![Command::builder("flaky").build(|_| async { Ok(()) })]
        }

        async fn on_load(&self) -> Result<()> {
            if self.loads.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(GoldyError::Other("flaky broke".to_string()));
            }
            Ok(())
        }
    }

    fn guilds() -> Guilds {
        Guilds::from_allowed(&[("863416692083916820".to_string(), "goldy_dev".to_string())])
            .unwrap()
    }

    #[tokio::test]
    async fn test_reload_rebuilds_commands() {
        let extensions = ExtensionRegistry::new();
        let commands = CommandRegistry::new();
        let guilds = guilds();
        let sink = RecordingSink::default();
        let growing = Arc::new(Growing::default());
        extensions.register(growing.clone()).unwrap();

        ExtensionLoader::new(&extensions, &commands).load().await.unwrap();
        CommandLoader::new(&commands, &guilds, &sink).load().await.unwrap();
        assert_eq!(commands.names(), vec!["cmd0".to_string()]);
        let first = commands.get("cmd0").unwrap().slash_commands();

        let reloader = ExtensionReloader::new(
            &extensions,
            ExtensionLoader::new(&extensions, &commands),
            CommandLoader::new(&commands, &guilds, &sink),
        );
        reloader.reload(Some("growing")).await.unwrap();

        assert_eq!(commands.names(), vec!["cmd0".to_string(), "cmd1".to_string()]);
        assert!(commands.list().iter().all(|command| command.loaded()));
        assert_eq!(sink.deleted(), first);
        assert_eq!(growing.unloads.load(Ordering::SeqCst), 1);
        assert!(extensions.is_loaded("growing"));
    }

    #[tokio::test]
    async fn test_reload_unknown_extension() {
        let extensions = ExtensionRegistry::new();
        let commands = CommandRegistry::new();
        let guilds = guilds();
        let sink = RecordingSink::default();

        let err = ExtensionReloader::new(
            &extensions,
            ExtensionLoader::new(&extensions, &commands),
            CommandLoader::new(&commands, &guilds, &sink),
        )
        .reload(Some("nope"))
        .await
        .unwrap_err();

        assert!(matches!(err, GoldyError::ExtensionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_reload_all_keeps_core_commands() {
        let extensions = ExtensionRegistry::new();
        let commands = CommandRegistry::new();
        let guilds = guilds();
        let sink = RecordingSink::default();
        extensions.register(Arc::new(Growing::default())).unwrap();
        commands
            .add(Command::builder("core").build(|_| async { Ok(()) }))
            .unwrap();

        let reloader = ExtensionReloader::new(
            &extensions,
            ExtensionLoader::new(&extensions, &commands),
            CommandLoader::new(&commands, &guilds, &sink),
        );
        reloader.reload(None).await.unwrap();
        reloader.reload(None).await.unwrap();

        assert_eq!(commands.names(), vec!["cmd0".to_string(), "cmd1".to_string(), "core".to_string()]);
        assert!(commands.get("core").unwrap().loaded());
    }

    async fn loaded_with_flaky(
        extensions: &ExtensionRegistry,
        commands: &CommandRegistry,
        guilds: &Guilds,
        sink: &RecordingSink,
    ) {
        extensions.register(Arc::new(Single("ping"))).unwrap();
        extensions.register(Arc::new(Flaky::default())).unwrap();
        ExtensionLoader::new(extensions, commands)
            .raise_on_load_error(false)
            .load()
            .await
            .unwrap();
        CommandLoader::new(commands, guilds, sink).load().await.unwrap();
        assert!(commands.get("flaky").unwrap().loaded());
    }

    #[tokio::test]
    async fn test_reload_skips_failing_extension_when_not_raising() {
        let extensions = ExtensionRegistry::new();
        let commands = CommandRegistry::new();
        let guilds = guilds();
        let sink = RecordingSink::default();
        loaded_with_flaky(&extensions, &commands, &guilds, &sink).await;

        ExtensionReloader::new(
            &extensions,
            ExtensionLoader::new(&extensions, &commands).raise_on_load_error(false),
            CommandLoader::new(&commands, &guilds, &sink),
        )
        .reload(None)
        .await
        .unwrap();

        let ping = commands.get("ping").unwrap();
        assert!(ping.loaded());
        assert_eq!(ping.slash_commands().len(), 1);
        assert!(commands.find_prefix("!ping", "!").is_some());
        assert!(commands.get("flaky").is_none());
        assert!(!extensions.is_loaded("flaky"));
    }

    #[tokio::test]
    async fn test_reload_error_still_loads_rebuilt_commands() {
        let extensions = ExtensionRegistry::new();
        let commands = CommandRegistry::new();
        let guilds = guilds();
        let sink = RecordingSink::default();
        loaded_with_flaky(&extensions, &commands, &guilds, &sink).await;

        let err = ExtensionReloader::new(
            &extensions,
            ExtensionLoader::new(&extensions, &commands),
            CommandLoader::new(&commands, &guilds, &sink),
        )
        .reload(None)
        .await
        .unwrap_err();

        assert!(matches!(err, GoldyError::ExtensionLoadFailed { ref code_name, .. } if code_name == "flaky"));
        assert!(commands.get("ping").unwrap().loaded());
        assert!(commands.find_prefix("!ping", "!").is_some());
    }
}
