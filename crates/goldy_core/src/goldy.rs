//! The core: owns the gateway client, database, config and registries

pub mod handler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serenity::all::{
    ApplicationId, ChannelId, Client, GatewayError, GatewayIntents, GuildId, OnlineStatus,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::{
    GoldyError, Result,
    commands::{Command, CommandLoader, CommandRegistry, CommandSink, SlashInput},
    config::GoldyConfig,
    database::Database,
    extensions::{Extension, ExtensionLoader, ExtensionRegistry, ExtensionReloader},
    guilds::Guilds,
    platter::{Author, GoldPlatter, PlatterType, ReplyTarget},
    presence::{Presence, Status, default_activity},
    token::Token,
};

pub use handler::GoldyHandler;

/// Gateway intents Goldy Bot connects with
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// A guild message that may invoke a prefix command
#[derive(Debug, Clone)]
pub struct PrefixMessage {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
}

/// A slash command interaction
#[derive(Debug, Clone)]
pub struct SlashInvocation {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: Author,
    pub input: SlashInput,
}

/// The Goldy Bot core
pub struct Goldy {
    token: Token,
    config: GoldyConfig,
    raise_on_extension_loader_error: Option<bool>,
    guilds: Guilds,
    commands: CommandRegistry,
    extensions: ExtensionRegistry,
    presence: Presence,
    database: RwLock<Option<Database>>,
    application_id: OnceLock<ApplicationId>,
    sink: OnceLock<Arc<dyn CommandSink>>,
    /// Serializes setup and reloads
    lifecycle: Mutex<()>,
    set_up: AtomicBool,
    /// Fatal error that stopped Goldy from inside the gateway, returned by `start`
    failure: parking_lot::Mutex<Option<GoldyError>>,
    shutdown: watch::Sender<Option<String>>,
}

impl Goldy {
    pub fn builder(token: Token, config: GoldyConfig) -> GoldyBuilder {
        GoldyBuilder::new(token, config)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn config(&self) -> &GoldyConfig {
        &self.config
    }

    pub fn guilds(&self) -> &Guilds {
        &self.guilds
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn database(&self) -> Option<Database> {
        self.database.read().clone()
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        self.application_id.get().copied()
    }

    /// Whether guilds, extensions and commands have been set up
    pub fn is_set_up(&self) -> bool {
        self.set_up.load(Ordering::SeqCst)
    }

    /// Awaken Goldy Bot and run until she is stopped
    ///
    /// Connects the database when a database url is configured, then runs the
    /// gateway until [`stop`](Self::stop) is called, Ctrl-C is pressed or the
    /// gateway fails.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        info!("Starting Goldy Bot...");

        if self.database().is_none() {
            match self.token.database_url() {
                Some(url) => {
                    let database = Database::connect(url).await?;
                    *self.database.write() = Some(database);
                }
                None => warn!("No database url configured, running without a database."),
            }
        }

        let mut client = Client::builder(self.token.discord_token(), intents())
            .event_handler(GoldyHandler::new(self.clone()))
            .activity(default_activity().to_activity_data()?)
            .status(OnlineStatus::Online)
            .await
            .map_err(|e| self.gateway_error("building the gateway client", e))?;

        self.presence.attach(client.shard_manager.clone());
        debug!("Shard manager connecting...");

        let mut shutdown = self.shutdown.subscribe();
        let outcome = tokio::select! {
            result = client.start() => {
                result.map(|()| "Gateway connection closed.".to_string())
            }
            reason = wait_for_reason(&mut shutdown) => Ok(reason),
            _ = tokio::signal::ctrl_c() => Ok("Keyboard interrupt detected!".to_string()),
        };

        let failure = match outcome {
            Ok(reason) => {
                self.stop(reason);
                None
            }
            Err(e) => {
                let e = self.gateway_error("connecting to Discord", e);
                self.stop(e.to_string());
                Some(e)
            }
        };

        let reason = self.shutdown_reason().unwrap_or_default();
        self.shutdown_gracefully(&client, &reason).await;

        match failure.or_else(|| self.take_failure()) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Record what Discord told us about the application before setup runs
    pub fn pre_setup(&self, application_id: ApplicationId) {
        if self.application_id.set(application_id).is_ok() {
            debug!("Application id is {}.", application_id);
        }
    }

    /// Set up guilds, load extensions and push every command to Discord through `sink`
    ///
    /// Runs once; later calls (the gateway re-sending READY) are no-ops.
    pub async fn setup(&self, sink: Arc<dyn CommandSink>) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_set_up() {
            debug!("Already set up, skipping.");
            return Ok(());
        }

        let sink = self.sink.get_or_init(|| sink).clone();
        let database = self.database();

        self.guilds.setup(&self.config, database.as_ref()).await?;
        self.extension_loader().load().await?;
        CommandLoader::new(&self.commands, &self.guilds, sink.as_ref())
            .load()
            .await?;

        self.set_up.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Run [`setup`](Self::setup) for a READY event, stopping Goldy Bot if it fails
    ///
    /// The error is kept and handed back by [`start`](Self::start) once shut down.
    pub async fn setup_on_ready(&self, sink: Arc<dyn CommandSink>) -> bool {
        let Err(e) = self.setup(sink).await else {
            return true;
        };

        error!("Setup failed: {:?}", e);
        let reason = format!("Setup failed: {}", e);
        self.failure.lock().get_or_insert(e);
        self.stop(reason);
        false
    }

    /// The fatal error recorded while running, if any
    pub fn take_failure(&self) -> Option<GoldyError> {
        self.failure.lock().take()
    }

    /// Extension loader configured from `goldy.json` and the builder
    pub fn extension_loader(&self) -> ExtensionLoader<'_> {
        let raise = self
            .raise_on_extension_loader_error
            .unwrap_or_else(|| self.config.raise_on_extension_loader_error());

        ExtensionLoader::new(&self.extensions, &self.commands)
            .ignored(self.config.ignored_extensions())
            .raise_on_load_error(raise)
    }

    /// Reload one extension by code name, or all of them
    pub async fn reload_extension(&self, code_name: Option<&str>) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let sink = self
            .sink
            .get()
            .ok_or_else(|| GoldyError::not_ready("reloading extensions"))?;

        ExtensionReloader::new(
            &self.extensions,
            self.extension_loader(),
            CommandLoader::new(&self.commands, &self.guilds, sink.as_ref()),
        )
        .reload(code_name)
        .await
    }

    /// Run the prefix command a guild message invokes, if any
    ///
    /// Returns whether the message targeted a command. A wrong number of
    /// arguments is answered with the command's usage instead of running it.
    pub async fn dispatch_prefix(
        &self,
        message: PrefixMessage,
        reply: Arc<dyn ReplyTarget>,
    ) -> Result<bool> {
        let Some(guild) = message.guild_id.and_then(|id| self.guilds.get_guild(id)) else {
            return Ok(false);
        };
        let Some((command, args)) = self.commands.find_prefix(&message.content, &guild.prefix)
        else {
            return Ok(false);
        };

        if command.any_args_missing(&args) {
            reply
                .send(format!("Usage: `{}`", command.usage(&guild.prefix)))
                .await?;
            return Ok(true);
        }

        let platter = GoldPlatter::new(
            PlatterType::PrefixCmd,
            guild.id,
            message.channel_id,
            message.author,
            message.content,
            command.qualified_name(),
            args,
            reply,
        );
        self.invoke(&command, platter).await?;
        Ok(true)
    }

    /// Run the slash command an interaction invokes, if any
    pub async fn dispatch_slash(
        &self,
        invocation: SlashInvocation,
        reply: Arc<dyn ReplyTarget>,
    ) -> Result<bool> {
        let Some(guild) = invocation.guild_id.and_then(|id| self.guilds.get_guild(id)) else {
            return Ok(false);
        };
        let Some((command, args)) = self.commands.find_slash(&invocation.input) else {
            return Ok(false);
        };

        if command.any_args_missing(&args) {
            reply
                .send(format!("Usage: `{}`", command.usage("/")))
                .await?;
            return Ok(true);
        }

        let platter = GoldPlatter::new(
            PlatterType::SlashCmd,
            guild.id,
            invocation.channel_id,
            invocation.author,
            invocation.input.render(),
            command.qualified_name(),
            args,
            reply,
        );
        self.invoke(&command, platter).await?;
        Ok(true)
    }

    async fn invoke(&self, command: &Command, platter: GoldPlatter) -> Result<()> {
        command
            .invoke(platter)
            .await
            .map_err(|e| GoldyError::command_failed(command.qualified_name(), e))
    }

    /// Ask Goldy Bot to shut down; only the first reason is kept
    ///
    /// Returns whether this call was the one that requested the shutdown.
    pub fn stop(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let requested = self.shutdown.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });

        if requested {
            debug!("Shutdown requested.");
        }
        requested
    }

    pub fn shutdown_reason(&self) -> Option<String> {
        self.shutdown.borrow().clone()
    }

    /// Resolves with the shutdown reason once [`stop`](Self::stop) has been called
    pub async fn wait_for_shutdown(&self) -> String {
        wait_for_reason(&mut self.shutdown.subscribe()).await
    }

    async fn shutdown_gracefully(&self, client: &Client, reason: &str) {
        warn!("Goldy Bot is shutting down...");
        info!("Reason: {}", reason);

        if let Err(e) = self.presence.change(Status::Invisible, None).await {
            warn!("Could not go invisible before shutting down: {}", e);
        }

        debug!("Closing shard manager...");
        client.shard_manager.shutdown_all().await;

        let database = self.database.write().take();
        if let Some(database) = database {
            database.close().await;
        }
    }

    fn gateway_error(&self, action: &str, cause: serenity::Error) -> GoldyError {
        match cause {
            serenity::Error::Gateway(GatewayError::InvalidAuthentication) => {
                error!("Discord refused the token.");
                GoldyError::invalid_token(self.token.discord_token())
            }
            cause => GoldyError::gateway(action, cause),
        }
    }
}

async fn wait_for_reason(shutdown: &mut watch::Receiver<Option<String>>) -> String {
    match shutdown.wait_for(Option::is_some).await {
        Ok(reason) => reason.clone().unwrap_or_default(),
        // The sender lives as long as Goldy, so this only happens while tearing down
        Err(_) => std::future::pending().await,
    }
}

/// Builder for [`Goldy`]
pub struct GoldyBuilder {
    token: Token,
    config: GoldyConfig,
    extensions: Vec<Arc<dyn Extension>>,
    commands: Vec<Command>,
    raise_on_extension_loader_error: Option<bool>,
    database: Option<Database>,
}

impl GoldyBuilder {
    pub fn new(token: Token, config: GoldyConfig) -> Self {
        Self {
            token,
            config,
            extensions: Vec::new(),
            commands: Vec::new(),
            raise_on_extension_loader_error: None,
            database: None,
        }
    }

    pub fn extension(mut self, extension: impl Extension) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// A command that belongs to no extension
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Override `raise_on_load_error` from `goldy.json`
    pub fn raise_on_extension_loader_error(mut self, raise: bool) -> Self {
        self.raise_on_extension_loader_error = Some(raise);
        self
    }

    /// Use an already connected database instead of connecting on start
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn build(self) -> Result<Arc<Goldy>> {
        let extensions = ExtensionRegistry::new();
        for extension in self.extensions {
            extensions.register(extension)?;
        }

        let commands = CommandRegistry::new();
        for command in self.commands {
            commands.add(command)?;
        }

        let (shutdown, _) = watch::channel(None);

        Ok(Arc::new(Goldy {
            token: self.token,
            config: self.config,
            raise_on_extension_loader_error: self.raise_on_extension_loader_error,
            guilds: Guilds::new(),
            commands,
            extensions,
            presence: Presence::new(),
            database: RwLock::new(self.database),
            application_id: OnceLock::new(),
            sink: OnceLock::new(),
            lifecycle: Mutex::new(()),
            set_up: AtomicBool::new(false),
            failure: parking_lot::Mutex::new(None),
            shutdown,
        }))
    }
}
