//! Commands: the unit of functionality Goldy exposes to guilds
//!
//! A [`Command`] can be reached both as a guild slash command (`/name`) and as
//! a prefix command (`!name`). Commands are collected in the
//! [`CommandRegistry`] and pushed to Discord by the [`CommandLoader`].

pub mod loader;
pub mod registry;

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serenity::all::{CommandId, GuildId};
use tracing::info;

use crate::{
    Result,
    platter::{GoldPlatter, PlatterType},
};

pub use loader::{CommandLoader, CommandSink, HttpSink, SlashCommandSpec, SlashOption};
pub use registry::{CommandRegistry, SlashInput};

pub type CommandFuture = BoxFuture<'static, Result<()>>;
pub type CommandHandler = Arc<dyn Fn(GoldPlatter) -> CommandFuture + Send + Sync>;

pub const DEFAULT_DESCRIPTION: &str = "This command has no description. Sorry about that.";

/// A Goldy Bot command
pub struct Command {
    name: String,
    description: String,
    params: Vec<String>,
    required_roles: Vec<String>,
    allow_prefix_cmd: bool,
    allow_slash_cmd: bool,
    parent: Option<String>,
    extension: Option<String>,
    handler: CommandHandler,
    state: Mutex<CommandState>,
}

#[derive(Debug, Default)]
struct CommandState {
    loaded: bool,
    slash_commands: Vec<(GuildId, CommandId)>,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// The command's code name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name including the parent, e.g. `"role add"` for a subcommand
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{} {}", parent, self.name),
            None => self.name.clone(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Names of the arguments this command takes, in order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Code names of the roles needed to access this command
    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn allow_prefix_cmd(&self) -> bool {
        self.allow_prefix_cmd
    }

    pub fn allow_slash_cmd(&self) -> bool {
        self.allow_slash_cmd
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether this is a subcommand of another command
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// Code name of the extension this command belongs to
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn in_extension(&self) -> bool {
        self.extension.is_some()
    }

    pub fn loaded(&self) -> bool {
        self.state.lock().loaded
    }

    /// Slash commands created for this command, per guild
    pub fn slash_commands(&self) -> Vec<(GuildId, CommandId)> {
        self.state.lock().slash_commands.clone()
    }

    /// Whether the number of given args differs from what the command takes
    pub fn any_args_missing(&self, args: &[String]) -> bool {
        args.len() != self.params.len()
    }

    /// How to call this command as a prefix command, e.g. `!role add <user> <role>`
    pub fn usage(&self, prefix: &str) -> String {
        let mut usage = format!("{}{}", prefix, self.qualified_name());
        for param in &self.params {
            usage.push_str(&format!(" <{}>", param));
        }
        usage
    }

    /// Run the command's handler
    pub async fn invoke(&self, platter: GoldPlatter) -> Result<()> {
        match platter.kind() {
            PlatterType::PrefixCmd => info!(
                command = %self.qualified_name(),
                "Prefix command invoked by '{}'.",
                platter.author().name
            ),
            PlatterType::SlashCmd => info!(
                command = %self.qualified_name(),
                "Slash command invoked by '{}'.",
                platter.author().name
            ),
        }

        (self.handler)(platter).await
    }

    pub(crate) fn set_extension(&mut self, extension: &str) {
        self.extension = Some(extension.to_string());
    }

    pub(crate) fn mark_loaded(&self, slash_commands: Vec<(GuildId, CommandId)>) {
        let mut state = self.state.lock();
        state.loaded = true;
        state.slash_commands = slash_commands;
    }

    /// Mark unloaded and hand back the slash commands that must be deleted
    pub(crate) fn mark_unloaded(&self) -> Vec<(GuildId, CommandId)> {
        let mut state = self.state.lock();
        state.loaded = false;
        std::mem::take(&mut state.slash_commands)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("extension", &self.extension)
            .field("params", &self.params)
            .field("allow_prefix_cmd", &self.allow_prefix_cmd)
            .field("allow_slash_cmd", &self.allow_slash_cmd)
            .field("loaded", &self.loaded())
            .finish()
    }
}

/// Builder for [`Command`]
pub struct CommandBuilder {
    name: String,
    description: Option<String>,
    params: Vec<String>,
    required_roles: Vec<String>,
    allow_prefix_cmd: bool,
    allow_slash_cmd: bool,
    parent: Option<String>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
            required_roles: Vec::new(),
            allow_prefix_cmd: true,
            allow_slash_cmd: true,
            parent: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    pub fn required_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_prefix(mut self, allow: bool) -> Self {
        self.allow_prefix_cmd = allow;
        self
    }

    pub fn allow_slash(mut self, allow: bool) -> Self {
        self.allow_slash_cmd = allow;
        self
    }

    /// Make this a subcommand of `parent`
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Finish the command with the handler that runs when it is invoked
    pub fn build<F, Fut>(self, handler: F) -> Command
    where
        F: Fn(GoldPlatter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: CommandHandler = Arc::new(move |platter| Box::pin(handler(platter)));

        Command {
            name: self.name,
            description: self
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            params: self.params,
            required_roles: self.required_roles,
            allow_prefix_cmd: self.allow_prefix_cmd,
            allow_slash_cmd: self.allow_slash_cmd,
            parent: self.parent,
            extension: None,
            handler,
            state: Mutex::new(CommandState::default()),
        }
    }
}
