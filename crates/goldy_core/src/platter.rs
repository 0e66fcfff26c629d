//! The gold platter: what a command handler receives when it is invoked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serenity::all::{
    ChannelId, CommandInteraction, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, GuildId, Http, UserId,
};

use crate::{
    GoldyError, Result,
    utils::{MESSAGE_LIMIT, chunk_message},
};

/// How a command was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatterType {
    SlashCmd,
    PrefixCmd,
}

impl PlatterType {
    pub fn value(self) -> u8 {
        match self {
            Self::SlashCmd => 0,
            Self::PrefixCmd => 1,
        }
    }
}

impl std::fmt::Display for PlatterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlashCmd => write!(f, "slash"),
            Self::PrefixCmd => write!(f, "prefix"),
        }
    }
}

/// Where replies to an invocation go
#[async_trait]
pub trait ReplyTarget: Send + Sync {
    async fn send(&self, content: String) -> Result<()>;
}

/// Replies to a prefix command by posting in its channel
pub struct ChannelReply {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelReply {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ReplyTarget for ChannelReply {
    async fn send(&self, content: String) -> Result<()> {
        for chunk in chunk_message(&content, MESSAGE_LIMIT) {
            self.channel_id.say(&self.http, chunk).await.map_err(|e| {
                GoldyError::gateway(format!("sending to channel {}", self.channel_id), e)
            })?;
        }
        Ok(())
    }
}

/// Replies to a slash command; the first reply answers the interaction, later ones follow up
pub struct InteractionReply {
    http: Arc<Http>,
    interaction: CommandInteraction,
    responded: AtomicBool,
}

impl InteractionReply {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ReplyTarget for InteractionReply {
    async fn send(&self, content: String) -> Result<()> {
        if !self.responded.swap(true, Ordering::SeqCst) {
            self.interaction
                .create_response(
                    &self.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new().content(content),
                    ),
                )
                .await
                .map_err(|e| GoldyError::gateway("responding to an interaction", e))?;
        } else {
            self.interaction
                .create_followup(
                    &self.http,
                    CreateInteractionResponseFollowup::new().content(content),
                )
                .await
                .map_err(|e| GoldyError::gateway("sending an interaction follow-up", e))?;
        }
        Ok(())
    }
}

/// Author of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
}

/// Context object handed to command handlers
#[derive(Clone)]
pub struct GoldPlatter {
    kind: PlatterType,
    guild_id: GuildId,
    channel_id: ChannelId,
    author: Author,
    content: String,
    command: String,
    args: Vec<String>,
    reply: Arc<dyn ReplyTarget>,
}

impl GoldPlatter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: PlatterType,
        guild_id: GuildId,
        channel_id: ChannelId,
        author: Author,
        content: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        reply: Arc<dyn ReplyTarget>,
    ) -> Self {
        Self {
            kind,
            guild_id,
            channel_id,
            author,
            content: content.into(),
            command: command.into(),
            args,
            reply,
        }
    }

    pub fn kind(&self) -> PlatterType {
        self.kind
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Raw message content (for slash commands, a rendering of the invocation)
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Name of the command being invoked
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Reply through whatever channel the command came from
    pub async fn send_message(&self, content: impl Into<String>) -> Result<()> {
        self.reply.send(content.into()).await
    }
}

impl std::fmt::Debug for GoldPlatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoldPlatter")
            .field("kind", &self.kind)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("author", &self.author)
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}
