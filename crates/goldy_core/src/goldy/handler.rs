use std::sync::Arc;

use serenity::all::{Context, EventHandler, Interaction, Message, Ready};
use serenity::async_trait;
use tracing::{debug, error, info};

use super::{Goldy, PrefixMessage, SlashInvocation};
use crate::{
    commands::{CommandSink, HttpSink, SlashInput},
    platter::{Author, ChannelReply, InteractionReply},
};

/// Routes gateway events into the core
pub struct GoldyHandler {
    goldy: Arc<Goldy>,
}

impl GoldyHandler {
    pub fn new(goldy: Arc<Goldy>) -> Self {
        Self { goldy }
    }
}

#[async_trait]
impl EventHandler for GoldyHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}.", ready.user.name);

        self.goldy.pre_setup(ready.application.id);

        let sink: Arc<dyn CommandSink> = Arc::new(HttpSink::new(ctx.http.clone()));
        if self.goldy.setup_on_ready(sink).await {
            info!("Shards are connected and READY!");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let message = PrefixMessage {
            guild_id: msg.guild_id,
            channel_id: msg.channel_id,
            author: Author {
                id: msg.author.id,
                name: msg.author.name.clone(),
            },
            content: msg.content.clone(),
        };
        let reply = Arc::new(ChannelReply::new(ctx.http.clone(), msg.channel_id));

        if let Err(e) = self.goldy.dispatch_prefix(message, reply).await {
            error!(channel = %msg.channel_id, "Prefix command failed: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let invocation = SlashInvocation {
            guild_id: command.guild_id,
            channel_id: command.channel_id,
            author: Author {
                id: command.user.id,
                name: command.user.name.clone(),
            },
            input: SlashInput::from_interaction(&command.data),
        };
        debug!("Interaction for '{}'.", invocation.input.render());

        let reply = Arc::new(InteractionReply::new(ctx.http.clone(), command));
        if let Err(e) = self.goldy.dispatch_slash(invocation, reply).await {
            error!("Slash command failed: {:?}", e);
        }
    }
}
