use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::all::{CommandId, GuildId};

use crate::{
    GoldyError, Result,
    commands::{CommandSink, SlashCommandSpec},
    platter::ReplyTarget,
};

/// Command sink that records what would have been sent to Discord
#[derive(Default)]
pub struct RecordingSink {
    next_id: AtomicU64,
    fail_after: Option<usize>,
    created: Mutex<Vec<(GuildId, CommandId)>>,
    deleted: Mutex<Vec<(GuildId, CommandId)>>,
    specs: Mutex<Vec<SlashCommandSpec>>,
}

impl RecordingSink {
    /// Accept `successes` creations, then fail every one after
    pub fn failing_after(successes: usize) -> Self {
        Self {
            fail_after: Some(successes),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<(GuildId, CommandId)> {
        self.created.lock().clone()
    }

    pub fn deleted(&self) -> Vec<(GuildId, CommandId)> {
        self.deleted.lock().clone()
    }

    pub fn spec_names(&self) -> Vec<String> {
        self.specs.lock().iter().map(|spec| spec.name.clone()).collect()
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn create_guild_command(
        &self,
        guild_id: GuildId,
        spec: &SlashCommandSpec,
    ) -> Result<CommandId> {
        let mut created = self.created.lock();
        if self.fail_after.is_some_and(|limit| created.len() >= limit) {
            return Err(GoldyError::Other(format!(
                "refusing to create '{}' in {}",
                spec.name, guild_id
            )));
        }

        let id = CommandId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        created.push((guild_id, id));
        self.specs.lock().push(spec.clone());
        Ok(id)
    }

    async fn delete_guild_command(&self, guild_id: GuildId, command_id: CommandId) -> Result<()> {
        self.deleted.lock().push((guild_id, command_id));
        Ok(())
    }
}

/// Reply target that keeps every reply
#[derive(Default)]
pub struct CaptureReply(Mutex<Vec<String>>);

impl CaptureReply {
    pub fn replies(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

#[async_trait]
impl ReplyTarget for CaptureReply {
    async fn send(&self, content: String) -> Result<()> {
        self.0.lock().push(content);
        Ok(())
    }
}
