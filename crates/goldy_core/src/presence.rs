use std::sync::{Arc, OnceLock};

use serenity::all::{ActivityData, OnlineStatus, ShardManager};
use tracing::debug;

use crate::{GoldyError, Result, info::DISPLAY_NAME};

/// Online status shown for the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
}

impl Status {
    /// Discord's wire name for the status
    pub fn value(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

impl From<Status> for OnlineStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Online => OnlineStatus::Online,
            Status::Idle => OnlineStatus::Idle,
            Status::DoNotDisturb => OnlineStatus::DoNotDisturb,
            Status::Invisible => OnlineStatus::Invisible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    PlayingGame,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
}

impl ActivityType {
    /// Discord's integer for the activity type
    pub fn value(self) -> u8 {
        match self {
            Self::PlayingGame => 0,
            Self::Streaming => 1,
            Self::Listening => 2,
            Self::Watching => 3,
            Self::Custom => 4,
            Self::Competing => 5,
        }
    }
}

/// What the bot is shown to be doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub kind: ActivityType,
    /// Stream url, only used by [`ActivityType::Streaming`]
    pub url: Option<String>,
}

impl Activity {
    pub fn new(kind: ActivityType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: None,
        }
    }

    pub fn playing(name: impl Into<String>) -> Self {
        Self::new(ActivityType::PlayingGame, name)
    }

    pub fn streaming(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(ActivityType::Streaming, name)
        }
    }

    pub fn to_activity_data(&self) -> Result<ActivityData> {
        let data = match self.kind {
            ActivityType::PlayingGame => ActivityData::playing(&self.name),
            ActivityType::Listening => ActivityData::listening(&self.name),
            ActivityType::Watching => ActivityData::watching(&self.name),
            ActivityType::Competing => ActivityData::competing(&self.name),
            ActivityType::Custom => ActivityData::custom(&self.name),
            ActivityType::Streaming => {
                let url = self.url.clone().ok_or_else(|| {
                    GoldyError::Other(format!("Streaming activity '{}' needs a url", self.name))
                })?;
                ActivityData::streaming(&self.name, url)
                    .map_err(|e| GoldyError::gateway("building a streaming activity", e))?
            }
        };
        Ok(data)
    }
}

/// The presence Goldy Bot boots with: playing "Goldy Bot (v...)"
pub fn default_activity() -> Activity {
    Activity::playing(DISPLAY_NAME)
}

/// Controls the bot's status and activity on every shard
#[derive(Default)]
pub struct Presence {
    shard_manager: OnceLock<Arc<ShardManager>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand over the gateway's shards; later calls are ignored
    pub fn attach(&self, shard_manager: Arc<ShardManager>) {
        let _ = self.shard_manager.set(shard_manager);
    }

    pub fn is_attached(&self) -> bool {
        self.shard_manager.get().is_some()
    }

    /// Push a presence update to every running shard
    pub async fn change(&self, status: Status, activity: Option<Activity>) -> Result<()> {
        let shard_manager = self
            .shard_manager
            .get()
            .ok_or_else(|| GoldyError::not_ready("changing presence"))?;

        let activity = activity.map(|a| a.to_activity_data()).transpose()?;
        let runners = shard_manager.runners.lock().await;

        for (shard_id, runner) in runners.iter() {
            runner.runner_tx.set_presence(activity.clone(), status.into());
            debug!(shard = %shard_id, "Presence set to {}.", status.value());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_onto_gateway_status() {
        assert_eq!(OnlineStatus::from(Status::Invisible), OnlineStatus::Invisible);
        assert_eq!(OnlineStatus::from(Status::DoNotDisturb), OnlineStatus::DoNotDisturb);
        assert_eq!(Status::DoNotDisturb.value(), "dnd");
    }

    #[test]
    fn test_activity_type_values() {
        assert_eq!(ActivityType::PlayingGame.value(), 0);
        assert_eq!(ActivityType::Listening.value(), 2);
        assert_eq!(ActivityType::Competing.value(), 5);
    }

    #[test]
    fn test_default_activity() {
        let data = default_activity().to_activity_data().unwrap();
        assert_eq!(data.name, "Goldy Bot (v5.0dev1)");
        assert_eq!(data.kind, serenity::all::ActivityType::Playing);
    }

    #[test]
    fn test_streaming_needs_url() {
        assert!(
            Activity::new(ActivityType::Streaming, "live")
                .to_activity_data()
                .is_err()
        );
        assert!(
            Activity::streaming("live", "https://twitch.tv/goldy")
                .to_activity_data()
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_change_before_gateway_is_an_error() {
        let err = Presence::new()
            .change(Status::Online, Some(default_activity()))
            .await
            .unwrap_err();
        assert!(matches!(err, GoldyError::GatewayNotReady { .. }));
    }
}
