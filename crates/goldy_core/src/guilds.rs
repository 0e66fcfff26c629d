use parking_lot::RwLock;
use serenity::all::GuildId;
use tracing::{debug, info};

use crate::{GoldyError, Result, config::GoldyConfig, database::Database};

pub const DEFAULT_PREFIX: &str = "!";

/// A guild Goldy Bot is allowed to operate in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: GuildId,
    pub code_name: String,
    pub prefix: String,
}

impl Guild {
    pub fn new(id: GuildId, code_name: impl Into<String>) -> Self {
        Self {
            id,
            code_name: code_name.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// The allowed guilds and their settings
#[derive(Debug, Default)]
pub struct Guilds {
    guilds: RwLock<Vec<Guild>>,
}

impl Guilds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(guild id, code name)` pairs as found in `goldy.json`
    pub fn from_allowed(allowed: &[(String, String)]) -> Result<Self> {
        let guilds = Self::new();
        *guilds.guilds.write() = parse_allowed(allowed)?;
        Ok(guilds)
    }

    /// Load the allowed guilds from config, taking prefixes from the database when connected
    pub async fn setup(&self, config: &GoldyConfig, database: Option<&Database>) -> Result<()> {
        let mut guilds = parse_allowed(&config.allowed_guilds()?)?;

        if let Some(database) = database {
            for guild in guilds.iter_mut() {
                let document = database.guild_document(guild.id, &guild.code_name).await?;
                guild.prefix = document.prefix;
                debug!(guild = %guild.code_name, "Guild prefix is '{}'.", guild.prefix);
            }
        }

        info!("Set up {} allowed guild(s).", guilds.len());
        *self.guilds.write() = guilds;
        Ok(())
    }

    pub fn get_guild(&self, id: GuildId) -> Option<Guild> {
        self.guilds.read().iter().find(|guild| guild.id == id).cloned()
    }

    pub fn get_by_code_name(&self, code_name: &str) -> Option<Guild> {
        self.guilds
            .read()
            .iter()
            .find(|guild| guild.code_name == code_name)
            .cloned()
    }

    pub fn allowed_guilds(&self) -> Vec<Guild> {
        self.guilds.read().clone()
    }

    pub fn is_allowed(&self, id: GuildId) -> bool {
        self.guilds.read().iter().any(|guild| guild.id == id)
    }

    /// Change a guild's prefix, persisting it when a database is connected
    pub async fn set_prefix(
        &self,
        id: GuildId,
        prefix: &str,
        database: Option<&Database>,
    ) -> Result<bool> {
        if !self.is_allowed(id) {
            return Ok(false);
        }

        if let Some(database) = database {
            database.set_guild_prefix(id, prefix).await?;
        }

        let mut guilds = self.guilds.write();
        match guilds.iter_mut().find(|guild| guild.id == id) {
            Some(guild) => {
                guild.prefix = prefix.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn parse_allowed(allowed: &[(String, String)]) -> Result<Vec<Guild>> {
    allowed
        .iter()
        .map(|(id, code_name)| Ok(Guild::new(parse_guild_id(id)?, code_name)))
        .collect()
}

/// Parse a guild snowflake from its string form
pub fn parse_guild_id(id: &str) -> Result<GuildId> {
    id.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(GuildId::new)
        .ok_or_else(|| GoldyError::InvalidGuildId {
            guild_id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    #[test]
    fn test_parse_guild_id() {
        assert_eq!(
            parse_guild_id("863416692083916820").unwrap(),
            GuildId::new(863416692083916820)
        );
        assert!(parse_guild_id("0").is_err());
        assert!(parse_guild_id("not-a-guild").is_err());
        assert!(parse_guild_id("{guild_id_here}").is_err());
    }

    #[tokio::test]
    async fn test_setup_without_database_uses_default_prefix() {
        let config: GoldyConfig = Config::from_value(
            "goldy.json",
            json!({"goldy": {"allowed_guilds": {
                "{guild_id_here}": "{guild_code_name_here}",
                "863416692083916820": "goldy_dev"
            }}}),
        )
        .into();

        let guilds = Guilds::new();
        guilds.setup(&config, None).await.unwrap();

        let id = GuildId::new(863416692083916820);
        assert!(guilds.is_allowed(id));
        assert!(!guilds.is_allowed(GuildId::new(42)));

        let guild = guilds.get_guild(id).unwrap();
        assert_eq!(guild.code_name, "goldy_dev");
        assert_eq!(guild.prefix, DEFAULT_PREFIX);
        assert_eq!(guilds.get_by_code_name("goldy_dev"), Some(guild));
    }

    #[tokio::test]
    async fn test_setup_rejects_bad_ids() {
        let config: GoldyConfig = Config::from_value(
            "goldy.json",
            json!({"goldy": {"allowed_guilds": {"abc": "broken"}}}),
        )
        .into();

        let err = Guilds::new().setup(&config, None).await.unwrap_err();
        assert!(matches!(err, GoldyError::InvalidGuildId { .. }));
    }

    #[tokio::test]
    async fn test_set_prefix_only_for_allowed_guilds() {
        let guilds =
            Guilds::from_allowed(&[("863416692083916820".to_string(), "dev".to_string())]).unwrap();
        let id = GuildId::new(863416692083916820);

        assert!(guilds.set_prefix(id, "?", None).await.unwrap());
        assert_eq!(guilds.get_guild(id).unwrap().prefix, "?");
        assert!(!guilds.set_prefix(GuildId::new(5), "?", None).await.unwrap());
    }
}
