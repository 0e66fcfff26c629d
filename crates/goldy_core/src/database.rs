//! MongoDB access for Goldy Bot

use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Document, doc},
    options::{ClientOptions, ReplaceOptions},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serenity::all::GuildId;
use tracing::{debug, info};

use crate::{GoldyError, Result, guilds::DEFAULT_PREFIX};

pub const DATABASE_NAME: &str = "goldy";
pub const GUILDS_COLLECTION: &str = "guilds";

/// Per-guild settings stored in the `guilds` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub code_name: String,
    pub prefix: String,
}

impl GuildDocument {
    pub fn new(guild_id: GuildId, code_name: impl Into<String>) -> Self {
        Self {
            id: guild_id.to_string(),
            code_name: code_name.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Async handle on Goldy's MongoDB database
#[derive(Clone, Debug)]
pub struct Database {
    client: Client,
    database: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with `url` and make sure the server answers
    pub async fn connect(url: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(|e| GoldyError::DatabaseConnectionFailed { cause: e })?;
        options.app_name = Some("goldybot".to_string());

        let client = Client::with_options(options)
            .map_err(|e| GoldyError::DatabaseConnectionFailed { cause: e })?;
        let database = Self {
            database: client.database(DATABASE_NAME),
            client,
        };

        debug!("Pinging MongoDB...");
        database.ping().await?;
        info!("Connected to MongoDB database '{}'.", DATABASE_NAME);

        Ok(database)
    }

    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| GoldyError::DatabaseConnectionFailed { cause: e })?;
        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    pub async fn insert<T>(&self, collection: &str, value: &T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(collection)
            .insert_one(value, None)
            .await
            .map_err(|e| GoldyError::database("insert", collection, e))?;
        Ok(())
    }

    pub async fn find_one<T>(&self, collection: &str, filter: Document) -> Result<Option<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        self.collection::<T>(collection)
            .find_one(filter, None)
            .await
            .map_err(|e| GoldyError::database("find_one", collection, e))
    }

    pub async fn find_all<T>(&self, collection: &str, filter: Document) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = self
            .collection::<T>(collection)
            .find(filter, None)
            .await
            .map_err(|e| GoldyError::database("find", collection, e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| GoldyError::database("find", collection, e))
    }

    /// Merge `fields` into the first document matching `filter`, returning how many changed
    pub async fn edit(&self, collection: &str, filter: Document, fields: Document) -> Result<u64> {
        let result = self
            .collection::<Document>(collection)
            .update_one(filter, set_update(fields), None)
            .await
            .map_err(|e| GoldyError::database("edit", collection, e))?;
        Ok(result.modified_count)
    }

    pub async fn remove(&self, collection: &str, filter: Document) -> Result<u64> {
        let result = self
            .collection::<Document>(collection)
            .delete_one(filter, None)
            .await
            .map_err(|e| GoldyError::database("remove", collection, e))?;
        Ok(result.deleted_count)
    }

    /// The guild's document, created with defaults if it does not exist yet
    pub async fn guild_document(&self, guild_id: GuildId, code_name: &str) -> Result<GuildDocument> {
        if let Some(document) = self
            .find_one::<GuildDocument>(GUILDS_COLLECTION, guild_filter(guild_id))
            .await?
        {
            return Ok(document);
        }

        let document = GuildDocument::new(guild_id, code_name);
        self.collection::<GuildDocument>(GUILDS_COLLECTION)
            .replace_one(
                guild_filter(guild_id),
                &document,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(|e| GoldyError::database("upsert", GUILDS_COLLECTION, e))?;

        debug!(guild = %code_name, "Created guild document.");
        Ok(document)
    }

    pub async fn set_guild_prefix(&self, guild_id: GuildId, prefix: &str) -> Result<u64> {
        self.edit(
            GUILDS_COLLECTION,
            guild_filter(guild_id),
            doc! { "prefix": prefix },
        )
        .await
    }

    /// Close the client, waiting for in-flight operations
    pub async fn close(self) {
        debug!("Closing MongoDB client...");
        self.client.shutdown().await;
    }
}

pub fn guild_filter(guild_id: GuildId) -> Document {
    doc! { "_id": guild_id.to_string() }
}

/// Wrap plain fields in a `$set` update
pub fn set_update(fields: Document) -> Document {
    doc! { "$set": fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guild_document_shape() {
        let document = GuildDocument::new(GuildId::new(863416692083916820), "goldy_dev");
        let bson = bson::to_document(&document).unwrap();

        assert_eq!(bson.get_str("_id").unwrap(), "863416692083916820");
        assert_eq!(bson.get_str("code_name").unwrap(), "goldy_dev");
        assert_eq!(bson.get_str("prefix").unwrap(), DEFAULT_PREFIX);

        let back: GuildDocument = bson::from_document(bson).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_filters_and_updates() {
        assert_eq!(
            guild_filter(GuildId::new(5)),
            doc! { "_id": "5" }
        );
        assert_eq!(
            set_update(doc! { "prefix": "?" }),
            doc! { "$set": { "prefix": "?" } }
        );
    }
}
