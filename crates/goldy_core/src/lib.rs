//! Goldy Core - the Goldy Bot framework
//!
//! Goldy Bot is a Discord bot framework: commands reachable both as guild
//! slash commands and as prefix commands, grouped into extensions that can be
//! ignored through `goldy.json` and reloaded from the live console.

pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod extensions;
pub mod goldy;
pub mod guilds;
pub mod info;
pub mod live_console;
pub mod paths;
pub mod platter;
pub mod presence;
pub mod token;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use commands::{Command, CommandBuilder, CommandLoader, CommandRegistry, CommandSink};
pub use config::{Config, GoldyConfig};
pub use database::Database;
pub use error::{GoldyError, Result};
pub use extensions::{Extension, ExtensionLoader, ExtensionRegistry, ExtensionReloader};
pub use goldy::{Goldy, GoldyBuilder, PrefixMessage, SlashInvocation};
pub use guilds::{Guild, Guilds};
pub use info::{COPYRIGHT, DISPLAY_NAME, VERSION};
pub use live_console::LiveConsole;
pub use paths::Paths;
pub use platter::{Author, GoldPlatter, PlatterType, ReplyTarget};
pub use presence::{Activity, ActivityType, Presence, Status};
pub use token::Token;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Command, Extension, GoldPlatter, Goldy, GoldyConfig, GoldyError, PlatterType, Result,
        Token,
    };
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
