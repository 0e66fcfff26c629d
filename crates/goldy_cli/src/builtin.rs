//! Extensions that ship with the `goldybot` binary

use std::sync::Arc;

use goldy_core::{
    COPYRIGHT, DISPLAY_NAME,
    prelude::{Command, Extension, GoldPlatter, async_trait},
};

/// The `goldy` extension: information about the bot itself
pub struct GoldyExtension;

pub fn about() -> String {
    format!("💛 {} - {}", DISPLAY_NAME, COPYRIGHT)
}

#[async_trait]
impl Extension for GoldyExtension {
    fn code_name(&self) -> &str {
        "goldy"
    }

    fn commands(self: Arc<Self>) -> Vec<Command> {
        vec![
            Command::builder("goldy")
                .description("Shows which Goldy Bot is running.")
                .build(|platter: GoldPlatter| async move { platter.send_message(about()).await }),
        ]
    }
}
