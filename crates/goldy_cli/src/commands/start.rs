use std::path::Path;

use goldy_core::{Goldy, GoldyConfig, LiveConsole, Token};
use miette::Result;
use tracing::info;

use crate::{builtin::GoldyExtension, output::Output, tracing_writer};

/// Boot Goldy Bot and keep her running until she is stopped
pub async fn run(config_path: Option<&Path>, console: bool) -> Result<()> {
    let output = Output::new();
    output.banner();

    let token = Token::from_env()?;
    let config = match config_path {
        Some(path) => {
            info!("Loading config from: {:?}", path);
            GoldyConfig::load_from(path)?
        }
        None => GoldyConfig::load()?,
    };
    output.kv("Config", &config.config().path().display().to_string());

    let goldy = Goldy::builder(token, config)
        .extension(GoldyExtension)
        .build()?;

    if !console {
        goldy.start().await?;
        return Ok(());
    }

    let (console, writer) = LiveConsole::new(goldy.clone())?;
    tracing_writer::set_shared_writer(writer);
    output.status("Live console ready, type 'help' for commands.");

    let gateway = async {
        let result = goldy.clone().start().await;
        // Wakes the console even when start failed before the gateway ran
        goldy.stop("Goldy Bot stopped.");
        result
    };

    let (started, console) = tokio::join!(gateway, console.run());
    if let Err(e) = console {
        output.warning(&e.to_string());
    }
    started?;
    Ok(())
}
