use std::path::{Path, PathBuf};

use goldy_core::{Config, GoldyConfig, Paths, config::save_json};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Contents of a fresh `.env`
pub const ENV_TEMPLATE: &str = "DISCORD_TOKEN=\nDATABASE_TOKEN=\n";

/// Create a Goldy Bot environment in `root` and tell the user what to fill in
pub async fn run(root: &Path, force: bool) -> Result<()> {
    let output = Output::new();
    output.section("Setting up Goldy Bot");

    for path in create_environment(root, force).await? {
        output.success(&format!("Created {}", path.display()));
    }

    println!();
    println!("Next steps:");
    println!(
        "  1. Put your bot token in {} as {}",
        Paths::ENV_FILE.bright_cyan(),
        "DISCORD_TOKEN".bright_yellow()
    );
    println!(
        "  2. Add your guilds to {} under {}",
        GoldyConfig::FILE_NAME.bright_cyan(),
        "allowed_guilds".bright_yellow()
    );
    println!("  3. Run {}", "goldybot start".bright_green());
    Ok(())
}

/// Write `goldy.json`, `.env` and the extensions folder, returning what was created
///
/// Existing files are only replaced when `force` is set.
pub async fn create_environment(root: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let paths = Paths::new(root);
    let config_path = paths.goldy_config();
    let env_path = paths.env_file();

    if !force {
        for path in [&config_path, &env_path] {
            if path.exists() {
                return Err(miette::miette!(
                    code = "goldybot::setup_exists",
                    help = "Run 'goldybot setup --force' to overwrite it",
                    "{} already exists",
                    path.display()
                ));
            }
        }
    }

    tokio::fs::create_dir_all(root).await.into_diagnostic()?;

    let template = GoldyConfig::template();
    save_json(&template, &config_path).await?;
    tokio::fs::write(&env_path, ENV_TEMPLATE)
        .await
        .into_diagnostic()?;

    let config = GoldyConfig::from(Config::from_value(&config_path, template));
    let extensions = paths.extensions_folder(Some(&config));
    tokio::fs::create_dir_all(&extensions)
        .await
        .into_diagnostic()?;

    Ok(vec![config_path, env_path, extensions])
}
