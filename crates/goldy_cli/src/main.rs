mod builtin;
mod commands;
mod output;
mod tracing_writer;

use clap::{Parser, Subcommand};
use goldy_core::{COPYRIGHT, DISPLAY_NAME};
use miette::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "goldybot")]
#[command(about = "Goldy Bot: a Discord bot framework")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and run the bot
    Start {
        /// Path to goldy.json (defaults to ./goldy.json)
        #[arg(long, short = 'c', env = "GOLDY_CONFIG")]
        config: Option<PathBuf>,

        /// Run without the live console
        #[arg(long)]
        no_console: bool,
    },
    /// Create goldy.json, .env and the extensions folder
    Setup {
        /// Directory to set up
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing environment
        #[arg(long)]
        force: bool,
    },
    /// Show the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .with_syntax_highlighting(miette::highlighters::SyntectHighlighter::default())
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("goldy_core=debug,goldybot=debug,warn")
        } else {
            EnvFilter::new("goldy_core=info,goldybot=info,warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(tracing_writer::init_tracing_writer())
        .with_file(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    match &cli.command {
        Commands::Start { config, no_console } => {
            commands::start::run(config.as_deref(), !*no_console).await?
        }
        Commands::Setup { path, force } => commands::setup::run(path, *force).await?,
        Commands::Version => {
            println!("{}", DISPLAY_NAME);
            println!("{}", COPYRIGHT);
        }
    }

    Ok(())
}
