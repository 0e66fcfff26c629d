//! The live console: a small shell on the terminal while Goldy Bot runs

use std::io::Write;
use std::sync::Arc;

use owo_colors::OwoColorize;
use rustyline_async::{Readline, ReadlineEvent, SharedWriter};
use tracing::debug;

use crate::{GoldyError, Result, goldy::Goldy};

/// Shutdown reason used by `quit` and `exit`
pub const QUIT_REASON: &str = "Live console quit.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `reload` reloads every extension, `reload <name>` just one
    Reload(Option<String>),
    Quit,
    Exit,
    Help,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "" => Self::Empty,
            "reload" if rest.is_empty() => Self::Reload(None),
            "reload" => Self::Reload(Some(rest.to_string())),
            "quit" => Self::Quit,
            "exit" => Self::Exit,
            "help" | "?" => Self::Help,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Whether the console keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Quit,
}

/// Run one console command against the core, writing feedback to `out`
pub async fn execute<W: Write + Send>(
    goldy: &Goldy,
    command: ConsoleCommand,
    out: &mut W,
) -> ConsoleFlow {
    match command {
        ConsoleCommand::Empty => ConsoleFlow::Continue,
        ConsoleCommand::Help => {
            say(out, format!("{}", "Live console commands:".bright_yellow()));
            say(out, "  reload [extension]  reload one extension, or all of them");
            say(out, "  quit, exit          shut Goldy Bot down");
            say(out, "  help                show this message");
            ConsoleFlow::Continue
        }
        ConsoleCommand::Reload(code_name) => {
            let reloaded = goldy.reload_extension(code_name.as_deref()).await;
            match reloaded {
                Ok(()) => match code_name {
                    Some(code_name) => say(out, format!("Reloaded extension '{}'.", code_name)),
                    None => say(out, "Reloaded all extensions."),
                },
                Err(GoldyError::ExtensionNotFound {
                    code_name,
                    available,
                }) => say(
                    out,
                    format!(
                        "{} No extension called '{}'. Known extensions: {}",
                        "!".red(),
                        code_name,
                        available.join(", ")
                    ),
                ),
                Err(e) => say(out, format!("{} Reload failed: {}", "!".red(), e)),
            }
            ConsoleFlow::Continue
        }
        ConsoleCommand::Quit | ConsoleCommand::Exit => {
            debug!("Exiting...");
            goldy.stop(QUIT_REASON);
            ConsoleFlow::Quit
        }
        ConsoleCommand::Unknown(name) => {
            say(
                out,
                format!("Unknown command '{}'. Type 'help' for a list.", name),
            );
            ConsoleFlow::Continue
        }
    }
}

fn say<W: Write>(out: &mut W, line: impl AsRef<str>) {
    // Losing console feedback is not worth failing over
    let _ = writeln!(out, "{}", line.as_ref());
}

/// Reads commands from the terminal until Goldy Bot shuts down
pub struct LiveConsole {
    goldy: Arc<Goldy>,
    readline: Readline,
    writer: SharedWriter,
}

impl LiveConsole {
    /// Take over the terminal; log output should go through the returned writer
    pub fn new(goldy: Arc<Goldy>) -> Result<(Self, SharedWriter)> {
        let (readline, writer) = Readline::new(format!("{} ", ">".bright_yellow()))
            .map_err(|e| GoldyError::Other(format!("Could not start the live console: {}", e)))?;

        Ok((
            Self {
                goldy,
                readline,
                writer: writer.clone(),
            },
            writer,
        ))
    }

    pub async fn run(mut self) -> Result<()> {
        debug!("Live console started.");

        loop {
            let event = tokio::select! {
                event = self.readline.readline() => event,
                _ = self.goldy.wait_for_shutdown() => break,
            };

            match event {
                Ok(ReadlineEvent::Line(line)) => {
                    let command = ConsoleCommand::parse(&line);
                    if command != ConsoleCommand::Empty {
                        self.readline.add_history_entry(line);
                    }
                    if execute(&self.goldy, command, &mut self.writer).await == ConsoleFlow::Quit {
                        break;
                    }
                }
                Ok(ReadlineEvent::Interrupted) => {
                    // The terminal is in raw mode, so Ctrl-C arrives here instead of as a signal
                    self.goldy.stop("Keyboard interrupt detected!");
                    break;
                }
                Ok(ReadlineEvent::Eof) => {
                    self.goldy.stop(QUIT_REASON);
                    break;
                }
                Err(e) => {
                    return Err(GoldyError::Other(format!("Live console failed: {}", e)));
                }
            }
        }

        let _ = self.readline.flush();
        debug!("Live console stopped.");
        Ok(())
    }
}
