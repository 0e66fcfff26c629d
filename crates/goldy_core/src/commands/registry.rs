use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use serenity::all::{CommandData, CommandDataOptionValue};
use tracing::debug;

use super::{Command, SlashCommandSpec, SlashOption};
use crate::{GoldyError, Result};

/// Every command registered with Goldy, keyed by qualified name
#[derive(Default)]
pub struct CommandRegistry {
    commands: DashMap<String, Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; names must be unique
    pub fn add(&self, command: Command) -> Result<Arc<Command>> {
        match self.commands.entry(command.qualified_name()) {
            Entry::Occupied(existing) => Err(GoldyError::duplicate_command(
                existing.key().clone(),
                existing.get().extension(),
            )),
            Entry::Vacant(slot) => {
                let command = Arc::new(command);
                debug!(command = %slot.key(), "Command initialized!");
                slot.insert(command.clone());
                Ok(command)
            }
        }
    }

    pub fn get(&self, qualified_name: &str) -> Option<Arc<Command>> {
        self.commands
            .get(qualified_name)
            .map(|entry| entry.value().clone())
    }

    pub fn remove(&self, qualified_name: &str) -> Option<Arc<Command>> {
        self.commands.remove(qualified_name).map(|(_, command)| command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All commands, sorted by qualified name
    pub fn list(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<_> = self
            .commands
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        commands.sort_by_key(|command| command.qualified_name());
        commands
    }

    pub fn names(&self) -> Vec<String> {
        self.list()
            .iter()
            .map(|command| command.qualified_name())
            .collect()
    }

    /// Commands that belong to the extension with this code name
    pub fn by_extension(&self, extension: &str) -> Vec<Arc<Command>> {
        self.list()
            .into_iter()
            .filter(|command| command.extension() == Some(extension))
            .collect()
    }

    pub fn children_of(&self, parent: &str) -> Vec<Arc<Command>> {
        self.list()
            .into_iter()
            .filter(|command| command.parent() == Some(parent))
            .collect()
    }

    /// Find the loaded prefix command `content` invokes under `prefix`, with its args
    ///
    /// The first whitespace separated token must be exactly `prefix + name`. If the
    /// next token names a subcommand of that command, the subcommand wins.
    pub fn find_prefix(&self, content: &str, prefix: &str) -> Option<(Arc<Command>, Vec<String>)> {
        if prefix.is_empty() {
            return None;
        }

        let mut tokens = content.split_whitespace();
        let name = tokens.next()?.strip_prefix(prefix)?;
        if name.is_empty() {
            return None;
        }
        let rest: Vec<String> = tokens.map(str::to_string).collect();

        let accepts_prefix =
            |command: &Arc<Command>| command.loaded() && command.allow_prefix_cmd();

        if let Some(sub) = rest.first() {
            if let Some(child) = self
                .get(&format!("{} {}", name, sub))
                .filter(accepts_prefix)
            {
                return Some((child, rest[1..].to_vec()));
            }
        }

        let command = self
            .get(name)
            .filter(|command| !command.is_child())
            .filter(accepts_prefix)?;
        Some((command, rest))
    }

    /// Find the loaded slash command an interaction invokes, with its args in parameter order
    pub fn find_slash(&self, input: &SlashInput) -> Option<(Arc<Command>, Vec<String>)> {
        let parent = self.get(&input.name)?;
        if !parent.allow_slash_cmd() {
            return None;
        }

        let command = match &input.subcommand {
            Some(sub) => self.get(&format!("{} {}", input.name, sub))?,
            None => parent,
        };
        if !command.loaded() || !command.allow_slash_cmd() {
            return None;
        }

        let args = command
            .params()
            .iter()
            .filter_map(|param| {
                input
                    .options
                    .iter()
                    .find(|(name, _)| name == param)
                    .map(|(_, value)| value.clone())
            })
            .collect();

        Some((command, args))
    }

    /// What to register with Discord for a top-level command, including its subcommands
    pub fn slash_spec(&self, command: &Command) -> SlashCommandSpec {
        let mut options: Vec<SlashOption> = command
            .params()
            .iter()
            .map(|param| SlashOption::string(param))
            .collect();

        for child in self.children_of(command.name()) {
            if child.allow_slash_cmd() {
                options.push(SlashOption::SubCommand {
                    name: child.name().to_string(),
                    description: child.description().to_string(),
                    options: child
                        .params()
                        .iter()
                        .map(|param| SlashOption::string(param))
                        .collect(),
                });
            }
        }

        SlashCommandSpec {
            name: command.name().to_string(),
            description: command.description().to_string(),
            options,
        }
    }
}

/// The parts of a slash command interaction Goldy dispatches on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashInput {
    pub name: String,
    pub subcommand: Option<String>,
    pub options: Vec<(String, String)>,
}

impl SlashInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn subcommand(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    pub fn from_interaction(data: &CommandData) -> Self {
        let mut input = Self::new(data.name.clone());

        for option in &data.options {
            match &option.value {
                CommandDataOptionValue::SubCommand(inner) => {
                    input.subcommand = Some(option.name.clone());
                    input.options.extend(
                        inner
                            .iter()
                            .filter_map(|o| option_text(&o.value).map(|v| (o.name.clone(), v))),
                    );
                }
                value => {
                    if let Some(text) = option_text(value) {
                        input.options.push((option.name.clone(), text));
                    }
                }
            }
        }

        input
    }

    /// Rendering of the invocation, e.g. `/role add user:bob`
    pub fn render(&self) -> String {
        let mut rendered = format!("/{}", self.name);
        if let Some(sub) = &self.subcommand {
            rendered.push(' ');
            rendered.push_str(sub);
        }
        for (name, value) in &self.options {
            rendered.push_str(&format!(" {}:{}", name, value));
        }
        rendered
    }
}

fn option_text(value: &CommandDataOptionValue) -> Option<String> {
    match value {
        CommandDataOptionValue::String(text) => Some(text.clone()),
        CommandDataOptionValue::Integer(number) => Some(number.to_string()),
        CommandDataOptionValue::Number(number) => Some(number.to_string()),
        CommandDataOptionValue::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}
