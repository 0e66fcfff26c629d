use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum GoldyError {
    #[error("Goldy config not found")]
    #[diagnostic(
        code(goldy::config_not_found),
        help(
            "Generate one by creating an environment with the command 'goldybot setup' in your terminal"
        )
    )]
    ConfigNotFound {
        config_path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("Failed to parse config")]
    #[diagnostic(
        code(goldy::config_parse_failed),
        help("{config_path} must be a valid JSON document")
    )]
    ConfigParseFailed {
        config_path: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("Missing config field '{field}'")]
    #[diagnostic(
        code(goldy::config_field_missing),
        help("{field} was not specified in {config_path}. Please don't alter this json file")
    )]
    ConfigFieldMissing { config_path: String, field: String },

    #[error("Invalid guild id '{guild_id}'")]
    #[diagnostic(
        code(goldy::invalid_guild_id),
        help("Guild ids in allowed_guilds must be Discord snowflakes, e.g. 863416692083916820")
    )]
    InvalidGuildId { guild_id: String },

    #[error("Missing environment variable {variable}")]
    #[diagnostic(
        code(goldy::token_missing),
        help("Add {variable} to the .env file in your working directory or export it")
    )]
    TokenMissing { variable: String },

    #[error("Discord rejected the bot token")]
    #[diagnostic(
        code(goldy::invalid_token),
        help("This might mean your Discord token ({token_preview}) is incorrect or was regenerated")
    )]
    InvalidToken { token_preview: String },

    #[error("Database connection failed")]
    #[diagnostic(
        code(goldy::database_connection_failed),
        help("Ensure MongoDB is reachable with the DATABASE_TOKEN connection string")
    )]
    DatabaseConnectionFailed {
        #[source]
        cause: mongodb::error::Error,
    },

    #[error("Database operation failed")]
    #[diagnostic(
        code(goldy::database_operation_failed),
        help("Operation '{operation}' on collection '{collection}' failed")
    )]
    DatabaseOperationFailed {
        operation: String,
        collection: String,
        #[source]
        cause: mongodb::error::Error,
    },

    #[error("Gateway error")]
    #[diagnostic(
        code(goldy::gateway_error),
        help("The Discord gateway client failed while {action}")
    )]
    Gateway {
        action: String,
        #[source]
        cause: serenity::Error,
    },

    #[error("Gateway not ready")]
    #[diagnostic(
        code(goldy::gateway_not_ready),
        help("Wait for the READY event before {action}")
    )]
    GatewayNotReady { action: String },

    #[error("Command registration failed")]
    #[diagnostic(
        code(goldy::command_registration_failed),
        help("Failed to {operation} slash command '{command_name}' in guild {guild_id}")
    )]
    CommandRegistrationFailed {
        command_name: String,
        guild_id: String,
        operation: String,
        #[source]
        cause: serenity::Error,
    },

    #[error("Duplicate command '{command_name}'")]
    #[diagnostic(
        code(goldy::duplicate_command),
        help("A command with this name is already registered by {owner}")
    )]
    DuplicateCommand { command_name: String, owner: String },

    #[error("Command not found")]
    #[diagnostic(
        code(goldy::command_not_found),
        help("Available commands: {}", available.join(", "))
    )]
    CommandNotFound {
        command_name: String,
        available: Vec<String>,
    },

    #[error("Command '{command_name}' failed")]
    #[diagnostic(code(goldy::command_failed))]
    CommandFailed {
        command_name: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Extension not found")]
    #[diagnostic(
        code(goldy::extension_not_found),
        help("Available extensions: {}", available.join(", "))
    )]
    ExtensionNotFound {
        code_name: String,
        available: Vec<String>,
    },

    #[error("Duplicate extension '{code_name}'")]
    #[diagnostic(
        code(goldy::duplicate_extension),
        help("Each extension needs a unique code name")
    )]
    DuplicateExtension { code_name: String },

    #[error("Extension '{code_name}' failed to load")]
    #[diagnostic(
        code(goldy::extension_load_failed),
        help(
            "Set goldy.extensions.raise_on_load_error to false in goldy.json to skip broken extensions instead"
        )
    )]
    ExtensionLoadFailed {
        code_name: String,
        #[source]
        cause: Box<GoldyError>,
    },

    #[error("I/O error at {path}")]
    #[diagnostic(code(goldy::io_error))]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(goldy::other))]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GoldyError>;

impl GoldyError {
    /// Show the first 6 and last 4 characters of a token, hiding the rest
    pub fn token_preview(token: &str) -> String {
        if token.len() > 10 && token.is_char_boundary(6) && token.is_char_boundary(token.len() - 4)
        {
            format!("{}...{}", &token[..6], &token[token.len() - 4..])
        } else {
            "***".to_string()
        }
    }

    pub fn invalid_token(token: &str) -> Self {
        Self::InvalidToken {
            token_preview: Self::token_preview(token),
        }
    }

    pub fn gateway(action: impl Into<String>, cause: serenity::Error) -> Self {
        Self::Gateway {
            action: action.into(),
            cause,
        }
    }

    pub fn not_ready(action: impl Into<String>) -> Self {
        Self::GatewayNotReady {
            action: action.into(),
        }
    }

    pub fn database(
        operation: impl Into<String>,
        collection: impl Into<String>,
        cause: mongodb::error::Error,
    ) -> Self {
        Self::DatabaseOperationFailed {
            operation: operation.into(),
            collection: collection.into(),
            cause,
        }
    }

    pub fn command_failed(
        command_name: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::CommandFailed {
            command_name: command_name.into(),
            cause: cause.into(),
        }
    }

    pub fn duplicate_command(command_name: impl Into<String>, extension: Option<&str>) -> Self {
        let owner = match extension {
            Some(extension) => format!("extension '{}'", extension),
            None => "the core".to_string(),
        };

        Self::DuplicateCommand {
            command_name: command_name.into(),
            owner,
        }
    }

    pub fn io(path: impl Into<String>, cause: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            cause,
        }
    }
}
