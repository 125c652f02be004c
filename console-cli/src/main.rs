///! consolectl
///!
///! Command-line front end for realm users and rules

mod api;
mod commands;
mod config;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use console_common::rule_list::SortKey;
use console_common::rules::RulesetLang;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Manager address; defaults to the configured server
    #[arg(short, long)]
    server: Option<String>,

    /// Realm to work on (super users only); defaults to the login realm
    #[arg(short, long)]
    realm: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long)]
    output: Option<String>,

    /// More log output; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage rulesets
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage realm users
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List rulesets of the realm
    List {
        /// List global rulesets instead (super users only)
        #[arg(short, long)]
        global: bool,
        /// Sort by name, createdOn or lang
        #[arg(long, default_value = "name")]
        sort: SortKey,
    },
    /// Delete rulesets one after another
    Delete {
        /// Ruleset ids
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(short, long)]
        global: bool,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Save a copy of a ruleset
    Copy {
        id: i64,
        #[arg(short, long)]
        global: bool,
    },
    /// Create an empty ruleset
    Add {
        /// Language (JSON, GROOVY, JAVASCRIPT, FLOW)
        lang: RulesetLang,
        /// Name instead of the default
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        global: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users with their role
    List,
    /// List assignable composite roles
    Roles,
    /// Create a user
    Create {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Composite role name or id
        #[arg(long)]
        role: Option<String>,
        /// Prompt for a password
        #[arg(short, long)]
        password: bool,
        /// Create the account disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Update a user
    Update {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// Prompt for a new password
        #[arg(short, long)]
        password: bool,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
    /// Delete a user
    Delete {
        username: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::LoggingConfig::from_env(cli.verbose).init();

    let mut config = config::Config::load().unwrap_or_else(|e| {
        output::print_warning(&format!("Ignoring unreadable config: {:#}", e));
        config::Config::default()
    });
    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Ok(token) = std::env::var("CONSOLECTL_TOKEN") {
        config.token = Some(token);
    }
    let format = output::OutputFormat::from_str(cli.output.as_deref().unwrap_or(&config.default_output));

    let api_client = api::ApiClient::new(&config.server, &config.realm).with_token(config.token.clone());
    let context = commands::Context {
        api: api_client,
        config,
        display_realm: cli.realm,
        format,
    };

    let result = match cli.command {
        Commands::Rules { command } => commands::rules::handle_rules_command(command, &context).await,
        Commands::Users { command } => commands::users::handle_users_command(command, &context).await,
        Commands::Config { command } => commands::config::handle_config_command(command, &context),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::debug!(error = ?e, "command failed");
    }
    result
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
