mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// NorthStar -- IVR experience demo backend.
#[derive(Parser, Debug)]
#[command(name = "northstar", version, about)]
struct Cli {
    /// Path to a northstar.toml (defaults to ./northstar.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        listen: Option<String>,

        /// Bearer key required on the JSON endpoints
        #[arg(long, env = "NORTHSTAR_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Place an outbound call that plays the demo document
    Call {
        /// Destination phone number
        #[arg(long)]
        to: String,
    },

    /// Start a scripted demo scenario
    Trigger {
        /// Destination: a phone number or `client:<identity>`
        #[arg(long)]
        to: String,

        /// Scenario key (see `northstar scenarios`)
        #[arg(long)]
        flow_type: Option<String>,
    },

    /// Issue a softphone access token
    Token {
        /// Also verify the token and print its claims
        #[arg(long)]
        decode: bool,
    },

    /// Print a TwiML document
    Twiml {
        #[command(subcommand)]
        document: TwimlCommands,
    },

    /// List the demo scenarios
    Scenarios,
}

#[derive(Subcommand, Debug)]
enum TwimlCommands {
    /// Script for a demo scenario (unknown keys print the fallback)
    Scenario {
        /// Scenario key
        #[arg(default_value = northstar_voice::DEFAULT_SCENARIO_KEY)]
        key: String,
    },

    /// Inbound call router
    Inbound,

    /// Answer-phone menu
    Answer,

    /// Answer-phone menu response for the given input
    HandleInput {
        /// Key pressed
        #[arg(long)]
        digits: Option<String>,

        /// Recognized speech
        #[arg(long)]
        speech: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment still applies.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve { listen, api_key } => commands::serve::run(config, listen, api_key),
        Commands::Call { to } => commands::call::run(config, &to),
        Commands::Trigger { to, flow_type } => {
            commands::call::trigger(config, &to, flow_type.as_deref())
        }
        Commands::Token { decode } => commands::token::run(config, decode),
        Commands::Twiml { document } => match document {
            TwimlCommands::Scenario { key } => commands::twiml::scenario(&key),
            TwimlCommands::Inbound => commands::twiml::inbound(),
            TwimlCommands::Answer => commands::twiml::answer(),
            TwimlCommands::HandleInput { digits, speech } => {
                commands::twiml::handle_input(digits.as_deref(), speech.as_deref())
            }
        },
        Commands::Scenarios => commands::scenarios::run(),
    }
}
