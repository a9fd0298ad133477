pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::config::config;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "CRM Console - administrative command line for the CRM backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Output in YAML format")]
    pub yaml: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session information")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List one page of an entity screen")]
    List(commands::list::ListArgs),

    #[command(about = "Create, update or delete records")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else if cli.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let session = Session::from_config(config())?;
    let client = ApiClient::new(config(), session)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &client, output_format).await,
        Commands::List(args) => commands::list::handle(args, &client, output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, &client, output_format).await,
    }
}
