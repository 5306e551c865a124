pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(about = "Tienda CLI - command-line interface for the shop bot API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "TIENDA_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the API server"
    )]
    pub url: String,

    #[arg(long, global = true, env = "TIENDA_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: Option<String>,

    #[arg(
        long,
        global = true,
        env = "MIGRATION_SECRET",
        hide_env_values = true,
        help = "Secret sent as x-migration-token on admin commands"
    )]
    pub migration_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Product catalog")]
    Productos {
        #[command(subcommand)]
        cmd: commands::productos::ProductoCommands,
    },

    #[command(about = "Orders and their status")]
    Pedidos {
        #[command(subcommand)]
        cmd: commands::pedidos::PedidoCommands,
    },

    #[command(about = "Customers")]
    Clientes {
        #[command(subcommand)]
        cmd: commands::clientes::ClienteCommands,
    },

    #[command(about = "Pause or resume the bot")]
    Bot {
        #[command(subcommand)]
        cmd: commands::bot::BotCommands,
    },

    #[command(about = "Administrative operations (requires the migration secret)")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Check server and database health")]
    Health,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn build_client(cli: &Cli) -> anyhow::Result<ApiClient> {
    let mut client = ApiClient::new(&cli.url)?;
    if let Some(token) = &cli.token {
        client = client.bearer_token(token.clone());
    }
    if let Some(secret) = &cli.migration_token {
        client = client.admin_token(secret.clone());
    }
    Ok(client)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = build_client(&cli)?;

    match cli.command {
        Commands::Productos { cmd } => commands::productos::handle(cmd, &client, output_format).await,
        Commands::Pedidos { cmd } => commands::pedidos::handle(cmd, &client, output_format).await,
        Commands::Clientes { cmd } => commands::clientes::handle(cmd, &client, output_format).await,
        Commands::Bot { cmd } => commands::bot::handle(cmd, &client, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, &client, output_format).await,
        Commands::Health => commands::health::handle(&client, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "tienda",
            "--json",
            "--url",
            "http://localhost:9999",
            "pedidos",
            "list",
            "--estado",
            "PENDIENTE",
            "--estado",
            "ENVIADO",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert_eq!(cli.url, "http://localhost:9999");
        match cli.command {
            Commands::Pedidos {
                cmd: commands::pedidos::PedidoCommands::List { estado, .. },
            } => assert_eq!(estado, vec!["PENDIENTE", "ENVIADO"]),
            _ => panic!("expected pedidos list"),
        }
    }
}
