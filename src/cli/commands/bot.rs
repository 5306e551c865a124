use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::models::EstadoBot;

#[derive(Subcommand)]
pub enum BotCommands {
    #[command(about = "Show whether the bot is answering customers")]
    Estado,

    #[command(about = "Stop the bot from answering")]
    Pausar,

    #[command(about = "Let the bot answer again")]
    Reanudar,
}

fn print_estado(output_format: OutputFormat, estado: &EstadoBot) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(estado)?),
        OutputFormat::Text => {
            let label = if estado.activo { "active" } else { "paused" };
            match estado.updated_at {
                Some(at) => println!("Bot is {} (since {})", label, at.to_rfc3339()),
                None => println!("Bot is {}", label),
            }
        }
    }
    Ok(())
}

pub async fn handle(cmd: BotCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let estado = match cmd {
        BotCommands::Estado => client.estado_bot().await?,
        BotCommands::Pausar => client.pausar_bot().await?,
        BotCommands::Reanudar => client.reanudar_bot().await?,
    };
    print_estado(output_format, &estado)
}
