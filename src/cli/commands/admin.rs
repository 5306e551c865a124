use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::models::NuevoAdmin;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "List tables with their row counts")]
    Tables,

    #[command(about = "Create an ADMIN account")]
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TIENDA_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        nombre: String,
    },
}

pub async fn handle(cmd: AdminCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Migrate => {
            let report = client.migrate().await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => println!("{}", report.output),
            }
            Ok(())
        }
        AdminCommands::Tables => {
            let tables = client.tables().await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tables)?),
                OutputFormat::Text => {
                    let width = tables.iter().map(|t| t.table.len()).max().unwrap_or(0);
                    for t in &tables {
                        println!("{:<width$}  {}", t.table, t.rows, width = width);
                    }
                }
            }
            Ok(())
        }
        AdminCommands::CreateAdmin {
            email,
            password,
            nombre,
        } => {
            let usuario = client
                .crear_admin(&NuevoAdmin {
                    email,
                    password,
                    nombre,
                })
                .await?;
            output_success(
                output_format,
                &format!("Admin {} created", usuario.email),
                Some(json!({ "usuario": usuario })),
            )
        }
    }
}
