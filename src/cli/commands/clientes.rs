use clap::Subcommand;

use crate::cli::utils::{output_page, output_record};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::models::{Cliente, ClientesQuery};

#[derive(Subcommand)]
pub enum ClienteCommands {
    #[command(about = "List customers")]
    List {
        #[arg(short, long, help = "Search by name or phone")]
        q: Option<String>,
        #[arg(long, help = "nombre, total_pedidos, total_gastado or fecha_registro")]
        sort: Option<String>,
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },

    #[command(about = "Show a customer and their recent orders")]
    Get {
        #[arg(help = "Phone number")]
        telefono: String,
    },
}

fn cliente_line(cliente: &Cliente) -> String {
    format!(
        "{}  {}  {} pedidos  ${}",
        cliente.telefono, cliente.nombre, cliente.total_pedidos, cliente.total_gastado
    )
}

pub async fn handle(
    cmd: ClienteCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ClienteCommands::List {
            q,
            sort,
            order,
            page,
            limit,
        } => {
            let query = ClientesQuery {
                page,
                limit,
                sort,
                order,
                q,
            };
            let pagina = client.clientes(&query).await?;
            output_page(output_format, &pagina, "No customers found", cliente_line)
        }
        ClienteCommands::Get { telefono } => {
            let detalle = client.cliente(&telefono).await?;
            output_record(output_format, &detalle)
        }
    }
}
