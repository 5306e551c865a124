use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_page, output_record, output_success};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::models::{EstadoPedido, Pedido, PedidosQuery};

#[derive(Subcommand)]
pub enum PedidoCommands {
    #[command(about = "List orders, newest first by default")]
    List {
        #[arg(long, help = "Status filter (repeatable)")]
        estado: Vec<String>,
        #[arg(long, help = "From date (YYYY-MM-DD or RFC 3339)")]
        desde: Option<String>,
        #[arg(long, help = "Until date (YYYY-MM-DD or RFC 3339)")]
        hasta: Option<String>,
        #[arg(long, help = "Customer phone")]
        telefono: Option<String>,
        #[arg(long, help = "created_at, total or estado")]
        sort: Option<String>,
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },

    #[command(about = "Show an order with its items")]
    Get {
        #[arg(help = "Order id")]
        id: Uuid,
    },

    #[command(about = "Move an order to a new status")]
    Estado {
        #[arg(help = "Order id")]
        id: Uuid,
        #[arg(help = "PENDIENTE, CONFIRMADO, EN_PREPARACION, ENVIADO, ENTREGADO or CANCELADO")]
        estado: String,
    },
}

fn pedido_line(pedido: &Pedido) -> String {
    format!(
        "{}  {}  {} ({})  ${}",
        pedido.id,
        pedido.estado.as_str(),
        pedido.cliente_nombre,
        pedido.cliente_telefono,
        pedido.total
    )
}

pub async fn handle(
    cmd: PedidoCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        PedidoCommands::List {
            estado,
            desde,
            hasta,
            telefono,
            sort,
            order,
            page,
            limit,
        } => {
            let query = PedidosQuery {
                page,
                limit,
                sort,
                order,
                estado,
                desde,
                hasta,
                telefono,
            };
            let pagina = client.pedidos(&query).await?;
            output_page(output_format, &pagina, "No orders found", pedido_line)
        }
        PedidoCommands::Get { id } => {
            let pedido = client.pedido(id).await?;
            output_record(output_format, &pedido)
        }
        PedidoCommands::Estado { id, estado } => {
            let estado: EstadoPedido = estado.to_uppercase().parse().map_err(anyhow::Error::msg)?;
            let pedido = client.cambiar_estado(id, estado).await?;
            output_success(
                output_format,
                &format!("Order {} is now {}", pedido.id, pedido.estado.as_str()),
                Some(json!({ "pedido": pedido })),
            )
        }
    }
}
