use anyhow::Context;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_page, output_record, output_success};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::models::{ClaveProducto, NuevoProducto, Precio, Producto, ProductosQuery};

#[derive(Subcommand)]
pub enum ProductoCommands {
    #[command(about = "List products with optional filters")]
    List {
        #[arg(long, help = "Category filter (repeatable)")]
        categoria: Vec<String>,
        #[arg(long)]
        subcategoria: Option<String>,
        #[arg(long, help = "Only products in stock (true) or out of stock (false)")]
        en_stock: Option<bool>,
        #[arg(short, long, help = "Case-insensitive name search")]
        q: Option<String>,
        #[arg(long, help = "nombre, categoria, precio or created_at")]
        sort: Option<String>,
        #[arg(long, help = "asc or desc")]
        order: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },

    #[command(about = "Show a product by id, or by barcode with --codigo")]
    Get {
        #[arg(help = "Product id")]
        id: Option<Uuid>,
        #[arg(long, conflicts_with = "id", help = "Barcode to look up")]
        codigo: Option<String>,
    },

    #[command(about = "Create a product with a fixed or starting-from price")]
    Create {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        categoria: String,
        #[arg(long)]
        subcategoria: Option<String>,
        #[arg(long, help = "Fixed price")]
        precio: Option<Decimal>,
        #[arg(long, help = "Starting-from price")]
        precio_desde: Option<Decimal>,
        #[arg(long)]
        unidad: Option<String>,
        #[arg(long)]
        codigo_barras: Option<String>,
        #[arg(long)]
        descripcion: Option<String>,
        #[arg(long, help = "Mark the product as out of stock")]
        sin_stock: bool,
    },

    #[command(about = "Delete a product")]
    Delete {
        #[arg(help = "Product id")]
        id: Uuid,
    },

    #[command(about = "Print the categoria::subcategoria::nombre key of a product, or parse one")]
    Clave {
        #[arg(help = "Key to parse, e.g. Bebidas::Gaseosas::Cola 2L")]
        clave: Option<String>,
        #[arg(long, conflicts_with = "clave", help = "Product id whose key to print")]
        id: Option<Uuid>,
    },
}

fn product_line(producto: &Producto) -> String {
    let precio = match producto.precio {
        Precio::Fijo(m) => format!("${}", m),
        Precio::Desde(m) => format!("desde ${}", m),
    };
    let stock = if producto.en_stock { "" } else { " [sin stock]" };
    format!("{}  {}  {}{}", producto.id, producto.clave(), precio, stock)
}

pub async fn handle(
    cmd: ProductoCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ProductoCommands::List {
            categoria,
            subcategoria,
            en_stock,
            q,
            sort,
            order,
            page,
            limit,
        } => {
            let query = ProductosQuery {
                page,
                limit,
                sort,
                order,
                categoria,
                subcategoria,
                en_stock,
                q,
            };
            let pagina = client.productos(&query).await?;
            output_page(output_format, &pagina, "No products found", product_line)
        }
        ProductoCommands::Get { id, codigo } => {
            let producto = match (id, codigo) {
                (Some(id), _) => client.producto(id).await?,
                (None, Some(codigo)) => client.producto_por_codigo(&codigo).await?,
                (None, None) => anyhow::bail!("Provide a product id or --codigo"),
            };
            output_record(output_format, &producto)
        }
        ProductoCommands::Create {
            nombre,
            categoria,
            subcategoria,
            precio,
            precio_desde,
            unidad,
            codigo_barras,
            descripcion,
            sin_stock,
        } => {
            let nuevo = NuevoProducto {
                nombre,
                categoria,
                subcategoria,
                precio,
                precio_desde,
                unidad,
                en_stock: sin_stock.then_some(false),
                codigo_barras,
                descripcion,
                imagen_url: None,
            };
            let producto = client.crear_producto(&nuevo).await?;
            output_success(
                output_format,
                &format!("Product '{}' created", producto.clave()),
                Some(json!({ "producto": producto })),
            )
        }
        ProductoCommands::Delete { id } => {
            client.eliminar_producto(id).await?;
            output_success(output_format, &format!("Product {} deleted", id), None)
        }
        ProductoCommands::Clave { clave, id } => {
            let clave = match (clave, id) {
                (Some(raw), _) => raw
                    .parse::<ClaveProducto>()
                    .map_err(anyhow::Error::msg)
                    .context("Invalid product key")?,
                (None, Some(id)) => client.producto(id).await?.clave(),
                (None, None) => anyhow::bail!("Provide a key to parse or --id"),
            };
            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "clave": clave.to_string(),
                        "categoria": clave.categoria,
                        "subcategoria": clave.subcategoria,
                        "nombre": clave.nombre,
                    }))?
                ),
                OutputFormat::Text => println!("{}", clave),
            }
            Ok(())
        }
    }
}
