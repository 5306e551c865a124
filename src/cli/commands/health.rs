use crate::cli::utils::display_value;
use crate::cli::OutputFormat;
use crate::client::ApiClient;

/// Exits non-zero when the server reports itself unhealthy
pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let (status, body) = client.health().await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
        OutputFormat::Text => {
            println!("Server: {}", client.base_url());
            let data = &body["data"];
            println!("Status: {}", display_value(&data["status"]));
            match data.get("database_error") {
                Some(err) => println!("Database: {}", display_value(err)),
                None => println!("Database: {}", display_value(&data["database"])),
            }
        }
    }

    if !status.is_success() {
        anyhow::bail!("server reported {}", status);
    }
    Ok(())
}
