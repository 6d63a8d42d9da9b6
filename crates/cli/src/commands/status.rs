//! Server health command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, HealthResponse};
use crate::output::{color_status, OutputFormat};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show the server's component health. An unhealthy server answers with a
/// 503 but still sends the health body, so the table renders either way.
pub async fn status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get_any_status("healthz").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Table => {
            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    component: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.component.cmp(&b.component));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nOverall: {}", color_status(&health.status));
        }
    }

    Ok(())
}
