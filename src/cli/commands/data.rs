use std::io::Read;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::cli::utils::{output_structured, output_success};
use crate::cli::OutputFormat;
use crate::models::EntityKind;
use crate::screens;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "Create a record from --data or stdin")]
    Create {
        #[arg(value_enum, help = "Entity type")]
        entity: EntityKind,
        #[arg(long, help = "JSON body (read from stdin if not provided)")]
        data: Option<String>,
    },

    #[command(about = "Update a record from --data or stdin")]
    Update {
        #[arg(value_enum, help = "Entity type")]
        entity: EntityKind,
        #[arg(help = "Record ID to update")]
        id: String,
        #[arg(long, help = "JSON body (read from stdin if not provided)")]
        data: Option<String>,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(value_enum, help = "Entity type")]
        entity: EntityKind,
        #[arg(help = "Record ID to delete")]
        id: String,
    },
}

pub async fn handle(cmd: DataCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DataCommands::Create { entity, data } => {
            let body = read_body(data)?;
            let created = client.create(screens::screen(entity).path, &body).await?;
            output_record(output_format, &format!("Created {} record", entity), created)
        }
        DataCommands::Update { entity, id, data } => {
            let body = read_body(data)?;
            let updated = client.update(screens::screen(entity).path, &id, &body).await?;
            output_record(output_format, &format!("Updated {} record {}", entity, id), updated)
        }
        DataCommands::Delete { entity, id } => {
            client.delete(screens::screen(entity).path, &id).await?;
            output_success(
                output_format,
                &format!("Deleted {} record {}", entity, id),
                Some(json!({ "id": id })),
            )
        }
    }
}

fn read_body(inline: Option<String>) -> anyhow::Result<Value> {
    let raw = match inline {
        Some(raw) => raw,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    let body: Value = serde_json::from_str(&raw)?;
    if !body.is_object() {
        anyhow::bail!("Record body must be a JSON object");
    }
    Ok(body)
}

fn output_record(output_format: OutputFormat, message: &str, record: Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        _ => output_structured(output_format, &json!({ "success": true, "message": message, "record": record })),
    }
}
