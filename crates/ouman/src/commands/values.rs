//! Value read handler.

use serde::Serialize;
use tabled::Tabled;

use ouman_api::registry::builtin;
use ouman_api::{OumanClient, RegistrySet, Unit, Value};

use crate::cli::{GlobalOpts, ValuesArgs};
use crate::error::CliError;
use crate::output;

// ── Serializable view ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Reading {
    name: &'static str,
    value: Value,
    unit: Unit,
    sensor_endpoint_id: &'static str,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Endpoint")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Sensor ID")]
    sensor: &'static str,
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            name: r.name,
            value: output::with_unit(&r.value, r.unit),
            sensor: r.sensor_endpoint_id,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

async fn select_registries(
    client: &OumanClient,
    names: &[String],
) -> Result<RegistrySet, CliError> {
    if names.is_empty() {
        return Ok(client.get_active_registries().await?);
    }

    let selected = names
        .iter()
        .map(|name| {
            builtin::by_name(name)
                .cloned()
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "Registry".into(),
                    identifier: name.clone(),
                    list_command: "registries".into(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    RegistrySet::new(selected).map_err(|e| CliError::Validation {
        field: "registry".into(),
        reason: e.to_string(),
    })
}

pub async fn handle(
    client: &OumanClient,
    args: ValuesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let registries = select_registries(client, &args.registry).await?;
    let readings = client.get_values(&registries).await?;

    let rows: Vec<Reading> = readings
        .values
        .into_iter()
        .map(|(endpoint, value)| Reading {
            name: endpoint.name,
            value,
            unit: endpoint.unit,
            sensor_endpoint_id: endpoint.sensor_endpoint_id,
        })
        .collect();

    let out = output::render_list(
        global.output_format(),
        &rows,
        |r| ReadingRow::from(r),
        |r| format!("{}={}", r.name, r.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
