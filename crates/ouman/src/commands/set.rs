//! Confirmed write handler.

use serde::Serialize;

use ouman_api::{Error as ApiError, OumanClient, Unit, Value};

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Confirmed {
    name: &'static str,
    value: Value,
    unit: Unit,
}

/// Write a value and print what the device confirmed.
///
/// The endpoint is resolved against the detected configuration, so
/// room-sensor wiring is picked up automatically.
pub async fn handle(client: &OumanClient, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registries = client.get_active_registries().await?;
    let endpoint = registries
        .find_by_name(&args.endpoint)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "Endpoint".into(),
            identifier: args.endpoint.clone(),
            list_command: "endpoints".into(),
        })?;

    let value = endpoint.parse_input(&args.value).map_err(ApiError::from)?;
    let value = client.set_endpoint_value(endpoint, value).await?;

    let confirmed = Confirmed {
        name: endpoint.name,
        value,
        unit: endpoint.unit,
    };
    let out = output::render_single(
        global.output_format(),
        &confirmed,
        |c| format!("{} set to {}", c.name, output::with_unit(&c.value, c.unit)),
        |c| c.value.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
