//! Endpoint definition listing (offline).

use serde::Serialize;
use tabled::Tabled;

use ouman_api::registry::builtin;
use ouman_api::{Endpoint, EndpointKind, Registry, Unit};

use crate::cli::{EndpointsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Serializable view ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EndpointInfo {
    registry: &'static str,
    name: &'static str,
    kind: &'static str,
    unit: Unit,
    sensor_endpoint_id: &'static str,
    control_endpoint_ids: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<&'static str>,
}

impl EndpointInfo {
    fn new(registry: &Registry, endpoint: &Endpoint) -> Self {
        let (control_endpoint_ids, range, values) = match endpoint.kind {
            EndpointKind::IntControl(c) => (
                vec![c.control_endpoint_id],
                Some(format!("{}..={}", c.min_val, c.max_val)),
                Vec::new(),
            ),
            EndpointKind::FloatControl(c) => (
                vec![c.control_endpoint_id],
                Some(format!("{:.1}..={:.1}", c.min_val, c.max_val)),
                Vec::new(),
            ),
            EndpointKind::EnumControl(c) => (
                c.control_endpoint_ids.to_vec(),
                None,
                c.enum_kind.member_names(),
            ),
            EndpointKind::Enum(kind) => (Vec::new(), None, kind.member_names()),
            EndpointKind::Text | EndpointKind::Number => (Vec::new(), None, Vec::new()),
        };
        Self {
            registry: registry.name(),
            name: endpoint.name,
            kind: endpoint.kind.label(),
            unit: endpoint.unit,
            sensor_endpoint_id: endpoint.sensor_endpoint_id,
            control_endpoint_ids,
            range,
            values,
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Registry")]
    registry: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Sensor ID")]
    sensor: &'static str,
    #[tabled(rename = "Control ID")]
    control: String,
    #[tabled(rename = "Accepts")]
    accepts: String,
}

impl From<&EndpointInfo> for EndpointRow {
    fn from(e: &EndpointInfo) -> Self {
        Self {
            registry: e.registry,
            name: e.name,
            kind: e.kind,
            unit: e.unit.symbol(),
            sensor: e.sensor_endpoint_id,
            control: e.control_endpoint_ids.join(", "),
            accepts: e.range.clone().unwrap_or_else(|| e.values.join(" | ")),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &EndpointsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registries: Vec<&Registry> = match args.registry.as_deref() {
        Some(name) => vec![builtin::by_name(name).ok_or_else(|| CliError::NotFound {
            resource_type: "Registry".into(),
            identifier: name.into(),
            list_command: "registries".into(),
        })?],
        None => builtin::all().to_vec(),
    };

    let infos: Vec<EndpointInfo> = registries
        .into_iter()
        .flat_map(|r| r.iterate_endpoints().map(move |e| EndpointInfo::new(r, e)))
        .collect();

    let out = output::render_list(
        global.output_format(),
        &infos,
        |e| EndpointRow::from(e),
        |e| e.name.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
