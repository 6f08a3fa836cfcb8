//! Built-in registry listing (offline).

use serde::Serialize;
use tabled::Tabled;

use ouman_api::Registry;
use ouman_api::registry::builtin;

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Debug, Serialize)]
struct RegistrySummary {
    name: &'static str,
    endpoints: usize,
    controllable: usize,
}

impl From<&Registry> for RegistrySummary {
    fn from(r: &Registry) -> Self {
        Self {
            name: r.name(),
            endpoints: r.len(),
            controllable: r.iterate_endpoints().filter(|e| e.is_controllable()).count(),
        }
    }
}

#[derive(Tabled)]
struct RegistryRow {
    #[tabled(rename = "Registry")]
    name: &'static str,
    #[tabled(rename = "Endpoints")]
    endpoints: usize,
    #[tabled(rename = "Controllable")]
    controllable: usize,
}

pub fn handle(global: &GlobalOpts) {
    let summaries: Vec<RegistrySummary> = builtin::all()
        .into_iter()
        .map(RegistrySummary::from)
        .collect();

    let out = output::render_list(
        global.output_format(),
        &summaries,
        |s| RegistryRow {
            name: s.name,
            endpoints: s.endpoints,
            controllable: s.controllable,
        },
        |s| s.name.to_owned(),
    );
    output::print_output(&out, global.quiet);
}
