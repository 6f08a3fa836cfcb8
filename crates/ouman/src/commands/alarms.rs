//! Alarm command handler.

use serde::Serialize;
use tabled::Tabled;

use ouman_api::OumanClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AlarmEntry {
    key: String,
    value: String,
}

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&AlarmEntry> for AlarmRow {
    fn from(a: &AlarmEntry) -> Self {
        Self {
            key: a.key.clone(),
            value: a.value.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &OumanClient, global: &GlobalOpts) -> Result<(), CliError> {
    let alarms: Vec<AlarmEntry> = client
        .get_alarms()
        .await?
        .into_iter()
        .map(|(key, value)| AlarmEntry { key, value })
        .collect();

    let out = output::render_list(
        global.output_format(),
        &alarms,
        |a| AlarmRow::from(a),
        |a| format!("{}={}", a.key, a.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
