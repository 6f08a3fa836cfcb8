//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod alarms;
pub mod endpoints;
pub mod registries;
pub mod set;
pub mod values;

use ouman_api::OumanClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
///
/// The caller owns the session; handlers assume a logged-in client.
pub async fn dispatch(
    cmd: Command,
    client: &OumanClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Values(args) => values::handle(client, args, global).await,
        Command::Set(args) => set::handle(client, args, global).await,
        Command::Alarms => alarms::handle(client, global).await,
        // Offline commands are handled before a session is opened
        Command::Registries | Command::Endpoints(_) => unreachable!(),
    }
}
