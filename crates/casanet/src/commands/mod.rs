//! Command dispatch: bridges CLI args -> hub services -> output formatting.

pub mod bluetooth;
pub mod config_cmd;
pub mod devices;
pub mod minions;
pub mod session;
pub mod timings;
pub mod util;

use casanet_core::Hub;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Timings(args) => timings::handle(hub, args, global).await,
        Command::Minions(args) => minions::handle(hub, args, global).await,
        Command::Devices(args) => devices::handle(hub, args, global).await,
        Command::Bluetooth(args) => bluetooth::handle(hub, args, global).await,
        Command::Login(args) => session::login(hub, args, global).await,
        Command::Logout => session::logout(hub, global).await,
        // Handled before a hub is built
        Command::Config(_) | Command::Completions(_) | Command::Whoami => Ok(()),
    }
}
