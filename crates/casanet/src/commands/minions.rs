//! Minion command handlers.

use tabled::Tabled;

use casanet_core::Minion;
use casanet_core::model::sort_minions;

use crate::cli::{GlobalOpts, MinionsArgs, MinionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct MinionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Device")]
    device: String,
}

fn minion_row(m: &Minion, color: bool) -> MinionRow {
    MinionRow {
        id: m.minion_id.clone(),
        name: m.name.clone(),
        kind: m.minion_type.to_string(),
        room: m.room.clone().unwrap_or_default(),
        power: output::power_label(m.is_on(), color),
        device: m
            .device
            .as_ref()
            .map(|d| format!("{} {}", d.brand, d.model).trim().to_owned())
            .unwrap_or_default(),
    }
}

pub async fn handle(
    hub: &casanet_core::Hub,
    args: MinionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let minions = hub.minions();

    match args.command {
        MinionsCommand::List => {
            let mut list = util::fetch(minions.data(), global).await?.as_ref().clone();
            sort_minions(&mut list);
            let out = output::render_list(
                &global.output,
                &list,
                |m| minion_row(m, color),
                |m| m.minion_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MinionsCommand::On { id } => set_power(hub, &id, true, global, color).await,
        MinionsCommand::Off { id } => set_power(hub, &id, false, global, color).await,
    }
}

async fn set_power(
    hub: &casanet_core::Hub,
    id: &str,
    on: bool,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    util::fetch(hub.minions().data(), global).await?;
    let updated = hub.minions().set_power(id, on).await?;
    let name = updated
        .iter()
        .find(|m| m.minion_id == id)
        .map_or(id, |m| m.name.as_str());
    util::status_line(
        global,
        &format!("{name} switched {}", output::power_label(on, color)),
    );
    Ok(())
}
