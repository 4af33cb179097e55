//! Bluetooth device command handlers.

use tabled::Tabled;

use casanet_core::model::{filter_bluetooth_devices, sort_bluetooth_devices};
use casanet_core::{BluetoothDevice, FetchOutcome, Hub};

use crate::cli::{BluetoothArgs, BluetoothCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct BluetoothRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "RSSI")]
    rssi: String,
    #[tabled(rename = "State")]
    state: String,
}

fn bluetooth_row(d: &BluetoothDevice) -> BluetoothRow {
    BluetoothRow {
        uuid: d.uuid.clone(),
        name: d.name.clone().unwrap_or_default(),
        rssi: d.rssi.map(|r| format!("{r} dBm")).unwrap_or_default(),
        state: d.connection_state.clone().unwrap_or_default(),
    }
}

fn render(
    format: &OutputFormat,
    devices: &[BluetoothDevice],
    search: Option<&str>,
) -> Result<String, CliError> {
    let mut list = filter_bluetooth_devices(devices, search.unwrap_or(""));
    sort_bluetooth_devices(&mut list);
    output::render_list(format, &list, bluetooth_row, |d| d.uuid.clone())
}

pub async fn handle(hub: &Hub, args: BluetoothArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bluetooth = hub.bluetooth();

    match args.command {
        BluetoothCommand::List(search) => {
            let all = util::fetch(bluetooth.data(), global).await?;
            let out = render(&global.output, &all, search.search.as_deref())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BluetoothCommand::Watch(search) => {
            util::watch(hub, bluetooth.data(), global, |devices| {
                render(&global.output, devices, search.search.as_deref())
            })
            .await
        }

        BluetoothCommand::Rename { uuid, name } => {
            let all = util::fetch(bluetooth.data(), global).await?;
            util::find(&all, "bluetooth device", &uuid, |d| d.uuid == uuid)?;
            bluetooth.rename(&uuid, &name).await?;
            util::status_line(global, &format!("Renamed {uuid} to {name}"));
            Ok(())
        }

        BluetoothCommand::Rescan => {
            util::status_line(global, "Scanning, this can take a while");
            let all = match bluetooth.rescan().await? {
                FetchOutcome::Applied(all) => all,
                FetchOutcome::Superseded => bluetooth.data().cached().unwrap_or_default(),
            };
            let out = render(&global.output, &all, None)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
