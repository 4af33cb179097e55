//! Local network device command handlers.

use tabled::Tabled;

use casanet_core::model::{filter_network_devices, sort_network_devices};
use casanet_core::{Hub, LocalNetworkDevice};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

fn device_row(d: &LocalNetworkDevice) -> DeviceRow {
    DeviceRow {
        mac: d.mac.clone(),
        ip: d.ip.clone().unwrap_or_default(),
        name: d.name.clone().unwrap_or_default(),
        vendor: d.vendor.clone().unwrap_or_default(),
    }
}

pub async fn handle(hub: &Hub, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = hub.devices();

    match args.command {
        DevicesCommand::List(search) => {
            let all = util::fetch(devices.data(), global).await?;
            let mut list = filter_network_devices(&all, search.search.as_deref().unwrap_or(""));
            sort_network_devices(&mut list);
            let out = output::render_list(&global.output, &list, device_row, |d| d.mac.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Rename { mac, name } => {
            let all = util::fetch(devices.data(), global).await?;
            let device = util::find(&all, "device", &mac, |d| d.mac.eq_ignore_ascii_case(&mac))?;
            let mac = device.mac.clone();
            devices.rename(&mac, &name).await?;
            util::status_line(global, &format!("Renamed {mac} to {name}"));
            Ok(())
        }
    }
}
