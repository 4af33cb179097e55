// ── Domain helpers ──
//
// Display ordering, search filtering and timing rules shared by every
// consumer. The wire types themselves live in `casanet_api::models` and
// are re-exported here.

mod devices;
mod minions;
mod timings;

pub use casanet_api::models::*;

pub use devices::{
    compare_by_device_part, filter_bluetooth_devices, filter_network_devices,
    sort_bluetooth_devices, sort_network_devices,
};
pub use minions::{default_status, is_on_mode, sort_minions};
pub use timings::{Hms, describe_schedule, ms_to_hms, toggle_day, validate_timing};
