use std::cmp::Ordering;

use super::{BluetoothDevice, LocalNetworkDevice};

/// Compare two addresses by their last segment.
///
/// `192.168.1.9` sorts before `192.168.1.10`; MAC-style ids compare the
/// last octet as hex. Segments that are not numeric fall back to text
/// order, and equal segments to the full strings.
pub fn compare_by_device_part(a: &str, b: &str) -> Ordering {
    let hex = a.contains(':') && b.contains(':');
    let part_a = last_part(a);
    let part_b = last_part(b);
    let by_part = match (parse_part(part_a, hex), parse_part(part_b, hex)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => part_a.cmp(part_b),
    };
    by_part.then_with(|| a.cmp(b))
}

fn last_part(address: &str) -> &str {
    address.rsplit(['.', ':']).next().unwrap_or(address)
}

fn parse_part(part: &str, hex: bool) -> Option<u64> {
    u64::from_str_radix(part, if hex { 16 } else { 10 }).ok()
}

fn name_of(name: Option<&String>) -> &str {
    name.map_or("", String::as_str)
}

/// Devices with an address first, ordered by address; then by name.
pub fn sort_network_devices(devices: &mut [LocalNetworkDevice]) {
    devices.sort_by(|a, b| match (a.ip.as_deref(), b.ip.as_deref()) {
        (Some(x), Some(y)) => compare_by_device_part(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => name_of(a.name.as_ref()).cmp(name_of(b.name.as_ref())),
    });
}

/// Ordered by uuid (device-part comparison), empty uuids last by name.
pub fn sort_bluetooth_devices(devices: &mut [BluetoothDevice]) {
    devices.sort_by(|a, b| match (a.uuid.is_empty(), b.uuid.is_empty()) {
        (false, false) => compare_by_device_part(&a.uuid, &b.uuid),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => name_of(a.name.as_ref()).cmp(name_of(b.name.as_ref())),
    });
}

fn matches_term(fields: &[Option<&str>], term: &str) -> bool {
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(term))
}

/// Case-insensitive search over name, uuid and connection state. An empty
/// term keeps all.
pub fn filter_bluetooth_devices(devices: &[BluetoothDevice], term: &str) -> Vec<BluetoothDevice> {
    let term = term.trim().to_lowercase();
    devices
        .iter()
        .filter(|d| {
            let fields = [d.name.as_deref(), Some(d.uuid.as_str()), d.connection_state.as_deref()];
            term.is_empty() || matches_term(&fields, &term)
        })
        .cloned()
        .collect()
}

/// Case-insensitive search over name, mac, ip and vendor. An empty term
/// keeps all.
pub fn filter_network_devices(
    devices: &[LocalNetworkDevice],
    term: &str,
) -> Vec<LocalNetworkDevice> {
    let term = term.trim().to_lowercase();
    devices
        .iter()
        .filter(|d| {
            term.is_empty()
                || matches_term(
                    &[
                        d.name.as_deref(),
                        Some(d.mac.as_str()),
                        d.ip.as_deref(),
                        d.vendor.as_deref(),
                    ],
                    &term,
                )
        })
        .cloned()
        .collect()
}
