// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Location records resolved from the Avi-on cloud.
//!
//! A [`Location`] describes one mesh: the passphrase needed to join it and
//! the devices and groups it contains. It is produced once during service
//! initialization and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::types::Avid;

/// Product id used for groups and the synthetic "all devices" entity.
pub const GROUP_PRODUCT_ID: u32 = 0;

/// One mesh account location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Shared mesh passphrase.
    pub passphrase: String,
    /// Devices on the mesh.
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Groups defined on the mesh.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Location {
    /// Returns the mesh address of every device, in location order.
    ///
    /// This is the allow-list handed to the transport.
    #[must_use]
    pub fn device_avids(&self) -> Vec<Avid> {
        self.devices.iter().map(|d| d.avid.clone()).collect()
    }

    /// Looks up a device by its pid.
    #[must_use]
    pub fn device(&self, pid: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.pid == pid)
    }

    /// Looks up a group by its pid.
    #[must_use]
    pub fn group(&self, pid: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.pid == pid)
    }
}

/// A single mesh device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Configuration-facing identifier.
    pub pid: String,
    /// Mesh address.
    pub avid: Avid,
    /// Vendor product id, used for capability lookups.
    pub product_id: u32,
    /// Display name.
    pub name: String,
    /// Bluetooth MAC address, when the cloud reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}

/// A group of devices addressed as a single mesh target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Configuration-facing identifier.
    pub pid: String,
    /// Mesh address of the group.
    #[serde(default)]
    pub avid: Avid,
    /// Display name.
    pub name: String,
    /// Member device pids.
    #[serde(default)]
    pub devices: Vec<String>,
}

impl Group {
    /// Returns `true` if the device pid is a member of this group.
    #[must_use]
    pub fn contains(&self, pid: &str) -> bool {
        self.devices.iter().any(|d| d == pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        serde_json::from_value(serde_json::json!({
            "passphrase": "secret",
            "devices": [
                {"pid": "d1", "avid": 101, "product_id": 134, "name": "Lamp"},
                {"pid": "d2", "avid": "102", "product_id": 167, "name": "Switch",
                 "mac_address": "AA:BB:CC:DD:EE:FF"}
            ],
            "groups": [
                {"pid": "g1", "avid": 200, "name": "Kitchen", "devices": ["d1"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parses_numeric_and_string_avids() {
        let loc = location();
        assert_eq!(loc.devices[0].avid, Avid::new("101"));
        assert_eq!(loc.devices[1].avid, Avid::new("102"));
        assert_eq!(loc.groups[0].avid, Avid::new("200"));
    }

    #[test]
    fn device_avids_keep_order() {
        assert_eq!(
            location().device_avids(),
            vec![Avid::new("101"), Avid::new("102")]
        );
    }

    #[test]
    fn lookups_by_pid() {
        let loc = location();
        assert_eq!(loc.device("d2").map(|d| d.product_id), Some(167));
        assert!(loc.device("nope").is_none());
        assert!(loc.group("g1").is_some_and(|g| g.contains("d1")));
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let loc: Location = serde_json::from_str(r#"{"passphrase": "p"}"#).unwrap();
        assert!(loc.devices.is_empty());
        assert!(loc.groups.is_empty());
    }
}
