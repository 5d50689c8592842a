// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection of the devices and groups that become light entities.

use std::collections::HashSet;
use std::fmt;

use crate::config::MeshConfig;
use crate::model::{Device, GROUP_PRODUCT_ID, Group, Location};
use crate::types::Avid;

/// Pid of the synthetic entity that addresses the whole mesh.
pub const ALL_DEVICES_PID: &str = "avion_all";

/// What kind of record an entity was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A single device.
    Device,
    /// A mesh group.
    Group,
    /// The synthetic entity covering every device.
    AllDevices,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::Group => f.write_str("group"),
            Self::AllDevices => f.write_str("all"),
        }
    }
}

/// A record selected to become a light entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Kind of source record.
    pub kind: EntityKind,
    /// Configuration-facing identifier, unique across entities.
    pub pid: String,
    /// Mesh address commands are sent to and status is matched against.
    pub avid: Avid,
    /// Product id used for capability lookups.
    pub product_id: u32,
    /// Display name.
    pub name: String,
}

impl EntityRecord {
    /// Builds the record for a device.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        Self {
            kind: EntityKind::Device,
            pid: device.pid.clone(),
            avid: device.avid.clone(),
            product_id: device.product_id,
            name: device.name.clone(),
        }
    }

    /// Builds the record for a group.
    #[must_use]
    pub fn from_group(group: &Group) -> Self {
        Self {
            kind: EntityKind::Group,
            pid: group.pid.clone(),
            avid: group.avid.clone(),
            product_id: GROUP_PRODUCT_ID,
            name: group.name.clone(),
        }
    }

    /// Builds the synthetic record addressed to the whole mesh.
    ///
    /// What the mesh does with the broadcast address is up to the transport.
    #[must_use]
    pub fn all_devices(name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::AllDevices,
            pid: ALL_DEVICES_PID.to_string(),
            avid: Avid::broadcast(),
            product_id: GROUP_PRODUCT_ID,
            name: name.into(),
        }
    }
}

/// Resolves the records that should become entities.
///
/// Groups are selected first, then devices, then the optional aggregate
/// entity. For each category a non-empty include list keeps only the listed
/// pids; otherwise every pid not in the exclude list is kept. When
/// `exclude_in_group` is set and groups are imported, members of the selected
/// groups are added to the device exclude list, which only matters when the
/// device include list is empty.
///
/// # Examples
///
/// ```
/// use avion_mesh::config::MeshConfig;
/// use avion_mesh::model::Location;
/// use avion_mesh::resolver::resolve_entities;
///
/// let location: Location = serde_json::from_value(serde_json::json!({
///     "passphrase": "p",
///     "devices": [
///         {"pid": "d1", "avid": 1, "product_id": 134, "name": "One"},
///         {"pid": "d2", "avid": 2, "product_id": 134, "name": "Two"},
///         {"pid": "d3", "avid": 3, "product_id": 134, "name": "Three"}
///     ],
///     "groups": [{"pid": "g1", "avid": 10, "name": "Both", "devices": ["d1", "d2"]}]
/// })).unwrap();
///
/// let records = resolve_entities(&MeshConfig::new("u", "p"), &location);
/// let pids: Vec<&str> = records.iter().map(|r| r.pid.as_str()).collect();
/// assert_eq!(pids, ["g1", "d3"]);
/// ```
#[must_use]
pub fn resolve_entities(config: &MeshConfig, location: &Location) -> Vec<EntityRecord> {
    let groups_filter = config.groups_filter();
    let mut devices_filter = config.devices_filter();

    let groups: Vec<&Group> = if groups_filter.import {
        location
            .groups
            .iter()
            .filter(|g| groups_filter.allows(&g.pid))
            .collect()
    } else {
        Vec::new()
    };

    if config.exclude_in_group && groups_filter.import {
        let mut exclude: HashSet<String> = devices_filter.exclude.drain(..).collect();
        exclude.extend(groups.iter().flat_map(|g| g.devices.iter().cloned()));
        devices_filter.exclude = exclude.into_iter().collect();
    }

    let mut records: Vec<EntityRecord> = groups.into_iter().map(EntityRecord::from_group).collect();

    if devices_filter.import {
        records.extend(
            location
                .devices
                .iter()
                .filter(|d| devices_filter.allows(&d.pid))
                .map(EntityRecord::from_device),
        );
    }

    if let Some(name) = config.all_devices_name() {
        records.push(EntityRecord::all_devices(name));
    }

    tracing::debug!(count = records.len(), "Resolved light entities");

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(pid: &str, avid: u32) -> Device {
        Device {
            pid: pid.to_string(),
            avid: Avid::from(avid),
            product_id: 134,
            name: pid.to_uppercase(),
            mac_address: None,
        }
    }

    fn group(pid: &str, avid: u32, members: &[&str]) -> Group {
        Group {
            pid: pid.to_string(),
            avid: Avid::from(avid),
            name: pid.to_uppercase(),
            devices: members.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    fn location() -> Location {
        Location {
            passphrase: "secret".to_string(),
            devices: vec![device("d1", 1), device("d2", 2), device("d3", 3)],
            groups: vec![group("g1", 10, &["d1", "d2"]), group("g2", 11, &["d3"])],
        }
    }

    fn pids(records: &[EntityRecord], kind: EntityKind) -> Vec<&str> {
        records
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.pid.as_str())
            .collect()
    }

    #[test]
    fn exclude_in_group_drops_members() {
        let loc = Location {
            groups: vec![group("g1", 10, &["d1", "d2"])],
            ..location()
        };
        let records = resolve_entities(&MeshConfig::new("u", "p"), &loc);

        assert_eq!(pids(&records, EntityKind::Device), ["d3"]);
        assert_eq!(pids(&records, EntityKind::Group), ["g1"]);
    }

    #[test]
    fn exclude_in_group_only_counts_selected_groups() {
        let config = MeshConfig::new("u", "p").with_groups_exclude("g2");
        let records = resolve_entities(&config, &location());

        assert_eq!(pids(&records, EntityKind::Group), ["g1"]);
        assert_eq!(pids(&records, EntityKind::Device), ["d3"]);
    }

    #[test]
    fn exclude_in_group_inactive_without_group_import() {
        let config = MeshConfig::new("u", "p").with_groups(false);
        let records = resolve_entities(&config, &location());

        assert!(pids(&records, EntityKind::Group).is_empty());
        assert_eq!(pids(&records, EntityKind::Device), ["d1", "d2", "d3"]);
    }

    #[test]
    fn exclude_in_group_disabled_keeps_members() {
        let config = MeshConfig::new("u", "p").with_exclude_in_group(false);
        let records = resolve_entities(&config, &location());

        assert_eq!(pids(&records, EntityKind::Device), ["d1", "d2", "d3"]);
    }

    #[test]
    fn device_include_wins_over_group_membership() {
        let config = MeshConfig::new("u", "p").with_devices_include("d1");
        let records = resolve_entities(&config, &location());

        assert_eq!(pids(&records, EntityKind::Device), ["d1"]);
    }

    #[test]
    fn include_ignores_exclude() {
        let config = MeshConfig::new("u", "p")
            .with_groups_include("g2")
            .with_groups_exclude("g2")
            .with_exclude_in_group(false);
        let records = resolve_entities(&config, &location());

        assert_eq!(pids(&records, EntityKind::Group), ["g2"]);
    }

    #[test]
    fn device_exclude_list_applies() {
        let config = MeshConfig::new("u", "p")
            .with_exclude_in_group(false)
            .with_devices_exclude("d2");
        let records = resolve_entities(&config, &location());

        assert_eq!(pids(&records, EntityKind::Device), ["d1", "d3"]);
    }

    #[test]
    fn device_import_disabled() {
        let config = MeshConfig::new("u", "p").with_devices(false);
        let records = resolve_entities(&config, &location());

        assert!(pids(&records, EntityKind::Device).is_empty());
        assert_eq!(pids(&records, EntityKind::Group), ["g1", "g2"]);
    }

    #[test]
    fn groups_come_before_devices() {
        let config = MeshConfig::new("u", "p").with_exclude_in_group(false);
        let records = resolve_entities(&config, &location());
        let kinds: Vec<EntityKind> = records.iter().map(|r| r.kind).collect();

        assert_eq!(
            kinds,
            [
                EntityKind::Group,
                EntityKind::Group,
                EntityKind::Device,
                EntityKind::Device,
                EntityKind::Device
            ]
        );
    }

    #[test]
    fn all_devices_entity_is_appended() {
        let config = MeshConfig::new("u", "p").with_all_devices("Whole House");
        let records = resolve_entities(&config, &location());
        let last = records.last().unwrap();

        assert_eq!(last.kind, EntityKind::AllDevices);
        assert_eq!(last.pid, ALL_DEVICES_PID);
        assert_eq!(last.avid, Avid::new("0"));
        assert_eq!(last.product_id, 0);
        assert_eq!(last.name, "Whole House");
    }

    #[test]
    fn group_records_use_group_product_id() {
        let record = EntityRecord::from_group(&group("g9", 99, &[]));
        assert_eq!(record.product_id, GROUP_PRODUCT_ID);
        assert_eq!(record.avid, Avid::new("99"));
    }
}
