// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration configuration.
//!
//! [`MeshConfig`] mirrors the flat key/value data a host stores for one mesh
//! connection. List-valued settings are kept as the comma-separated strings
//! the host collected and are parsed on demand.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default name of the aggregate entity covering every device.
pub const DEFAULT_ALL_NAME: &str = "All Avi-on Devices";

/// Configuration for one mesh connection.
///
/// Missing keys fall back to the same defaults the setup form offers:
/// devices and groups are imported, devices already in an imported group are
/// skipped, and no aggregate entity is created.
///
/// # Examples
///
/// ```
/// use avion_mesh::config::MeshConfig;
///
/// let config = MeshConfig::from_json(r#"{
///     "username": "me@example.com",
///     "password": "hunter2",
///     "devices_exclude": "d1, d2",
///     "cap_dimming": "500"
/// }"#).unwrap();
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.devices_filter().exclude, vec!["d1", "d2"]);
/// assert_eq!(config.capability_overrides().unwrap().dimming, vec![500]);
///
/// // Programmatic construction
/// let config = MeshConfig::new("me@example.com", "hunter2")
///     .with_groups(false)
///     .with_all_devices("Everything");
/// assert_eq!(config.all_devices_name(), Some("Everything"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Cloud account username (e-mail).
    pub username: String,
    /// Cloud account password.
    pub password: String,
    /// Whether devices become entities.
    pub import_devices: bool,
    /// Whether groups become entities.
    pub import_groups: bool,
    /// Skip devices that are members of an imported group.
    pub exclude_in_group: bool,
    /// Comma-separated device pids to include.
    pub devices_include: String,
    /// Comma-separated device pids to exclude.
    pub devices_exclude: String,
    /// Comma-separated group pids to include.
    pub groups_include: String,
    /// Comma-separated group pids to exclude.
    pub groups_exclude: String,
    /// Whether to create the aggregate "all devices" entity.
    pub all_import: bool,
    /// Name of the aggregate entity.
    pub all_name: String,
    /// Comma-separated product ids to add to the dimming capability.
    pub cap_dimming: String,
    /// Comma-separated product ids to add to the color temperature capability.
    pub cap_color_temp: String,
    /// Seconds to wait for each background task during shutdown.
    pub shutdown_timeout_secs: u64,
    /// Overrides the cloud API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            import_devices: true,
            import_groups: true,
            exclude_in_group: true,
            devices_include: String::new(),
            devices_exclude: String::new(),
            groups_include: String::new(),
            groups_exclude: String::new(),
            all_import: false,
            all_name: DEFAULT_ALL_NAME.to_string(),
            cap_dimming: String::new(),
            cap_color_temp: String::new(),
            shutdown_timeout_secs: 10,
            api_base_url: None,
        }
    }
}

impl fmt::Debug for MeshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("import_devices", &self.import_devices)
            .field("import_groups", &self.import_groups)
            .field("exclude_in_group", &self.exclude_in_group)
            .field("devices_include", &self.devices_include)
            .field("devices_exclude", &self.devices_exclude)
            .field("groups_include", &self.groups_include)
            .field("groups_exclude", &self.groups_exclude)
            .field("all_import", &self.all_import)
            .field("all_name", &self.all_name)
            .field("cap_dimming", &self.cap_dimming)
            .field("cap_color_temp", &self.cap_color_temp)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl MeshConfig {
    /// Creates a configuration with credentials and default settings.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from the host's JSON entry data.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Enables or disables device import.
    #[must_use]
    pub fn with_devices(mut self, import: bool) -> Self {
        self.import_devices = import;
        self
    }

    /// Enables or disables group import.
    #[must_use]
    pub fn with_groups(mut self, import: bool) -> Self {
        self.import_groups = import;
        self
    }

    /// Sets whether devices already in an imported group are skipped.
    #[must_use]
    pub fn with_exclude_in_group(mut self, exclude: bool) -> Self {
        self.exclude_in_group = exclude;
        self
    }

    /// Sets the device include list.
    #[must_use]
    pub fn with_devices_include(mut self, pids: impl Into<String>) -> Self {
        self.devices_include = pids.into();
        self
    }

    /// Sets the device exclude list.
    #[must_use]
    pub fn with_devices_exclude(mut self, pids: impl Into<String>) -> Self {
        self.devices_exclude = pids.into();
        self
    }

    /// Sets the group include list.
    #[must_use]
    pub fn with_groups_include(mut self, pids: impl Into<String>) -> Self {
        self.groups_include = pids.into();
        self
    }

    /// Sets the group exclude list.
    #[must_use]
    pub fn with_groups_exclude(mut self, pids: impl Into<String>) -> Self {
        self.groups_exclude = pids.into();
        self
    }

    /// Enables the aggregate entity with the given name.
    #[must_use]
    pub fn with_all_devices(mut self, name: impl Into<String>) -> Self {
        self.all_import = true;
        self.all_name = name.into();
        self
    }

    /// Sets the dimming capability override list.
    #[must_use]
    pub fn with_dimming_override(mut self, product_ids: impl Into<String>) -> Self {
        self.cap_dimming = product_ids.into();
        self
    }

    /// Sets the color temperature capability override list.
    #[must_use]
    pub fn with_color_temp_override(mut self, product_ids: impl Into<String>) -> Self {
        self.cap_color_temp = product_ids.into();
        self
    }

    /// Sets the per-task shutdown timeout, in whole seconds.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the cloud API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Checks that the configuration can be used to start a service.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingUsername` or `ConfigError::MissingPassword`
    /// when credentials are blank, and `ConfigError::InvalidProductId` when a
    /// capability override is not a number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        self.capability_overrides()?;
        Ok(())
    }

    /// Returns the device selection rules.
    #[must_use]
    pub fn devices_filter(&self) -> CategoryFilter {
        CategoryFilter {
            import: self.import_devices,
            include: split_list(&self.devices_include),
            exclude: split_list(&self.devices_exclude),
        }
    }

    /// Returns the group selection rules.
    #[must_use]
    pub fn groups_filter(&self) -> CategoryFilter {
        CategoryFilter {
            import: self.import_groups,
            include: split_list(&self.groups_include),
            exclude: split_list(&self.groups_exclude),
        }
    }

    /// Returns the aggregate entity name if one was requested.
    #[must_use]
    pub fn all_devices_name(&self) -> Option<&str> {
        self.all_import.then_some(self.all_name.as_str())
    }

    /// Parses the capability override lists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidProductId` for the first entry that is
    /// not an unsigned integer.
    pub fn capability_overrides(&self) -> Result<CapabilityOverrides, ConfigError> {
        Ok(CapabilityOverrides {
            dimming: parse_product_ids(&self.cap_dimming)?,
            color_temp: parse_product_ids(&self.cap_color_temp)?,
        })
    }

    /// Returns the per-task shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Selection rules for one category of records (devices or groups).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Whether the category is imported at all.
    pub import: bool,
    /// Pids to keep; when non-empty, `exclude` is ignored.
    pub include: Vec<String>,
    /// Pids to drop.
    pub exclude: Vec<String>,
}

impl CategoryFilter {
    /// Returns `true` if a record with this pid should become an entity.
    ///
    /// A non-empty include list wins outright over the exclude list.
    #[must_use]
    pub fn allows(&self, pid: &str) -> bool {
        if self.include.is_empty() {
            !self.exclude.iter().any(|p| p == pid)
        } else {
            self.include.iter().any(|p| p == pid)
        }
    }
}

/// Product ids to add to each capability on top of the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityOverrides {
    /// Extra dimmable products.
    pub dimming: Vec<u32>,
    /// Extra color temperature products.
    pub color_temp: Vec<u32>,
}

impl CapabilityOverrides {
    /// Returns `true` when no override is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimming.is_empty() && self.color_temp.is_empty()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_product_ids(raw: &str) -> Result<Vec<u32>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::InvalidProductId { value: s })
        })
        .collect()
}
