// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands sent from light entities to the mesh transport.
//!
//! A [`MeshCommand`] targets one mesh address with exactly one
//! [`LightAction`]. The enum makes it impossible to build a command that
//! sets both a brightness and a color temperature.
//!
//! # Wire Format
//!
//! Transports that speak the vendor's JSON dialect can serialize a command
//! directly:
//!
//! ```
//! use avion_mesh::command::{LightAction, MeshCommand};
//! use avion_mesh::types::{Avid, Brightness};
//!
//! let cmd = MeshCommand::new(Avid::new("42"), LightAction::Brightness(Brightness::new(128)));
//! let wire = serde_json::to_value(&cmd).unwrap();
//!
//! assert_eq!(wire["avid"], "42");
//! assert_eq!(wire["command"], "update");
//! assert_eq!(wire["json"], r#"{"brightness":128}"#);
//! ```

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Avid, Brightness, ColorTemp};

/// Operation name used by every light command.
pub const UPDATE_OP: &str = "update";

/// The single change a command asks a light to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightAction {
    /// Switch on without changing level or color.
    On,
    /// Switch off.
    Off,
    /// Set brightness (also switches on when non-zero).
    Brightness(Brightness),
    /// Set color temperature (also switches on).
    ColorTemp(ColorTemp),
}

impl LightAction {
    /// Returns the JSON payload for this action.
    ///
    /// # Examples
    ///
    /// ```
    /// use avion_mesh::command::LightAction;
    ///
    /// assert_eq!(LightAction::Off.payload(), serde_json::json!({"state": "off"}));
    /// ```
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::On => serde_json::json!({ "state": "on" }),
            Self::Off => serde_json::json!({ "state": "off" }),
            Self::Brightness(b) => serde_json::json!({ "brightness": b.value() }),
            Self::ColorTemp(ct) => serde_json::json!({ "color_temp": ct.kelvin() }),
        }
    }
}

impl fmt::Display for LightAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Brightness(b) => write!(f, "brightness {b}"),
            Self::ColorTemp(ct) => write!(f, "color temp {ct}"),
        }
    }
}

impl Serialize for LightAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LightAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            state: Option<String>,
            brightness: Option<Brightness>,
            color_temp: Option<ColorTemp>,
        }

        let raw = Raw::deserialize(deserializer)?;
        match (raw.state.as_deref(), raw.brightness, raw.color_temp) {
            (Some("on"), None, None) => Ok(Self::On),
            (Some("off"), None, None) => Ok(Self::Off),
            (Some(other), None, None) => Err(D::Error::custom(format!(
                "invalid state {other:?}, expected \"on\" or \"off\""
            ))),
            (None, Some(b), None) => Ok(Self::Brightness(b)),
            (None, None, Some(ct)) => Ok(Self::ColorTemp(ct)),
            _ => Err(D::Error::custom(
                "payload must set exactly one of state, brightness, color_temp",
            )),
        }
    }
}

/// A command addressed to one mesh target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshCommand {
    /// Target mesh address.
    pub avid: Avid,
    /// Requested change.
    pub action: LightAction,
}

impl MeshCommand {
    /// Creates a command.
    #[must_use]
    pub fn new(avid: Avid, action: LightAction) -> Self {
        Self { avid, action }
    }

    /// Creates a command switching the target on.
    #[must_use]
    pub fn on(avid: Avid) -> Self {
        Self::new(avid, LightAction::On)
    }

    /// Creates a command switching the target off.
    #[must_use]
    pub fn off(avid: Avid) -> Self {
        Self::new(avid, LightAction::Off)
    }

    /// Creates a brightness command.
    #[must_use]
    pub fn brightness(avid: Avid, brightness: Brightness) -> Self {
        Self::new(avid, LightAction::Brightness(brightness))
    }

    /// Creates a color temperature command.
    #[must_use]
    pub fn color_temp(avid: Avid, color_temp: ColorTemp) -> Self {
        Self::new(avid, LightAction::ColorTemp(color_temp))
    }

    /// Returns the operation name (always `"update"`).
    #[must_use]
    pub fn op(&self) -> &'static str {
        UPDATE_OP
    }

    /// Returns the JSON payload of the action.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        self.action.payload()
    }
}

impl fmt::Display for MeshCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.action, self.avid)
    }
}

impl Serialize for MeshCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MeshCommand", 3)?;
        state.serialize_field("avid", &self.avid)?;
        state.serialize_field("command", UPDATE_OP)?;
        state.serialize_field("json", &self.payload().to_string())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for MeshCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            avid: Avid,
            command: String,
            json: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        if raw.command != UPDATE_OP {
            return Err(D::Error::custom(format!(
                "unsupported command {:?}",
                raw.command
            )));
        }
        let action = serde_json::from_str(&raw.json).map_err(D::Error::custom)?;
        Ok(Self {
            avid: raw.avid,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_set_exactly_one_field() {
        let actions = [
            LightAction::On,
            LightAction::Off,
            LightAction::Brightness(Brightness::new(10)),
            LightAction::ColorTemp(ColorTemp::new(3000).unwrap()),
        ];
        for action in actions {
            let payload = action.payload();
            assert_eq!(payload.as_object().unwrap().len(), 1, "{action}");
        }
    }

    #[test]
    fn color_temp_payload() {
        let cmd = MeshCommand::color_temp(Avid::new("7"), ColorTemp::new(3000).unwrap());
        assert_eq!(cmd.payload(), serde_json::json!({"color_temp": 3000}));
        assert_eq!(cmd.op(), "update");
    }

    #[test]
    fn serializes_to_vendor_wire_format() {
        let cmd = MeshCommand::off(Avid::new("12"));
        let wire = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "avid": "12",
                "command": "update",
                "json": "{\"state\":\"off\"}"
            })
        );
    }

    #[test]
    fn parses_vendor_wire_format() {
        let cmd: MeshCommand = serde_json::from_value(serde_json::json!({
            "avid": 12,
            "command": "update",
            "json": "{\"brightness\": 200}"
        }))
        .unwrap();
        assert_eq!(cmd, MeshCommand::brightness(Avid::new("12"), Brightness::new(200)));
    }

    #[test]
    fn rejects_payload_with_two_fields() {
        let result = serde_json::from_str::<LightAction>(r#"{"brightness": 10, "color_temp": 3000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_state() {
        let result = serde_json::from_str::<LightAction>(r#"{"state": "dim"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_other_operations() {
        let result = serde_json::from_value::<MeshCommand>(serde_json::json!({
            "avid": "1",
            "command": "read",
            "json": "{\"state\":\"on\"}"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn display() {
        let cmd = MeshCommand::brightness(Avid::new("3"), Brightness::new(64));
        assert_eq!(cmd.to_string(), "brightness 64 -> 3");
    }
}
