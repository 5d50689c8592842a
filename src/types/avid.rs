// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh address type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mesh address of a device or group.
///
/// The avid is the stable identifier used to correlate outgoing commands and
/// incoming status reports with a physical device. The cloud reports it as a
/// number while some transports use strings, so both forms deserialize to
/// the same value.
///
/// # Examples
///
/// ```
/// use avion_mesh::types::Avid;
///
/// let a = Avid::new("32781");
/// let b = Avid::from(32781_u32);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "32781");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Avid(String);

impl Avid {
    /// Address that targets every device on the mesh.
    pub const BROADCAST: &'static str = "0";

    /// Creates a mesh address from its string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the address that targets the whole mesh.
    #[must_use]
    pub fn broadcast() -> Self {
        Self(Self::BROADCAST.to_string())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the whole-mesh address.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST
    }
}

impl fmt::Debug for Avid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Avid({})", self.0)
    }
}

impl fmt::Display for Avid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Avid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Avid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for Avid {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for Avid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Avid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_string_and_number() {
        let from_str: Avid = serde_json::from_str(r#""1234""#).unwrap();
        let from_num: Avid = serde_json::from_str("1234").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Avid::from(42_u32)).unwrap();
        assert_eq!(json, r#""42""#);
    }

    #[test]
    fn broadcast_address() {
        assert!(Avid::broadcast().is_broadcast());
        assert!(!Avid::new("17").is_broadcast());
    }

    #[test]
    fn display_and_debug() {
        let avid = Avid::new("99");
        assert_eq!(avid.to_string(), "99");
        assert_eq!(format!("{avid:?}"), "Avid(99)");
    }
}
