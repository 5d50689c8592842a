// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status reports received from the mesh.
//!
//! The transport emits loosely shaped maps such as
//! `{"avid": 42, "brightness": 128}`. They are normalized into a
//! [`MeshStatus`] carrying exactly one [`StatusReport`]: a report that names
//! neither brightness nor color temperature becomes
//! [`StatusReport::NoChange`], and a report naming both keeps the brightness.
//! A color temperature outside the [`ColorTemp`] range is treated as
//! [`StatusReport::NoChange`] rather than rejecting the message.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Avid, Brightness, ColorTemp};

/// What a status message says about a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusReport {
    /// Nothing the light state cares about.
    NoChange,
    /// Current brightness; zero means off.
    Brightness(Brightness),
    /// Current color temperature; implies the light is on.
    ColorTemp(ColorTemp),
}

/// A status message for one mesh address.
///
/// # Examples
///
/// ```
/// use avion_mesh::status::{MeshStatus, StatusReport};
/// use avion_mesh::types::Brightness;
///
/// let status: MeshStatus = serde_json::from_str(r#"{"avid": 42, "brightness": 128}"#).unwrap();
/// assert_eq!(status.avid.as_str(), "42");
/// assert_eq!(status.report, StatusReport::Brightness(Brightness::new(128)));
///
/// let status: MeshStatus = serde_json::from_str(r#"{"avid": 42, "rssi": -60}"#).unwrap();
/// assert_eq!(status.report, StatusReport::NoChange);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshStatus {
    /// Mesh address the report is about.
    pub avid: Avid,
    /// The reported change.
    pub report: StatusReport,
}

impl MeshStatus {
    /// Creates a status message.
    #[must_use]
    pub fn new(avid: Avid, report: StatusReport) -> Self {
        Self { avid, report }
    }

    /// Creates a brightness report.
    #[must_use]
    pub fn brightness(avid: Avid, brightness: Brightness) -> Self {
        Self::new(avid, StatusReport::Brightness(brightness))
    }

    /// Creates a color temperature report.
    #[must_use]
    pub fn color_temp(avid: Avid, color_temp: ColorTemp) -> Self {
        Self::new(avid, StatusReport::ColorTemp(color_temp))
    }

    /// Creates a report that carries no light state.
    #[must_use]
    pub fn no_change(avid: Avid) -> Self {
        Self::new(avid, StatusReport::NoChange)
    }

    /// Returns `true` if this report is about the given address.
    #[must_use]
    pub fn concerns(&self, avid: &Avid) -> bool {
        &self.avid == avid
    }
}

#[derive(Serialize, Deserialize)]
struct RawStatus {
    avid: Avid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brightness: Option<Brightness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color_temp: Option<i64>,
}

impl<'de> Deserialize<'de> for MeshStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStatus::deserialize(deserializer)?;
        let report = match (raw.brightness, raw.color_temp) {
            (Some(b), _) => StatusReport::Brightness(b),
            (None, Some(kelvin)) => match u16::try_from(kelvin).ok().map(ColorTemp::new) {
                Some(Ok(ct)) => StatusReport::ColorTemp(ct),
                _ => {
                    tracing::debug!(avid = %raw.avid, kelvin, "Ignoring out-of-range color temperature");
                    StatusReport::NoChange
                }
            },
            (None, None) => StatusReport::NoChange,
        };
        Ok(Self {
            avid: raw.avid,
            report,
        })
    }
}

impl Serialize for MeshStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (brightness, color_temp) = match self.report {
            StatusReport::NoChange => (None, None),
            StatusReport::Brightness(b) => (Some(b), None),
            StatusReport::ColorTemp(ct) => (None, Some(i64::from(ct.kelvin()))),
        };
        RawStatus {
            avid: self.avid.clone(),
            brightness,
            color_temp,
        }
        .serialize(serializer)
    }
}
