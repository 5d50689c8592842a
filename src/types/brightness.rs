// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for dimmable mesh lights.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness level on the mesh scale (0-255).
///
/// Zero means the light is off; 255 is full brightness and is the level used
/// when a light is turned on without an explicit brightness.
///
/// # Examples
///
/// ```
/// use avion_mesh::types::Brightness;
///
/// let half = Brightness::new(128);
/// assert_eq!(half.value(), 128);
/// assert!(half.is_on());
///
/// assert!(!Brightness::OFF.is_on());
/// assert_eq!(Brightness::FULL.value(), 255);
///
/// // Wider integers are checked
/// assert!(Brightness::try_from(300_u16).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct Brightness(u8);

impl Brightness {
    /// Light off.
    pub const OFF: Self = Self(0);

    /// Full brightness.
    pub const FULL: Self = Self(255);

    /// Creates a brightness level.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` if this level lights the lamp.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.0 > 0
    }

    /// Returns the level as a percentage, rounded to the nearest integer.
    #[must_use]
    pub fn as_percent(&self) -> u8 {
        // Safe: 255 * 100 / 255 = 100 fits in u8
        #[allow(clippy::cast_possible_truncation)]
        let percent = ((u16::from(self.0) * 100 + 127) / 255) as u8;
        percent
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl TryFrom<u16> for Brightness {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| ValueError::OutOfRange {
                min: 0,
                max: 255,
                actual: value,
            })
    }
}

impl From<Brightness> for u16 {
    fn from(value: Brightness) -> Self {
        u16::from(value.0)
    }
}
