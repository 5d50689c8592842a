// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color temperature type for tunable-white mesh lights.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// White color temperature in Kelvin.
///
/// Mesh lights take Kelvin directly; no mired conversion is involved.
/// Tunable-white products accept [`ColorTemp::WARMEST`] to
/// [`ColorTemp::COOLEST`]; other values are still representable because the
/// mesh may report them.
///
/// # Examples
///
/// ```
/// use avion_mesh::types::ColorTemp;
///
/// let ct = ColorTemp::new(3000).unwrap();
/// assert_eq!(ct.kelvin(), 3000);
/// assert!(ct.is_supported());
///
/// assert!(ColorTemp::new(0).is_err());
/// assert!(!ColorTemp::new(6500).unwrap().is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ColorTemp(u16);

impl ColorTemp {
    /// Lowest value accepted by [`ColorTemp::new`].
    pub const MIN: u16 = 1000;

    /// Highest value accepted by [`ColorTemp::new`].
    pub const MAX: u16 = 10_000;

    /// Warmest white supported by Avi-on tunable products.
    pub const WARMEST: Self = Self(2700);

    /// Coolest white supported by Avi-on tunable products.
    pub const COOLEST: Self = Self(5000);

    /// Creates a color temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `kelvin` is outside [1000, 10000].
    pub fn new(kelvin: u16) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&kelvin) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: kelvin,
            });
        }
        Ok(Self(kelvin))
    }

    /// Returns the value in Kelvin.
    #[must_use]
    pub const fn kelvin(&self) -> u16 {
        self.0
    }

    /// Returns `true` if tunable products can reproduce this temperature.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.0 >= Self::WARMEST.0 && self.0 <= Self::COOLEST.0
    }
}

impl fmt::Display for ColorTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K", self.0)
    }
}

impl TryFrom<u16> for ColorTemp {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColorTemp> for u16 {
    fn from(value: ColorTemp) -> Self {
        value.0
    }
}
