// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Product capability registry.
//!
//! Mesh devices do not advertise what they can do; instead, features are
//! gated by the vendor product id. This module maps each [`Capability`] to
//! the set of product ids that support it.
//!
//! # Construction
//!
//! A registry is assembled with [`CapabilityRegistryBuilder`], seeded with
//! the built-in product table and extended with user overrides, then frozen
//! by [`CapabilityRegistryBuilder::build`]. The built [`CapabilityRegistry`]
//! has no mutation API, so every controller reading it sees the same table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CapabilityOverrides;

/// A feature gated by product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Brightness control.
    Dimming,
    /// Color temperature (tunable white) control.
    ColorTemp,
}

impl Capability {
    /// All known capabilities.
    pub const ALL: [Self; 2] = [Self::Dimming, Self::ColorTemp];

    /// Returns the configuration name of this capability.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dimming => "dimming",
            Self::ColorTemp => "color_temp",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in product table: (product id, name, dimming, color temperature).
const PRODUCTS: &[(u32, &str, bool, bool)] = &[
    (0, "Group", true, true),
    (90, "Lamp Dimmer", true, false),
    (93, "Recessed Downlight (RL)", true, true),
    (94, "Light Adapter", true, false),
    (97, "Smart Dimmer", true, false),
    (134, "Smart Bulb (A19)", true, true),
    (137, "Surface Downlight (BLD)", true, true),
    (162, "MicroEdge (HLB)", true, true),
    (167, "Smart Switch", false, false),
];

/// Returns the marketing name of a known product id.
///
/// # Examples
///
/// ```
/// use avion_mesh::capabilities::product_name;
///
/// assert_eq!(product_name(134), Some("Smart Bulb (A19)"));
/// assert_eq!(product_name(9999), None);
/// ```
#[must_use]
pub fn product_name(product_id: u32) -> Option<&'static str> {
    PRODUCTS
        .iter()
        .find(|(id, ..)| *id == product_id)
        .map(|(_, name, ..)| *name)
}

/// Frozen mapping from capability to supporting product ids.
///
/// A product id may appear in no set (plain on/off) or in several. Nothing
/// enforces that color-temperature products are also dimmable.
///
/// # Examples
///
/// ```
/// use avion_mesh::capabilities::{Capability, CapabilityRegistry};
///
/// let registry = CapabilityRegistry::builder()
///     .with_defaults()
///     .add(Capability::Dimming, [500])
///     .build();
///
/// assert!(registry.supports(500, Capability::Dimming));
/// assert!(!registry.supports(500, Capability::ColorTemp));
/// assert!(registry.supports(134, Capability::ColorTemp));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRegistry {
    table: BTreeMap<Capability, BTreeSet<u32>>,
}

impl CapabilityRegistry {
    /// Creates a builder with an empty table.
    #[must_use]
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder::new()
    }

    /// Returns the registry built from the built-in product table only.
    #[must_use]
    pub fn defaults() -> Self {
        CapabilityRegistryBuilder::new().with_defaults().build()
    }

    /// Returns `true` if `product_id` supports `capability`.
    #[must_use]
    pub fn supports(&self, product_id: u32, capability: Capability) -> bool {
        self.table
            .get(&capability)
            .is_some_and(|ids| ids.contains(&product_id))
    }

    /// Returns whether the product supports brightness control.
    #[must_use]
    pub fn supports_dimming(&self, product_id: u32) -> bool {
        self.supports(product_id, Capability::Dimming)
    }

    /// Returns whether the product supports color temperature control.
    #[must_use]
    pub fn supports_color_temp(&self, product_id: u32) -> bool {
        self.supports(product_id, Capability::ColorTemp)
    }

    /// Returns the product ids registered for a capability, in ascending order.
    pub fn product_ids(&self, capability: Capability) -> impl Iterator<Item = u32> + '_ {
        self.table
            .get(&capability)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }
}

/// Builder for a [`CapabilityRegistry`].
///
/// Overrides are additive only: there is no way to remove a product id from
/// a capability.
#[derive(Debug, Default)]
pub struct CapabilityRegistryBuilder {
    inner: CapabilityRegistry,
}

impl CapabilityRegistryBuilder {
    /// Creates a builder with an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the table with the built-in product list.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        for &(id, _, dimming, color_temp) in PRODUCTS {
            if dimming {
                self = self.add(Capability::Dimming, [id]);
            }
            if color_temp {
                self = self.add(Capability::ColorTemp, [id]);
            }
        }
        self
    }

    /// Adds product ids to a capability.
    #[must_use]
    pub fn add(mut self, capability: Capability, ids: impl IntoIterator<Item = u32>) -> Self {
        self.inner.table.entry(capability).or_default().extend(ids);
        self
    }

    /// Applies the configured per-capability override lists.
    #[must_use]
    pub fn with_overrides(self, overrides: &CapabilityOverrides) -> Self {
        self.add(Capability::Dimming, overrides.dimming.iter().copied())
            .add(Capability::ColorTemp, overrides.color_temp.iter().copied())
    }

    /// Freezes the table.
    #[must_use]
    pub fn build(self) -> CapabilityRegistry {
        self.inner
    }
}
