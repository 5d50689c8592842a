// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for mesh light control.
//!
//! Each type ensures its value is within the valid range at construction
//! time, so commands built from them never carry out-of-range values.
//!
//! # Types
//!
//! - [`Avid`] - Mesh address of a device or group
//! - [`Brightness`] - Brightness level (0-255)
//! - [`ColorTemp`] - Color temperature in Kelvin

mod avid;
mod brightness;
mod color_temp;

pub use avid::Avid;
pub use brightness::Brightness;
pub use color_temp::ColorTemp;
