// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light entities.
//!
//! - [`LightController`] - Sends commands for one entity and follows its status
//! - [`LightState`] - Last known on/off, brightness and color temperature
//! - [`ColorMode`] - How the light is currently driven

mod controller;
mod light_state;

pub use controller::{EntityInfo, LightController, MANUFACTURER, TurnOnRequest};
pub use light_state::{ColorMode, LightState};
