// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light state tracking.
//!
//! A [`LightState`] changes in exactly two ways: a status report arrives from
//! the mesh ([`LightState::apply_report`]) or a command is sent and its
//! effect is assumed ([`LightState::apply_action`]). Both return `true` when
//! the state actually changed.
//!
//! # Examples
//!
//! ```
//! use avion_mesh::light::{ColorMode, LightState};
//! use avion_mesh::status::StatusReport;
//! use avion_mesh::types::Brightness;
//!
//! let mut state = LightState::new();
//! assert!(state.apply_report(&StatusReport::Brightness(Brightness::new(128)), true));
//! assert!(state.is_on);
//! assert_eq!(state.color_mode, ColorMode::Brightness);
//!
//! // Applying the same report again changes nothing
//! assert!(!state.apply_report(&StatusReport::Brightness(Brightness::new(128)), true));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::LightAction;
use crate::status::StatusReport;
use crate::types::{Brightness, ColorTemp};

/// How the light is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Initial mode, before anything was reported.
    #[default]
    Off,
    /// On/off only.
    #[serde(rename = "onoff")]
    OnOff,
    /// Brightness only.
    Brightness,
    /// Tunable white.
    ColorTemp,
}

impl ColorMode {
    /// Returns the mode name as hosts usually spell it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::OnOff => "onoff",
            Self::Brightness => "brightness",
            Self::ColorTemp => "color_temp",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known state of one light entity.
///
/// The state starts off, in [`ColorMode::Off`], and is only as accurate as the
/// most recent report or command, whichever came last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightState {
    /// Whether the light is lit.
    pub is_on: bool,
    /// Last known brightness.
    pub brightness: Brightness,
    /// Last known color temperature, if any was ever seen.
    pub color_temp_kelvin: Option<ColorTemp>,
    /// Current color mode.
    pub color_mode: ColorMode,
}

impl LightState {
    /// Creates the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a status report from the mesh.
    ///
    /// `dimmable` selects between [`ColorMode::Brightness`] and
    /// [`ColorMode::OnOff`] for a non-zero brightness report. A zero
    /// brightness always means off in on/off mode.
    pub fn apply_report(&mut self, report: &StatusReport, dimmable: bool) -> bool {
        let before = *self;
        match *report {
            StatusReport::NoChange => {}
            StatusReport::Brightness(brightness) => self.set_brightness(brightness, dimmable),
            StatusReport::ColorTemp(color_temp) => self.set_color_temp(color_temp),
        }
        *self != before
    }

    /// Applies the assumed effect of a command that was just sent.
    pub fn apply_action(&mut self, action: &LightAction, dimmable: bool) -> bool {
        let before = *self;
        match *action {
            LightAction::On => {
                self.is_on = true;
                self.color_mode = ColorMode::OnOff;
            }
            LightAction::Off => {
                self.is_on = false;
                self.brightness = Brightness::OFF;
                self.color_mode = ColorMode::OnOff;
            }
            LightAction::Brightness(brightness) => self.set_brightness(brightness, dimmable),
            LightAction::ColorTemp(color_temp) => self.set_color_temp(color_temp),
        }
        *self != before
    }

    fn set_brightness(&mut self, brightness: Brightness, dimmable: bool) {
        self.brightness = brightness;
        self.is_on = brightness.is_on();
        self.color_mode = if dimmable && brightness.is_on() {
            ColorMode::Brightness
        } else {
            ColorMode::OnOff
        };
    }

    fn set_color_temp(&mut self, color_temp: ColorTemp) {
        self.color_temp_kelvin = Some(color_temp);
        self.is_on = true;
        self.color_mode = ColorMode::ColorTemp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kelvin(k: u16) -> ColorTemp {
        ColorTemp::new(k).unwrap()
    }

    #[test]
    fn initial_state_is_off() {
        let state = LightState::new();
        assert!(!state.is_on);
        assert_eq!(state.brightness, Brightness::OFF);
        assert_eq!(state.color_temp_kelvin, None);
        assert_eq!(state.color_mode, ColorMode::Off);
    }

    #[test]
    fn zero_brightness_turns_off_even_when_dimmable() {
        let mut state = LightState::new();
        state.apply_report(&StatusReport::Brightness(Brightness::new(200)), true);
        assert!(state.apply_report(&StatusReport::Brightness(Brightness::OFF), true));

        assert!(!state.is_on);
        assert_eq!(state.color_mode, ColorMode::OnOff);
    }

    #[test]
    fn brightness_on_non_dimmable_is_onoff() {
        let mut state = LightState::new();
        state.apply_report(&StatusReport::Brightness(Brightness::new(200)), false);

        assert!(state.is_on);
        assert_eq!(state.brightness.value(), 200);
        assert_eq!(state.color_mode, ColorMode::OnOff);
    }

    #[test]
    fn color_temp_report_turns_on() {
        let mut state = LightState::new();
        assert!(state.apply_report(&StatusReport::ColorTemp(kelvin(3000)), true));

        assert!(state.is_on);
        assert_eq!(state.color_temp_kelvin, Some(kelvin(3000)));
        assert_eq!(state.color_mode, ColorMode::ColorTemp);
    }

    #[test]
    fn brightness_report_keeps_last_color_temp() {
        let mut state = LightState::new();
        state.apply_report(&StatusReport::ColorTemp(kelvin(4000)), true);
        state.apply_report(&StatusReport::Brightness(Brightness::new(50)), true);

        assert_eq!(state.color_temp_kelvin, Some(kelvin(4000)));
        assert_eq!(state.color_mode, ColorMode::Brightness);
    }

    #[test]
    fn no_change_report_is_noop() {
        let mut state = LightState::new();
        state.apply_report(&StatusReport::Brightness(Brightness::new(10)), true);
        let before = state;

        assert!(!state.apply_report(&StatusReport::NoChange, true));
        assert_eq!(state, before);
    }

    #[test]
    fn off_action_clears_brightness() {
        let mut state = LightState::new();
        state.apply_action(&LightAction::Brightness(Brightness::new(90)), true);
        assert!(state.apply_action(&LightAction::Off, true));

        assert!(!state.is_on);
        assert_eq!(state.brightness, Brightness::OFF);
        assert_eq!(state.color_mode, ColorMode::OnOff);
    }

    #[test]
    fn on_action_keeps_brightness() {
        let mut state = LightState::new();
        state.apply_report(&StatusReport::Brightness(Brightness::new(90)), false);
        state.apply_action(&LightAction::Off, false);
        state.apply_action(&LightAction::On, false);

        assert!(state.is_on);
        assert_eq!(state.color_mode, ColorMode::OnOff);
    }

    #[test]
    fn color_mode_names() {
        assert_eq!(ColorMode::OnOff.to_string(), "onoff");
        assert_eq!(ColorMode::ColorTemp.as_str(), "color_temp");
        assert_eq!(
            serde_json::to_string(&ColorMode::OnOff).unwrap(),
            "\"onoff\""
        );
    }
}
