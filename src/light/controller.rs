// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-entity light controller.

use std::sync::Arc;

use tokio::sync::watch;

use super::light_state::{ColorMode, LightState};
use crate::capabilities::{CapabilityRegistry, product_name};
use crate::command::{LightAction, MeshCommand};
use crate::dispatcher::{StatusDispatcher, Subscription};
use crate::error::Result;
use crate::resolver::EntityRecord;
use crate::service::CommandSender;
use crate::status::{MeshStatus, StatusReport};
use crate::types::{Avid, Brightness, ColorTemp};

/// Manufacturer reported for every entity.
pub const MANUFACTURER: &str = "Avi-on";

/// Parameters of a turn-on request.
///
/// Fields a product cannot honor are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnOnRequest {
    /// Requested brightness; full brightness when absent.
    pub brightness: Option<Brightness>,
    /// Requested color temperature.
    pub color_temp: Option<ColorTemp>,
}

impl TurnOnRequest {
    /// Creates a request with no parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the requested color temperature.
    #[must_use]
    pub fn with_color_temp(mut self, color_temp: ColorTemp) -> Self {
        self.color_temp = Some(color_temp);
        self
    }
}

/// Descriptive metadata a host shows for an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    /// Stable identifier (the entity pid).
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Always [`MANUFACTURER`].
    pub manufacturer: &'static str,
    /// Product name, or `Unknown (<id>)` for products not in the table.
    pub model: String,
    /// Serial number shown to the host (the entity pid).
    pub serial_number: String,
}

/// Controls one light entity and tracks its state.
///
/// The controller reacts to mesh status reports addressed to its avid and
/// sends commands on behalf of the host. Sent commands update the state
/// optimistically; whichever of a report or a command comes last wins.
///
/// Hosts observe state through [`watch`](Self::watch).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use avion_mesh::capabilities::CapabilityRegistry;
/// use avion_mesh::config::MeshConfig;
/// use avion_mesh::light::{ColorMode, LightController};
/// use avion_mesh::model::Device;
/// use avion_mesh::resolver::EntityRecord;
/// use avion_mesh::service::MeshService;
/// use avion_mesh::status::MeshStatus;
/// use avion_mesh::types::{Avid, Brightness};
///
/// let service = MeshService::new(MeshConfig::new("u", "p")).unwrap();
/// let device = Device {
///     pid: "d1".into(),
///     avid: Avid::new("11"),
///     product_id: 134,
///     name: "Kitchen".into(),
///     mac_address: None,
/// };
///
/// let light = Arc::new(LightController::new(
///     EntityRecord::from_device(&device),
///     Arc::clone(service.capabilities()),
///     service.command_sender(),
/// ));
/// let _subscription = light.subscribe_to(service.dispatcher());
///
/// service.dispatcher().dispatch(&MeshStatus::brightness(Avid::new("11"), Brightness::new(128)));
/// assert!(light.is_on());
/// assert_eq!(light.brightness(), Some(Brightness::new(128)));
/// assert_eq!(light.color_mode(), ColorMode::Brightness);
/// ```
#[derive(Debug)]
pub struct LightController {
    entity: EntityRecord,
    capabilities: Arc<CapabilityRegistry>,
    commands: CommandSender,
    state: watch::Sender<LightState>,
}

impl LightController {
    /// Creates a controller for an entity.
    #[must_use]
    pub fn new(
        entity: EntityRecord,
        capabilities: Arc<CapabilityRegistry>,
        commands: CommandSender,
    ) -> Self {
        let (state, _) = watch::channel(LightState::new());
        Self {
            entity,
            capabilities,
            commands,
            state,
        }
    }

    /// Registers this controller with a dispatcher.
    ///
    /// The controller stays registered until the returned handle is dropped.
    #[must_use = "dropping the subscription unregisters the controller"]
    pub fn subscribe_to(self: &Arc<Self>, dispatcher: &StatusDispatcher) -> Subscription {
        let controller = Arc::clone(self);
        dispatcher.subscribe(move |status| {
            controller.handle_status(status);
        })
    }

    /// Applies a status report if it concerns this entity.
    ///
    /// Returns `true` if the report was addressed here and changed the state.
    pub fn handle_status(&self, status: &MeshStatus) -> bool {
        if !status.concerns(&self.entity.avid) || status.report == StatusReport::NoChange {
            return false;
        }

        let dimmable = self.is_dimmable();
        let mut changed = false;
        self.state.send_modify(|state| {
            changed = state.apply_report(&status.report, dimmable);
        });
        tracing::trace!(pid = %self.entity.pid, report = ?status.report, changed, "Applied status report");
        changed
    }

    /// Turns the light on.
    ///
    /// Exactly one command is sent, picked by what the product supports:
    /// color temperature if requested and supported, else brightness
    /// (default full) if dimmable, else plain on. A requested color
    /// temperature is sent as is; hosts read the limits from
    /// [`color_temp_range`](Self::color_temp_range).
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the service no longer accepts
    /// commands. The state is left untouched in that case.
    pub fn turn_on(&self, request: TurnOnRequest) -> Result<()> {
        let action = match request.color_temp {
            Some(color_temp) if self.supports_color_temp() => LightAction::ColorTemp(color_temp),
            _ if self.is_dimmable() => {
                LightAction::Brightness(request.brightness.unwrap_or(Brightness::FULL))
            }
            _ => LightAction::On,
        };
        self.send(action)
    }

    /// Turns the light off.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the service no longer accepts
    /// commands.
    pub fn turn_off(&self) -> Result<()> {
        self.send(LightAction::Off)
    }

    fn send(&self, action: LightAction) -> Result<()> {
        self.commands
            .send(MeshCommand::new(self.entity.avid.clone(), action))?;

        let dimmable = self.is_dimmable();
        self.state.send_modify(|state| {
            state.apply_action(&action, dimmable);
        });
        Ok(())
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> LightState {
        *self.state.borrow()
    }

    /// Returns a receiver notified on every state update.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LightState> {
        self.state.subscribe()
    }

    /// Returns `true` if the light is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.borrow().is_on
    }

    /// Returns the brightness, for dimmable products only.
    #[must_use]
    pub fn brightness(&self) -> Option<Brightness> {
        self.is_dimmable().then(|| self.state.borrow().brightness)
    }

    /// Returns the color temperature, for tunable products with a known value.
    #[must_use]
    pub fn color_temp_kelvin(&self) -> Option<ColorTemp> {
        if self.supports_color_temp() {
            self.state.borrow().color_temp_kelvin
        } else {
            None
        }
    }

    /// Returns the current color mode.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        self.state.borrow().color_mode
    }

    /// Returns the color modes this product can be driven in.
    ///
    /// Exactly one mode is reported: the richest one the product supports.
    #[must_use]
    pub fn supported_color_modes(&self) -> Vec<ColorMode> {
        let mode = if self.supports_color_temp() {
            ColorMode::ColorTemp
        } else if self.is_dimmable() {
            ColorMode::Brightness
        } else {
            ColorMode::OnOff
        };
        vec![mode]
    }

    /// Returns the supported color temperature range, for tunable products.
    #[must_use]
    pub fn color_temp_range(&self) -> Option<(ColorTemp, ColorTemp)> {
        self.supports_color_temp()
            .then_some((ColorTemp::WARMEST, ColorTemp::COOLEST))
    }

    /// Returns `true` if the product supports brightness control.
    #[must_use]
    pub fn is_dimmable(&self) -> bool {
        self.capabilities.supports_dimming(self.entity.product_id)
    }

    /// Returns `true` if the product supports color temperature control.
    #[must_use]
    pub fn supports_color_temp(&self) -> bool {
        self.capabilities.supports_color_temp(self.entity.product_id)
    }

    /// Returns the entity's unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.entity.pid
    }

    /// Returns the entity's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    /// Returns the mesh address commands are sent to.
    #[must_use]
    pub fn avid(&self) -> &Avid {
        &self.entity.avid
    }

    /// Returns the record this controller was built from.
    #[must_use]
    pub fn entity(&self) -> &EntityRecord {
        &self.entity
    }

    /// Returns host-facing metadata.
    #[must_use]
    pub fn info(&self) -> EntityInfo {
        let model = product_name(self.entity.product_id).map_or_else(
            || format!("Unknown ({})", self.entity.product_id),
            str::to_string,
        );
        EntityInfo {
            identifier: self.entity.pid.clone(),
            name: self.entity.name.clone(),
            manufacturer: MANUFACTURER,
            model,
            serial_number: self.entity.pid.clone(),
        }
    }
}
