// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `avion_mesh` - Avi-on Bluetooth mesh lighting bridge.
//!
//! This library connects a home-automation host to an Avi-on lighting mesh.
//! It resolves the account's location, selects which devices and groups
//! become light entities, keeps one state per entity, and routes commands
//! and status reports through an external mesh transport.
//!
//! # Architecture
//!
//! - [`config`] - Integration settings and entity filters
//! - [`cloud`] - Account lookup ([`cloud::AvionCloudClient`] with the `http` feature)
//! - [`resolver`] - Which devices and groups become entities
//! - [`capabilities`] - Product id to feature mapping
//! - [`service`] - Connection lifecycle, command queue and status listener
//! - [`dispatcher`] - Fan-out of status reports to handlers
//! - [`light`] - Per-entity controllers and state
//! - [`transport`] - The seam to the BLE mesh protocol implementation
//! - [`integration`] - Everything above wired together
//!
//! The BLE GATT and mesh encryption layers are not part of this crate; they
//! plug in through [`transport::MeshTransport`].
//!
//! # Quick Start
//!
//! ```no_run
//! use avion_mesh::cloud::AvionCloudClient;
//! use avion_mesh::error::TransportError;
//! use avion_mesh::transport::{MeshTransport, TransportContext};
//! use avion_mesh::{MeshConfig, MeshIntegration, TurnOnRequest};
//!
//! struct BleTransport;
//!
//! impl MeshTransport for BleTransport {
//!     type Scanner = ();
//!
//!     async fn run(self, ctx: TransportContext<()>) -> Result<(), TransportError> {
//!         // Connect to the mesh with ctx.passphrase, then forward
//!         // ctx.commands and push received events onto ctx.statuses.
//!         ctx.cancel.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> avion_mesh::Result<()> {
//!     let config = MeshConfig::new("me@example.com", "hunter2");
//!     let lookup = AvionCloudClient::from_config(&config)?;
//!
//!     let integration = MeshIntegration::setup(config, &lookup, BleTransport, ()).await?;
//!
//!     for light in integration.controllers() {
//!         light.turn_on(TurnOnRequest::new())?;
//!     }
//!
//!     integration.unload().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber.

pub mod capabilities;
pub mod cloud;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod integration;
pub mod light;
pub mod model;
pub mod resolver;
pub mod service;
pub mod status;
pub mod transport;
pub mod types;

pub use capabilities::{Capability, CapabilityRegistry, CapabilityRegistryBuilder};
#[cfg(feature = "http")]
pub use cloud::AvionCloudClient;
pub use cloud::{LocationLookup, StaticLookup};
pub use command::{LightAction, MeshCommand};
pub use config::MeshConfig;
pub use dispatcher::{StatusDispatcher, Subscription, SubscriptionId};
pub use error::{ConfigError, Error, LookupError, Result, TransportError, ValueError};
pub use integration::MeshIntegration;
pub use light::{ColorMode, EntityInfo, LightController, LightState, TurnOnRequest};
pub use model::{Device, Group, Location};
pub use resolver::{EntityKind, EntityRecord, resolve_entities};
pub use service::{CommandSender, ListenerExit, MeshService, ServiceState};
pub use status::{MeshStatus, StatusReport};
pub use transport::{MeshTransport, TransportContext};
pub use types::{Avid, Brightness, ColorTemp};
