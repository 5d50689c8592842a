// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh connection service.
//!
//! The [`MeshService`] owns everything one mesh connection needs: the
//! resolved location, the outbound command queue, the inbound status queue,
//! the [`StatusDispatcher`](crate::dispatcher::StatusDispatcher), and two
//! background tasks (the external transport and the status listener).
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Initializing -> Running -> ShuttingDown -> Stopped
//!                       |                          ^
//!                       +---- (lookup failure) ----+--> Stopped
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use avion_mesh::cloud::AvionCloudClient;
//! use avion_mesh::command::MeshCommand;
//! use avion_mesh::config::MeshConfig;
//! use avion_mesh::error::TransportError;
//! use avion_mesh::service::MeshService;
//! use avion_mesh::transport::{MeshTransport, TransportContext};
//! use avion_mesh::types::Avid;
//!
//! struct BleTransport;
//!
//! impl MeshTransport for BleTransport {
//!     type Scanner = ();
//!
//!     async fn run(self, ctx: TransportContext<()>) -> Result<(), TransportError> {
//!         ctx.cancel.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> avion_mesh::Result<()> {
//! let config = MeshConfig::new("me@example.com", "hunter2");
//! let lookup = AvionCloudClient::from_config(&config)?;
//!
//! let service = MeshService::new(config)?;
//! service.initialize(&lookup, BleTransport, ()).await?;
//!
//! let _subscription = service.subscribe(|status| println!("{status:?}"));
//! service.send_command(MeshCommand::on(Avid::new("32781")))?;
//!
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod command_sender;
mod mesh_service;
mod status_listener;

pub use command_sender::CommandSender;
pub use mesh_service::{MeshService, ServiceState};
pub use status_listener::ListenerExit;
