// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seam between the mesh service and the code that talks to the mesh.
//!
//! The BLE GATT and encryption layers live outside this crate. A transport
//! receives a [`TransportContext`] and is expected to:
//!
//! - drain `commands` and deliver each one to the mesh, in order;
//! - push every light state event it hears onto `statuses`;
//! - return promptly once `cancel` fires.
//!
//! The service additionally drops the transport future when shutdown is
//! requested, so a transport that never checks the token still stops at its
//! next `.await`.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::command::MeshCommand;
use crate::error::TransportError;
use crate::status::MeshStatus;
use crate::types::Avid;

/// Everything a transport task needs to run.
#[derive(Debug)]
pub struct TransportContext<S> {
    /// Shared mesh passphrase.
    pub passphrase: String,
    /// Mesh addresses of the devices the transport may talk to.
    pub allowed_devices: Vec<Avid>,
    /// Outbound commands, in submission order.
    pub commands: mpsc::UnboundedReceiver<MeshCommand>,
    /// Inbound status reports.
    pub statuses: mpsc::UnboundedSender<MeshStatus>,
    /// Host radio scanner handle.
    pub scanner: S,
    /// Fires when the service shuts down.
    pub cancel: CancellationToken,
}

/// A long-running task speaking the mesh protocol.
///
/// # Examples
///
/// A transport that answers every brightness command with a matching status,
/// as a real mesh would once the light has changed:
///
/// ```
/// use avion_mesh::command::LightAction;
/// use avion_mesh::error::TransportError;
/// use avion_mesh::status::MeshStatus;
/// use avion_mesh::transport::{MeshTransport, TransportContext};
///
/// struct Echo;
///
/// impl MeshTransport for Echo {
///     type Scanner = ();
///
///     async fn run(self, mut ctx: TransportContext<()>) -> Result<(), TransportError> {
///         loop {
///             tokio::select! {
///                 () = ctx.cancel.cancelled() => return Ok(()),
///                 cmd = ctx.commands.recv() => {
///                     let Some(cmd) = cmd else { return Ok(()) };
///                     if let LightAction::Brightness(b) = cmd.action {
///                         let _ = ctx.statuses.send(MeshStatus::brightness(cmd.avid, b));
///                     }
///                 }
///             }
///         }
///     }
/// }
/// ```
pub trait MeshTransport: Send + 'static {
    /// Radio scanner handle supplied by the host.
    type Scanner: Send + 'static;

    /// Runs until cancelled or until the mesh link fails.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the mesh link fails; the service logs
    /// it during shutdown.
    fn run(
        self,
        ctx: TransportContext<Self::Scanner>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
