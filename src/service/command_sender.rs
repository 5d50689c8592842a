// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Handle for submitting commands to the mesh.

use tokio::sync::mpsc;

use crate::command::MeshCommand;
use crate::error::{Error, Result};

/// Cloneable handle onto the service's outbound command queue.
///
/// Sending never blocks: the queue is unbounded. Delivery beyond "handed to
/// the transport task" is the transport's business; there is no
/// acknowledgment or retry at this layer.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<MeshCommand>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<MeshCommand>) -> Self {
        Self { tx }
    }

    /// Queues a command for the transport.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the transport side of the queue has
    /// been dropped.
    pub fn send(&self, command: MeshCommand) -> Result<()> {
        tracing::debug!(avid = %command.avid, action = %command.action, "Sending mesh command");
        self.tx.send(command).map_err(|_| Error::ServiceStopped)
    }

    /// Returns `true` once the transport side of the queue is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
