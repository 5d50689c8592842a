// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup and teardown of a complete mesh integration.
//!
//! [`MeshIntegration`] wires the pieces together the way a home-automation
//! host needs them: one [`MeshService`], one [`LightController`] per selected
//! entity, and a dispatcher subscription per controller.

use std::sync::Arc;

use crate::cloud::LocationLookup;
use crate::config::MeshConfig;
use crate::dispatcher::Subscription;
use crate::error::{Error, Result};
use crate::light::LightController;
use crate::resolver::resolve_entities;
use crate::service::MeshService;
use crate::transport::MeshTransport;

/// A running mesh connection with its light entities.
///
/// # Examples
///
/// ```no_run
/// use avion_mesh::cloud::AvionCloudClient;
/// use avion_mesh::config::MeshConfig;
/// use avion_mesh::error::TransportError;
/// use avion_mesh::integration::MeshIntegration;
/// use avion_mesh::light::TurnOnRequest;
/// use avion_mesh::transport::{MeshTransport, TransportContext};
///
/// struct BleTransport;
///
/// impl MeshTransport for BleTransport {
///     type Scanner = ();
///
///     async fn run(self, ctx: TransportContext<()>) -> Result<(), TransportError> {
///         ctx.cancel.cancelled().await;
///         Ok(())
///     }
/// }
///
/// # async fn example() -> avion_mesh::Result<()> {
/// let config = MeshConfig::new("me@example.com", "hunter2").with_all_devices("Everything");
/// let lookup = AvionCloudClient::from_config(&config)?;
///
/// let integration = MeshIntegration::setup(config, &lookup, BleTransport, ()).await?;
/// for light in integration.controllers() {
///     println!("{} ({})", light.name(), light.info().model);
/// }
///
/// if let Some(light) = integration.controller("avion_all") {
///     light.turn_on(TurnOnRequest::new())?;
/// }
///
/// integration.unload().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MeshIntegration {
    service: MeshService,
    controllers: Vec<Arc<LightController>>,
    subscriptions: Vec<Subscription>,
}

impl MeshIntegration {
    /// Starts the service and creates one controller per selected entity.
    ///
    /// # Errors
    ///
    /// Returns the configuration or initialization error. The service is
    /// shut down before the error is returned.
    pub async fn setup<L, T>(
        config: MeshConfig,
        lookup: &L,
        transport: T,
        scanner: T::Scanner,
    ) -> Result<Self>
    where
        L: LocationLookup,
        T: MeshTransport,
    {
        let service = MeshService::new(config)?;
        if let Err(e) = service.initialize(lookup, transport, scanner).await {
            service.shutdown().await;
            return Err(e);
        }

        let Some(location) = service.location() else {
            service.shutdown().await;
            return Err(Error::NoLocation);
        };
        let records = resolve_entities(service.config(), location);

        let controllers: Vec<Arc<LightController>> = records
            .into_iter()
            .map(|record| {
                Arc::new(LightController::new(
                    record,
                    Arc::clone(service.capabilities()),
                    service.command_sender(),
                ))
            })
            .collect();
        let subscriptions = controllers
            .iter()
            .map(|controller| controller.subscribe_to(service.dispatcher()))
            .collect();

        tracing::info!(entities = controllers.len(), "Mesh integration set up");

        Ok(Self {
            service,
            controllers,
            subscriptions,
        })
    }

    /// Returns the controllers in entity order: groups, devices, then the
    /// aggregate entity.
    #[must_use]
    pub fn controllers(&self) -> &[Arc<LightController>] {
        &self.controllers
    }

    /// Returns the controller with the given unique id.
    #[must_use]
    pub fn controller(&self, pid: &str) -> Option<&Arc<LightController>> {
        self.controllers.iter().find(|c| c.unique_id() == pid)
    }

    /// Returns the underlying service.
    #[must_use]
    pub fn service(&self) -> &MeshService {
        &self.service
    }

    /// Unregisters every controller and shuts the service down.
    ///
    /// Never fails; task failures are logged by the service.
    pub async fn unload(mut self) {
        tracing::info!(entities = self.controllers.len(), "Unloading mesh integration");
        self.subscriptions.clear();
        self.service.shutdown().await;
    }
}
