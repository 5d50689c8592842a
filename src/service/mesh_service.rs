// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The mesh connection service and its lifecycle.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::command_sender::CommandSender;
use super::status_listener::{ListenerExit, listen_for_status};
use crate::capabilities::CapabilityRegistry;
use crate::cloud::LocationLookup;
use crate::command::MeshCommand;
use crate::config::MeshConfig;
use crate::dispatcher::{StatusDispatcher, Subscription};
use crate::error::{Error, Result, TransportError};
use crate::model::Location;
use crate::status::MeshStatus;
use crate::transport::{MeshTransport, TransportContext};
use crate::types::Avid;

/// Lifecycle state of a [`MeshService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    /// Created, not yet connected.
    #[default]
    Uninitialized,
    /// Resolving the location and starting background tasks.
    Initializing,
    /// Background tasks are running.
    Running,
    /// Stop requested, waiting for background tasks.
    ShuttingDown,
    /// Fully stopped. Terminal.
    Stopped,
}

impl ServiceState {
    /// Returns `true` once shutdown has begun or completed.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Stopped)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

type StatusChannel = (
    mpsc::UnboundedSender<MeshStatus>,
    mpsc::UnboundedReceiver<MeshStatus>,
);

struct ServiceTasks {
    transport: JoinHandle<std::result::Result<(), TransportError>>,
    listener: JoinHandle<ListenerExit>,
}

/// One connection to an Avi-on mesh.
///
/// The service resolves the account's location, starts the external
/// transport with the location passphrase and device allow-list, and fans
/// incoming status reports out through its [`StatusDispatcher`].
///
/// All methods take `&self`; share the service behind an `Arc` when several
/// owners need it.
pub struct MeshService {
    config: MeshConfig,
    capabilities: Arc<CapabilityRegistry>,
    state: watch::Sender<ServiceState>,
    commands: CommandSender,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<MeshCommand>>>,
    status_channel: Mutex<Option<StatusChannel>>,
    dispatcher: StatusDispatcher,
    location: OnceLock<Location>,
    cancel: CancellationToken,
    tasks: Mutex<Option<ServiceTasks>>,
}

impl MeshService {
    /// Creates a service from a configuration.
    ///
    /// Validates the configuration and freezes the capability registry
    /// (built-in table plus configured overrides). No network activity
    /// happens until [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: MeshConfig) -> Result<Self> {
        config.validate()?;
        let overrides = config.capability_overrides()?;
        let capabilities = CapabilityRegistry::builder()
            .with_defaults()
            .with_overrides(&overrides)
            .build();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ServiceState::Uninitialized);

        Ok(Self {
            config,
            capabilities: Arc::new(capabilities),
            state,
            commands: CommandSender::new(command_tx),
            command_rx: Mutex::new(Some(command_rx)),
            status_channel: Mutex::new(Some(mpsc::unbounded_channel())),
            dispatcher: StatusDispatcher::new(),
            location: OnceLock::new(),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(None),
        })
    }

    /// Resolves the location and starts the transport and status listener.
    ///
    /// If the account has several locations, the first one is used.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` if called more than once
    /// - `Error::Lookup` if the account cannot be queried
    /// - `Error::NoLocation` if the account has no location
    /// - `Error::ServiceStopped` if shutdown was requested meanwhile
    ///
    /// A failed initialization leaves the service [`ServiceState::Stopped`].
    pub async fn initialize<L, T>(
        &self,
        lookup: &L,
        transport: T,
        scanner: T::Scanner,
    ) -> Result<()>
    where
        L: LocationLookup,
        T: MeshTransport,
    {
        let mut current = ServiceState::Uninitialized;
        let started = self.state.send_if_modified(|state| {
            current = *state;
            if *state == ServiceState::Uninitialized {
                *state = ServiceState::Initializing;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(Error::InvalidState(current));
        }

        tracing::info!(username = %self.config.username, "Initializing mesh service");

        match self.start(lookup, transport, scanner).await {
            Ok(()) => {
                self.transition(ServiceState::Initializing, ServiceState::Running);
                tracing::info!("Mesh service running");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Mesh service initialization failed");
                self.transition(ServiceState::Initializing, ServiceState::Stopped);
                Err(e)
            }
        }
    }

    async fn start<L, T>(&self, lookup: &L, transport: T, scanner: T::Scanner) -> Result<()>
    where
        L: LocationLookup,
        T: MeshTransport,
    {
        let mut locations = lookup
            .lookup_locations(&self.config.username, &self.config.password)
            .await?;

        if locations.is_empty() {
            return Err(Error::NoLocation);
        }
        if locations.len() > 1 {
            tracing::warn!(
                count = locations.len(),
                "Account has several locations, using the first one"
            );
        }
        let location = locations.swap_remove(0);
        let allowed_devices = location.device_avids();
        tracing::info!(
            devices = location.devices.len(),
            groups = location.groups.len(),
            "Resolved mesh location"
        );

        // Checked under the tasks lock so shutdown either sees the tasks or
        // prevents them from being spawned.
        let mut tasks = self.tasks.lock();
        if self.cancel.is_cancelled() {
            return Err(Error::ServiceStopped);
        }
        let (Some(commands), Some((status_tx, status_rx))) =
            (self.command_rx.lock().take(), self.status_channel.lock().take())
        else {
            return Err(Error::ServiceStopped);
        };

        let ctx = TransportContext {
            passphrase: location.passphrase.clone(),
            allowed_devices,
            commands,
            statuses: status_tx,
            scanner,
            cancel: self.cancel.clone(),
        };
        let _ = self.location.set(location);

        let cancel = self.cancel.clone();
        let transport = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => Ok(()),
                result = transport.run(ctx) => result,
            }
        });
        let listener = tokio::spawn(listen_for_status(
            status_rx,
            self.dispatcher.clone(),
            self.cancel.clone(),
        ));

        *tasks = Some(ServiceTasks {
            transport,
            listener,
        });
        Ok(())
    }

    /// Stops the background tasks.
    ///
    /// Each task gets the configured shutdown timeout to finish before it is
    /// aborted. Task failures are logged, never returned. Calling this again,
    /// or before [`initialize`](Self::initialize), is harmless; a concurrent
    /// caller waits until the first one has finished.
    pub async fn shutdown(&self) {
        let first = self.state.send_if_modified(|state| {
            if state.is_stopping() {
                false
            } else {
                *state = ServiceState::ShuttingDown;
                true
            }
        });
        if !first {
            let mut rx = self.state.subscribe();
            let _ = rx.wait_for(|state| *state == ServiceState::Stopped).await;
            return;
        }

        tracing::info!("Shutting down mesh service");
        self.cancel.cancel();

        let tasks = self.tasks.lock().take();
        // Queues never handed to a transport are closed here
        self.command_rx.lock().take();
        self.status_channel.lock().take();

        if let Some(tasks) = tasks {
            let timeout = self.config.shutdown_timeout();

            match join_task("transport", tasks.transport, timeout).await {
                Some(Err(e)) => tracing::warn!(error = %e, "Mesh transport ended with error"),
                Some(Ok(())) | None => {}
            }
            match join_task("status listener", tasks.listener, timeout).await {
                Some(ListenerExit::ChannelClosed) => {
                    tracing::warn!("Status listener had already stopped: transport closed its queue");
                }
                Some(ListenerExit::Cancelled) | None => {}
            }
        }

        self.state.send_replace(ServiceState::Stopped);
        tracing::info!("Mesh service stopped");
    }

    /// Queues a command for the mesh.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` once the transport is gone.
    pub fn send_command(&self, command: MeshCommand) -> Result<()> {
        self.commands.send(command)
    }

    /// Returns a cloneable handle for sending commands.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Registers a status handler with the service's dispatcher.
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&MeshStatus) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(handler)
    }

    /// Returns the status dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &StatusDispatcher {
        &self.dispatcher
    }

    /// Returns the frozen capability registry.
    #[must_use]
    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Returns the resolved location, once initialization got that far.
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.location.get()
    }

    /// Returns the mesh addresses the transport was allowed to talk to.
    #[must_use]
    pub fn allowed_devices(&self) -> Vec<Avid> {
        self.location().map(Location::device_avids).unwrap_or_default()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Returns a receiver notified on every lifecycle transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    fn transition(&self, from: ServiceState, to: ServiceState) {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
    }
}

impl fmt::Debug for MeshService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshService")
            .field("state", &self.state())
            .field("location_resolved", &self.location.get().is_some())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Drop for MeshService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Awaits a background task for at most `timeout`.
///
/// Returns the task output, or `None` if it was cancelled, panicked or had to
/// be aborted.
async fn join_task<T>(name: &'static str, mut handle: JoinHandle<T>, timeout: Duration) -> Option<T> {
    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(e)) if e.is_cancelled() => None,
        Ok(Err(e)) => {
            tracing::error!(task = name, error = %e, "Background task panicked");
            None
        }
        Err(_) => {
            tracing::warn!(task = name, ?timeout, "Background task did not stop in time, aborting");
            handle.abort();
            None
        }
    }
}
