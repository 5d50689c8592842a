// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `avion_mesh` library.
//!
//! The hierarchy mirrors the lifecycle of a mesh connection: configuration
//! validation, account resolution, the external transport, and misuse of the
//! service lifecycle. Cancellation during shutdown is never represented as an
//! error.

use thiserror::Error;

use crate::service::ServiceState;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The integration configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Looking up the account's locations failed.
    #[error("location lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// The account has no location, so there is no mesh to join.
    #[error("no locations found for this account")]
    NoLocation,

    /// The external mesh transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The value does not fit the expected range.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The requested operation is not valid in the service's current state.
    #[error("operation not allowed while service is {0}")]
    InvalidState(ServiceState),

    /// The service has stopped and no longer accepts commands.
    #[error("mesh service has stopped")]
    ServiceStopped,
}

/// Errors found while validating the integration configuration.
///
/// These are raised before any network activity takes place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No username was configured.
    #[error("missing username")]
    MissingUsername,

    /// No password was configured.
    #[error("missing password")]
    MissingPassword,

    /// A capability override list contains something that is not a product id.
    #[error("invalid product id in capability override: {value:?}")]
    InvalidProductId {
        /// The offending list entry.
        value: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },
}

/// Errors raised while resolving an account into locations.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The cloud rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The cloud answered with something we could not use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Errors raised by a mesh transport task.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport could not reach the mesh.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// One of the service queues was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
