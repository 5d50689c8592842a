// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolution of account credentials into mesh locations.
//!
//! The service only depends on the [`LocationLookup`] trait. With the `http`
//! feature enabled, [`AvionCloudClient`] implements it against the Avi-on
//! cloud API; [`StaticLookup`] serves locations the host already has.

use std::future::Future;

use crate::error::LookupError;
use crate::model::Location;

/// Resolves account credentials into the account's locations.
pub trait LocationLookup: Send + Sync {
    /// Returns every location of the account.
    ///
    /// An empty list is a valid answer; the service treats it as a
    /// resolution failure.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the account cannot be queried.
    fn lookup_locations(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Vec<Location>, LookupError>> + Send;
}

/// Lookup that returns a fixed set of locations, ignoring credentials.
///
/// Useful when the host cached the location record from an earlier setup.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    locations: Vec<Location>,
}

impl StaticLookup {
    /// Creates a lookup returning the given locations.
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Creates a lookup returning a single location.
    #[must_use]
    pub fn single(location: Location) -> Self {
        Self::new(vec![location])
    }
}

impl LocationLookup for StaticLookup {
    async fn lookup_locations(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<Vec<Location>, LookupError> {
        Ok(self.locations.clone())
    }
}

#[cfg(feature = "http")]
pub use http::AvionCloudClient;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::{Client, Response, StatusCode};
    use serde::Deserialize;
    use serde::de::DeserializeOwned;

    use super::LocationLookup;
    use crate::config::MeshConfig;
    use crate::error::LookupError;
    use crate::model::{Device, Group, Location};
    use crate::types::Avid;

    /// HTTP client for the Avi-on cloud API.
    ///
    /// Logs in with the account e-mail and password, then lists every
    /// location with its devices and groups.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use avion_mesh::cloud::{AvionCloudClient, LocationLookup};
    ///
    /// # async fn example() -> Result<(), avion_mesh::error::LookupError> {
    /// let client = AvionCloudClient::new()?;
    /// let locations = client.lookup_locations("me@example.com", "hunter2").await?;
    /// println!("{} locations", locations.len());
    /// # Ok(())
    /// # }
    /// ```
    #[derive(Debug, Clone)]
    pub struct AvionCloudClient {
        base_url: String,
        client: Client,
    }

    #[derive(Deserialize)]
    struct SessionResponse {
        credentials: SessionCredentials,
    }

    #[derive(Deserialize)]
    struct SessionCredentials {
        auth_token: String,
    }

    #[derive(Deserialize)]
    struct LocationsResponse {
        locations: Vec<CloudLocation>,
    }

    #[derive(Deserialize)]
    struct CloudLocation {
        pid: String,
        passphrase: String,
    }

    #[derive(Deserialize)]
    struct AbstractDevicesResponse {
        abstract_devices: Vec<serde_json::Value>,
    }

    #[derive(Deserialize)]
    struct CloudDevice {
        pid: String,
        avid: Avid,
        product_id: u32,
        name: String,
        #[serde(default)]
        friendly_mac_address: Option<String>,
    }

    #[derive(Deserialize)]
    struct GroupsResponse {
        groups: Vec<Group>,
    }

    impl AvionCloudClient {
        /// Production API endpoint.
        pub const DEFAULT_BASE_URL: &'static str = "https://api.avi-on.com";
        /// Default request timeout.
        pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

        /// Creates a client for the production API.
        ///
        /// # Errors
        ///
        /// Returns error if the HTTP client cannot be created.
        pub fn new() -> Result<Self, LookupError> {
            Self::with_base_url(Self::DEFAULT_BASE_URL)
        }

        /// Creates a client for a custom API endpoint.
        ///
        /// # Errors
        ///
        /// Returns error if the HTTP client cannot be created.
        pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, LookupError> {
            let client = Client::builder()
                .timeout(Self::DEFAULT_TIMEOUT)
                .build()?;
            Ok(Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            })
        }

        /// Creates a client for the endpoint named in the configuration.
        ///
        /// # Errors
        ///
        /// Returns error if the HTTP client cannot be created.
        pub fn from_config(config: &MeshConfig) -> Result<Self, LookupError> {
            match &config.api_base_url {
                Some(url) => Self::with_base_url(url.clone()),
                None => Self::new(),
            }
        }

        /// Returns the API base URL.
        #[must_use]
        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        async fn login(&self, email: &str, password: &str) -> Result<String, LookupError> {
            let url = format!("{}/sessions", self.base_url);
            tracing::debug!(url = %url, "Logging in to Avi-on cloud");

            let response = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "email": email, "password": password }))
                .send()
                .await?;

            let session: SessionResponse = check_status(response)?.json().await?;
            Ok(session.credentials.auth_token)
        }

        async fn get_json<T: DeserializeOwned>(
            &self,
            path: &str,
            token: &str,
        ) -> Result<T, LookupError> {
            let url = format!("{}/{path}", self.base_url);
            tracing::debug!(url = %url, "Fetching from Avi-on cloud");

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Token {token}"))
                .send()
                .await?;

            Ok(check_status(response)?.json().await?)
        }

        async fn load_location(
            &self,
            location: CloudLocation,
            token: &str,
        ) -> Result<Location, LookupError> {
            let pid = urlencoding::encode(&location.pid);

            let abstract_devices: AbstractDevicesResponse = self
                .get_json(&format!("locations/{pid}/abstract_devices"), token)
                .await?;
            let groups: GroupsResponse = self
                .get_json(&format!("locations/{pid}/groups"), token)
                .await?;

            let devices = abstract_devices
                .abstract_devices
                .into_iter()
                .filter(|entry| entry.get("type").and_then(|t| t.as_str()) == Some("device"))
                .map(|entry| {
                    serde_json::from_value::<CloudDevice>(entry)
                        .map(|d| Device {
                            pid: d.pid,
                            avid: d.avid,
                            product_id: d.product_id,
                            name: d.name,
                            mac_address: d.friendly_mac_address,
                        })
                        .map_err(|e| LookupError::UnexpectedResponse(format!("device entry: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            tracing::debug!(
                location = %location.pid,
                devices = devices.len(),
                groups = groups.groups.len(),
                "Loaded location"
            );

            Ok(Location {
                passphrase: location.passphrase,
                devices,
                groups: groups.groups,
            })
        }
    }

    impl LocationLookup for AvionCloudClient {
        async fn lookup_locations(
            &self,
            username: &str,
            password: &str,
        ) -> Result<Vec<Location>, LookupError> {
            let token = self.login(username, password).await?;
            let listed: LocationsResponse = self.get_json("user/locations", &token).await?;

            let mut locations = Vec::with_capacity(listed.locations.len());
            for location in listed.locations {
                locations.push(self.load_location(location, &token).await?);
            }
            Ok(locations)
        }
    }

    fn check_status(response: Response) -> Result<Response, LookupError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LookupError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(LookupError::UnexpectedResponse(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Ok(response)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn base_url_trailing_slash_is_trimmed() {
            let client = AvionCloudClient::with_base_url("http://localhost:8080/").unwrap();
            assert_eq!(client.base_url(), "http://localhost:8080");
        }

        #[test]
        fn from_config_uses_override() {
            let config = MeshConfig::new("u", "p").with_api_base_url("http://127.0.0.1:9");
            let client = AvionCloudClient::from_config(&config).unwrap();
            assert_eq!(client.base_url(), "http://127.0.0.1:9");

            let client = AvionCloudClient::from_config(&MeshConfig::new("u", "p")).unwrap();
            assert_eq!(client.base_url(), AvionCloudClient::DEFAULT_BASE_URL);
        }
    }
}
