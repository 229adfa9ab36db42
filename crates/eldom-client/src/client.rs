//! Eldom API client
//!
//! Account-level calls (user, device list) are plain authenticated JSON
//! requests. Device commands go through the family clients, which share the
//! same transport and token provider.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, USER_AGENT};
use crate::convector_heater::ConvectorHeaterClient;
use crate::direct::{DirectRequestClient, DEVICE_HEADER};
use crate::error::{EldomClientError, Result};
use crate::flat_boiler::FlatBoilerClient;
use crate::token::{Credentials, TokenProvider};
use crate::transport::{Headers, HttpTransport, Transport};
use crate::types::{Device, User};

const ACCOUNT_PATH: &str = "/api/account";
const DEVICE_LIST_PATH: &str = "/api/device-list";
const DEVICE_LIST_QUERY: &str = "page=1&size=1000";

/// Eldom IoT API client
///
/// Authentication is lazy: the first request logs in with the credentials
/// given here, and later requests reuse the token until it expires.
#[derive(Clone)]
pub struct EldomClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    tokens: Arc<TokenProvider>,
    convector_heater: ConvectorHeaterClient,
    flat_boiler: FlatBoilerClient,
}

impl EldomClient {
    /// Create a client for the production API
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Self::with_config(ClientConfig::production()?, username, password)
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig, username: &str, password: &str) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(transport, config, Credentials::new(username, password))
    }

    /// Create a client over an injected transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        credentials: Credentials,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenProvider::new(
            Arc::clone(&transport),
            &config,
            credentials,
        )?);
        let direct = DirectRequestClient::new(Arc::clone(&transport), Arc::clone(&tokens), &config)?;

        Ok(Self {
            transport,
            config,
            tokens,
            convector_heater: ConvectorHeaterClient::new(direct.clone()),
            flat_boiler: FlatBoilerClient::new(direct),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Shared token provider
    pub fn token_provider(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    pub fn convector_heater(&self) -> &ConvectorHeaterClient {
        &self.convector_heater
    }

    pub fn flat_boiler(&self) -> &FlatBoilerClient {
        &self.flat_boiler
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Get the logged-in user
    #[instrument(skip(self))]
    pub async fn get_user(&self) -> Result<User> {
        let url = self.config.endpoint(ACCOUNT_PATH)?;
        let headers: Headers = vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("Authorization", self.bearer().await?),
        ];

        let body = self.transport.get(url, headers).await?;
        parse(&body)
    }

    /// List the devices registered to the account
    #[instrument(skip(self))]
    pub async fn get_devices(&self) -> Result<Vec<Device>> {
        let mut url = self.config.endpoint(DEVICE_LIST_PATH)?;
        url.set_query(Some(DEVICE_LIST_QUERY));
        let headers: Headers = vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("Authorization", self.bearer().await?),
            ("Content-Type", "application/json".to_string()),
            (DEVICE_HEADER, "0".to_string()),
        ];

        let body = self.transport.get(url, headers).await?;
        let devices: Vec<Device> = parse(&body)?;
        debug!("Found {} devices", devices.len());
        Ok(devices)
    }

    /// Find a device by UUID, pair token or name
    pub async fn find_device(&self, key: &str) -> Result<Device> {
        self.get_devices()
            .await?
            .into_iter()
            .find(|d| d.matches(key))
            .ok_or_else(|| EldomClientError::DeviceNotFound(key.to_string()))
    }

    /// Whether the API is reachable with the configured credentials
    pub async fn is_connected(&self) -> bool {
        match self.get_devices().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Connection check failed: {}", e);
                false
            }
        }
    }

    async fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.tokens.provide().await?))
    }
}

impl std::fmt::Debug for EldomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EldomClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| EldomClientError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jwt_with_expiry, RecordingTransport};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = EldomClient::new("user", "pass");
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().base_url().as_str(),
            "https://iot.myeldom.com/"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let config = ClientConfig::new("http://localhost:9080").unwrap();
        let client = EldomClient::with_config(config, "user", "pass").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:9080/");
    }

    #[test]
    fn test_find_device_lists_with_bearer() {
        let transport = Arc::new(RecordingTransport::new());
        let token = jwt_with_expiry(Utc::now().timestamp() + 3600, "a");
        transport.push_response(Ok(json!({ "id_token": token.clone() }).to_string()));
        transport.push_response(Ok(json!([
            {"uuid": "AD5B221071124F28", "pairTok": "R7alOFhj9kDslr2X", "name": "Kitchen"}
        ])
        .to_string()));

        let client = EldomClient::with_transport(
            transport.clone(),
            ClientConfig::new("http://relay.test").unwrap(),
            Credentials::new("user", "pass"),
        )
        .unwrap();

        let device = tokio_test::block_on(client.find_device("kitchen")).unwrap();
        assert_eq!(device.pair_tok, "R7alOFhj9kDslr2X");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].url.as_str(),
            "http://relay.test/api/device-list?page=1&size=1000"
        );
        assert_eq!(requests[1].header("ionic-idd"), Some("0"));
        assert_eq!(
            requests[1].header("Authorization"),
            Some(format!("Bearer {}", token).as_str())
        );
    }
}
