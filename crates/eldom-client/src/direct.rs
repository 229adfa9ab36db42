//! Direct-request protocol
//!
//! Every device command goes through a single relay endpoint,
//! `POST /api/direct-req`. The relay routes on the `ionic-idd` header (the
//! device UUID); the body carries the checksum-stamped command, addressed by
//! the device pair token, either as plain JSON or sealed in the encrypted
//! envelope depending on the device family.
//!
//! Nothing here retries: a stamped command may change device state, so the
//! caller decides whether a repeat is safe.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use eldom_proto::command::field;
use eldom_proto::{Command, DeviceFamily, Envelope, StateChangeAck};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{EldomClientError, Result};
use crate::token::TokenProvider;
use crate::transport::{Headers, Transport};
use crate::types::Device;

/// Relay endpoint path
pub const DIRECT_REQUEST_PATH: &str = "/api/direct-req";

/// Header carrying the device UUID
pub const DEVICE_HEADER: &str = "ionic-idd";

/// Sends stamped commands to devices through the relay
#[derive(Clone)]
pub struct DirectRequestClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenProvider>,
    endpoint: Url,
    envelope: Envelope,
}

impl DirectRequestClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenProvider>,
        config: &ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            tokens,
            endpoint: config.endpoint(DIRECT_REQUEST_PATH)?,
            envelope: Envelope::vendor(),
        })
    }

    /// Use a different envelope key
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Request body for a command: the command itself, or `{"Msg": ...}`
    pub fn encode_body(&self, family: DeviceFamily, command: &Command) -> Result<String> {
        if family.encrypted() {
            serde_json::to_string(&self.envelope.seal(command))
                .map_err(|e| EldomClientError::ParseError(e.to_string()))
        } else {
            Ok(command.to_json())
        }
    }

    /// Decode a response body; an empty body decodes to `null`
    pub fn decode_body(&self, family: DeviceFamily, body: &str) -> Result<Value> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        if family.encrypted() {
            Ok(self.envelope.open(body)?)
        } else {
            serde_json::from_str(body).map_err(|e| EldomClientError::ParseError(e.to_string()))
        }
    }

    fn headers(device: &Device, token: &str) -> Headers {
        vec![
            (DEVICE_HEADER, device.uuid.clone()),
            ("Authorization", format!("Bearer {}", token)),
            ("User-Agent", USER_AGENT.to_string()),
            ("Content-Type", "application/json".to_string()),
        ]
    }

    /// Send a stamped command and return the decoded response
    #[instrument(
        skip(self, device, command),
        fields(family = %family, device = %device.uuid, req = command.request())
    )]
    pub async fn send(
        &self,
        family: DeviceFamily,
        device: &Device,
        command: &Command,
    ) -> Result<Value> {
        let body = self.encode_body(family, command)?;
        let token = self.tokens.provide().await?;

        debug!(crc = command.crc(), "Sending direct request");
        let response = self
            .transport
            .post(self.endpoint.clone(), Self::headers(device, &token), body)
            .await?;

        self.decode_body(family, &response)
    }
}

impl fmt::Debug for DirectRequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectRequestClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Deserialize a decoded response into a typed result
pub fn decode_response<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| EldomClientError::ParseError(e.to_string()))
}

/// Decode a state-change acknowledgment; an empty response is an empty ack
pub fn decode_ack(value: Value) -> Result<StateChangeAck> {
    if value.is_null() {
        Ok(StateChangeAck::default())
    } else {
        decode_response(value)
    }
}

/// Capability shared by family clients that talk to devices through the relay
#[async_trait]
pub trait DirectRequestDevice: Send + Sync {
    /// Family this client speaks for
    fn family(&self) -> DeviceFamily;

    /// Underlying protocol client
    fn direct(&self) -> &DirectRequestClient;

    /// Build, stamp and send a command with extra fields placed before `CID`
    ///
    /// Extra fields named `ID`, `Req`, `CID` or `CRC` fail with
    /// [`EldomClientError::ReservedField`] before anything is sent.
    async fn send(
        &self,
        device: &Device,
        request: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value> {
        if let Some((name, _)) = extra.iter().find(|(name, _)| field::is_reserved(name)) {
            return Err(EldomClientError::ReservedField(name.to_string()));
        }
        let command = Command::builder(device.pair_tok.as_str(), request)
            .fields(extra.iter().copied())
            .build();
        self.send_command(device, &command).await
    }

    /// Send an already stamped command
    async fn send_command(&self, device: &Device, command: &Command) -> Result<Value> {
        self.direct().send(self.family(), device, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jwt_with_expiry, RecordingTransport};
    use crate::token::Credentials;
    use chrono::Utc;
    use serde_json::json;

    struct Fixture {
        transport: Arc<RecordingTransport>,
        direct: DirectRequestClient,
        token: String,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(RecordingTransport::new());
        let token = jwt_with_expiry(Utc::now().timestamp() + 3600, "t");
        transport.push_response(Ok(json!({ "id_token": token }).to_string()));

        let config = ClientConfig::new("http://relay.test").unwrap();
        let tokens = Arc::new(
            TokenProvider::new(transport.clone(), &config, Credentials::new("u", "p")).unwrap(),
        );
        let direct = DirectRequestClient::new(transport.clone(), tokens, &config).unwrap();
        Fixture {
            transport,
            direct,
            token,
        }
    }

    fn device() -> Device {
        Device::new("AD5B221071124F28", "R7alOFhj9kDslr2X")
    }

    #[tokio::test]
    async fn test_plain_request_wire_format() {
        let fx = fixture();
        fx.transport
            .push_response(Ok(json!({"Res": "On", "Code": "0"}).to_string()));

        let command = Command::builder("R7alOFhj9kDslr2X", "On").build();
        let value = fx
            .direct
            .send(DeviceFamily::ConvectorHeater, &device(), &command)
            .await
            .unwrap();
        assert_eq!(value["Res"], "On");

        let requests = fx.transport.requests();
        assert_eq!(requests.len(), 2);
        let relay = &requests[1];
        assert_eq!(relay.url.as_str(), "http://relay.test/api/direct-req");
        assert_eq!(
            relay.body.as_deref(),
            Some(r#"{"ID":"R7alOFhj9kDslr2X","Req":"On","CID":"1","CRC":"EC378CF7"}"#)
        );
        assert_eq!(relay.header(DEVICE_HEADER), Some("AD5B221071124F28"));
        assert_eq!(
            relay.header("Authorization"),
            Some(format!("Bearer {}", fx.token).as_str())
        );
        assert_eq!(relay.header("User-Agent"), Some(USER_AGENT));
        assert_eq!(relay.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_encrypted_request_and_response() {
        let fx = fixture();
        let envelope = Envelope::vendor();
        let reply = envelope.encrypt(&json!({"Res": "Smart", "Code": "0"})).unwrap();
        fx.transport
            .push_response(Ok(json!({ "Msg": reply }).to_string()));

        let command = Command::builder("ZqeZWqyVU12LAPGk", "Smart").build();
        let value = fx
            .direct
            .send(DeviceFamily::FlatBoiler, &device(), &command)
            .await
            .unwrap();
        assert_eq!(value, json!({"Res": "Smart", "Code": "0"}));

        let requests = fx.transport.requests();
        let body: Value = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        let sealed = body["Msg"].as_str().unwrap();
        assert_eq!(body.as_object().unwrap().len(), 1);
        assert_eq!(envelope.decrypt_text(sealed).unwrap(), command.to_json());
    }

    #[tokio::test]
    async fn test_undecryptable_response_is_not_transport_error() {
        let fx = fixture();
        fx.transport
            .push_response(Ok(json!({"Msg": "@@not-base64@@"}).to_string()));

        let command = Command::builder("ZqeZWqyVU12LAPGk", "GetStatus").build();
        let err = fx
            .direct
            .send(DeviceFamily::FlatBoiler, &device(), &command)
            .await
            .unwrap_err();
        assert!(matches!(err, EldomClientError::DecryptionFailed(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let fx = fixture();
        fx.transport
            .push_response(Err(EldomClientError::server_error(500, "relay down")));

        let command = Command::builder("R7alOFhj9kDslr2X", "GetStatus").build();
        let err = fx
            .direct
            .send(DeviceFamily::ConvectorHeater, &device(), &command)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(fx.transport.request_count(), 2);
    }

    #[test]
    fn test_empty_body_decodes_to_empty_ack() {
        let fx = fixture();
        let value = fx.direct.decode_body(DeviceFamily::FlatBoiler, "").unwrap();
        assert!(decode_ack(value).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plaintext_reply_from_encrypted_family() {
        let fx = fixture();
        fx.transport.push_response(Ok(json!({
            "Res": "Smart",
            "Code": "0",
            "Type": "OK",
            "Reason": "SUCCESS"
        })
        .to_string()));

        let boiler = crate::flat_boiler::FlatBoilerClient::new(fx.direct.clone());
        let ack = boiler
            .set_state(&Device::new("BF11A0C3D2E44B10", "ZqeZWqyVU12LAPGk"), "3")
            .await
            .unwrap();
        assert_eq!(ack.result, "Smart");
        assert!(ack.is_success());
        assert_eq!(fx.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_reserved_extra_fields_are_rejected() {
        let fx = fixture();
        let heater = crate::convector_heater::ConvectorHeaterClient::new(fx.direct.clone());

        for name in ["ID", "Req", "CID", "CRC"] {
            let err = heater
                .send(&device(), "SetParams", &[("TSet", "22"), (name, "9")])
                .await
                .unwrap_err();
            assert!(matches!(err, EldomClientError::ReservedField(ref n) if n == name));
        }
        // Rejected before the token provider or the relay is touched
        assert_eq!(fx.transport.request_count(), 0);
    }
}
