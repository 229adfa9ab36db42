//! Account-level records and request/response bodies

use serde::{Deserialize, Serialize};

/// Account of the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Username
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub email: String,
}

/// A physical device registered to the account
///
/// The relay routes on `uuid` (sent as the `ionic-idd` header), while the
/// command body identifies the device by `pair_tok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Routing id, e.g. `AD5B221071124F28`
    pub uuid: String,
    /// Model family code, e.g. `HTRCNV`
    #[serde(default)]
    pub model: String,
    /// Commercial model, e.g. `RH30NW`
    #[serde(default)]
    pub fmodel: String,
    #[serde(default)]
    pub name: String,
    /// Pair token, used as `ID` in direct requests
    #[serde(rename = "pairTok")]
    pub pair_tok: String,
}

impl Device {
    /// Device with only the addressing fields set
    pub fn new(uuid: impl Into<String>, pair_tok: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            model: String::new(),
            fmodel: String::new(),
            name: String::new(),
            pair_tok: pair_tok.into(),
        }
    }

    /// Whether `key` names this device by uuid, pair token or name
    pub fn matches(&self, key: &str) -> bool {
        self.uuid.eq_ignore_ascii_case(key)
            || self.pair_tok == key
            || (!self.name.is_empty() && self.name.eq_ignore_ascii_case(key))
    }
}

/// Body of the token exchange
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthenticateRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

/// Response of the token exchange
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Error body returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ErrorResponse {
    pub fn into_message(self) -> Option<String> {
        self.detail.or(self.message).or(self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_ignores_unknown_fields() {
        let device: Device = serde_json::from_value(json!({
            "uuid": "AD5B221071124F28",
            "model": "HTRCNV",
            "fmodel": "RH30NW",
            "name": "RH30NW",
            "pairTok": "R7alOFhj9kDslr2X",
            "online": true
        }))
        .unwrap();

        assert_eq!(device.pair_tok, "R7alOFhj9kDslr2X");
        assert!(device.matches("ad5b221071124f28"));
        assert!(device.matches("R7alOFhj9kDslr2X"));
        assert!(device.matches("rh30nw"));
        assert!(!device.matches("other"));
    }

    #[test]
    fn test_authenticate_request_shape() {
        let body = serde_json::to_value(AuthenticateRequest {
            username: "user",
            password: "pass",
            remember_me: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"username": "user", "password": "pass", "rememberMe": false})
        );
    }
}
