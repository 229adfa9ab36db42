//! Flat boiler codec
//!
//! Flat boilers use the encrypted envelope for both directions. Their status
//! fields (`Smart`, `Heater`, `Status`, `EcoMode`, `BoilerMode`, ...) have no
//! published semantics, so they are kept as opaque passthrough values rather
//! than decoded into guessed units.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};
use crate::family::DeviceFamily;
use crate::response::lenient_string;
use crate::GET_STATUS;

/// Operating mode of a flat boiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlatBoilerMode {
    Off,
    On,
    Eco,
    Smart,
    ExtraSafe,
    Powerful,
}

impl FlatBoilerMode {
    /// All modes, indexed by their domain value
    pub const ALL: [Self; 6] = [
        Self::Off,
        Self::On,
        Self::Eco,
        Self::Smart,
        Self::ExtraSafe,
        Self::Powerful,
    ];

    /// Map a domain value (`"0"` to `"5"`) to a mode
    pub fn from_domain(value: &str) -> ProtocolResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.domain_value() == value)
            .ok_or_else(|| ProtocolError::invalid_state(DeviceFamily::FlatBoiler, value))
    }

    pub fn domain_value(self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
            Self::Eco => "2",
            Self::Smart => "3",
            Self::ExtraSafe => "4",
            Self::Powerful => "5",
        }
    }

    /// Wire `Req` value. The misspelling of "Powerfull" is what devices expect.
    pub fn request(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::On => "On",
            Self::Eco => "Eco",
            Self::Smart => "Smart",
            Self::ExtraSafe => "ExtraSafe",
            Self::Powerful => "Powerfull",
        }
    }
}

impl fmt::Display for FlatBoilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Powerful => f.write_str("Powerful"),
            other => f.write_str(other.request()),
        }
    }
}

impl std::str::FromStr for FlatBoilerMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        Self::from_domain(s)
    }
}

/// Build a status request
pub fn status_command(pair_token: &str) -> Command {
    Command::builder(pair_token, GET_STATUS).build()
}

/// Build a mode change request
pub fn mode_command(pair_token: &str, mode: FlatBoilerMode) -> Command {
    Command::builder(pair_token, mode.request()).build()
}

/// Status snapshot of a flat boiler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatBoilerStatus {
    /// Device pair token
    #[serde(rename = "ID", default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Every other reported field, untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FlatBoilerStatus {
    /// Raw value of a reported field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Reported field rendered as text
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.field(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_mode_mapping() {
        let expected = ["Off", "On", "Eco", "Smart", "ExtraSafe", "Powerfull"];
        for (i, req) in expected.iter().enumerate() {
            let mode = FlatBoilerMode::from_domain(&i.to_string()).unwrap();
            assert_eq!(mode.request(), *req);
        }
    }

    #[test]
    fn test_smart_is_three() {
        assert_eq!(FlatBoilerMode::from_domain("3").unwrap().request(), "Smart");
        assert_eq!("3".parse::<FlatBoilerMode>().unwrap(), FlatBoilerMode::Smart);
    }

    #[test]
    fn test_unmapped_value() {
        for value in ["6", "", "On", " 1", "-1"] {
            let err = FlatBoilerMode::from_domain(value).unwrap_err();
            assert!(matches!(
                err,
                ProtocolError::InvalidDomainState {
                    family: DeviceFamily::FlatBoiler,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_mode_command() {
        let cmd = mode_command("ZqeZWqyVU12LAPGk", FlatBoilerMode::Powerful);
        assert_eq!(
            cmd.to_json(),
            r#"{"ID":"ZqeZWqyVU12LAPGk","Req":"Powerfull","CID":"1","CRC":"EF8916E9"}"#
        );
    }

    #[test]
    fn test_status_passthrough() {
        let status: FlatBoilerStatus = serde_json::from_value(json!({
            "ID": "ZqeZWqyVU12LAPGk",
            "Smart": "1",
            "Heater": 0,
            "EcoMode": true
        }))
        .unwrap();

        assert_eq!(status.id, "ZqeZWqyVU12LAPGk");
        assert_eq!(status.field("Heater"), Some(&json!(0)));
        assert_eq!(status.field_text("Smart").as_deref(), Some("1"));
        assert_eq!(status.field_text("EcoMode").as_deref(), Some("true"));
        assert!(status.field("ID").is_none());
    }

    #[test]
    fn test_display_uses_domain_name() {
        assert_eq!(FlatBoilerMode::Powerful.to_string(), "Powerful");
        assert_eq!(FlatBoilerMode::Powerful.request(), "Powerfull");
        assert_eq!(FlatBoilerMode::ExtraSafe.to_string(), "ExtraSafe");
    }
}
