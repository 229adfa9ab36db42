//! Convector heater codec
//!
//! Wire units, per field:
//!
//! | Field       | Direction | Unit                                   |
//! |-------------|-----------|----------------------------------------|
//! | `TSet`      | request   | whole degrees °C, unscaled (`"22"`)    |
//! | `T`         | response  | tenths of a degree (`"200"` = 20.0 °C) |
//! | `TSet`      | response  | tenths of a degree (`"190"` = 19.0 °C) |
//! | `Operation` | response  | `"16"` on, `"0"` off                   |
//!
//! Note that `TSet` is scaled differently depending on direction.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};
use crate::family::DeviceFamily;
use crate::response::lenient_string;
use crate::GET_STATUS;

/// Request name for parameter updates
pub const SET_PARAMS: &str = "SetParams";

/// On/off state of a convector heater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvectorState {
    Off,
    On,
}

impl ConvectorState {
    /// Domain value for off
    pub const OFF_VALUE: u8 = 0;
    /// Domain value for on
    pub const ON_VALUE: u8 = 16;

    /// Map a domain value (`0` or `16`) to a state
    pub fn from_domain(value: u8) -> ProtocolResult<Self> {
        match value {
            Self::OFF_VALUE => Ok(Self::Off),
            Self::ON_VALUE => Ok(Self::On),
            other => Err(ProtocolError::invalid_state(
                DeviceFamily::ConvectorHeater,
                other,
            )),
        }
    }

    pub fn domain_value(self) -> u8 {
        match self {
            Self::Off => Self::OFF_VALUE,
            Self::On => Self::ON_VALUE,
        }
    }

    /// Wire `Req` value
    pub fn request(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::On => "On",
        }
    }

    /// Decode the `Operation` status field
    pub fn from_operation(operation: &str) -> Option<Self> {
        operation
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(|v| Self::from_domain(v).ok())
    }
}

impl TryFrom<u8> for ConvectorState {
    type Error = ProtocolError;

    fn try_from(value: u8) -> ProtocolResult<Self> {
        Self::from_domain(value)
    }
}

/// Schedule fields sent alongside a temperature change
///
/// The relay expects these on every `SetParams`. The defaults are what the
/// vendor client sent in captured traffic; they overwrite whatever schedule
/// the device currently has, so pass the device's real settings when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvectorSchedule {
    pub auto_time_set: String,
    pub rate1: String,
    pub rate2: String,
    pub system_settings: String,
    pub lock: String,
}

impl Default for ConvectorSchedule {
    fn default() -> Self {
        Self {
            auto_time_set: "1".to_string(),
            rate1: "06:00".to_string(),
            rate2: "22:00".to_string(),
            system_settings: "1, 2, 2, 0".to_string(),
            lock: "0".to_string(),
        }
    }
}

impl ConvectorSchedule {
    /// Wire fields in the order the relay expects them
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("AutoTimeSet", self.auto_time_set.as_str()),
            ("Rate1", self.rate1.as_str()),
            ("Rate2", self.rate2.as_str()),
            ("SystemSettings", self.system_settings.as_str()),
            ("Lock", self.lock.as_str()),
        ]
    }
}

/// Build a status request
pub fn status_command(pair_token: &str) -> Command {
    Command::builder(pair_token, GET_STATUS).build()
}

/// Build an on/off request
pub fn state_command(pair_token: &str, state: ConvectorState) -> Command {
    Command::builder(pair_token, state.request()).build()
}

/// Build a target temperature request (`degrees` in whole °C)
pub fn temperature_command(pair_token: &str, degrees: i32, schedule: &ConvectorSchedule) -> Command {
    Command::builder(pair_token, SET_PARAMS)
        .field("TSet", degrees.to_string())
        .fields(schedule.fields())
        .build()
}

/// Status snapshot of a convector heater
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvectorHeaterStatus {
    /// Device pair token
    #[serde(rename = "ID", default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Current temperature, tenths of a degree
    #[serde(rename = "T", default, deserialize_with = "lenient_string")]
    pub temperature_raw: String,
    /// Target temperature, tenths of a degree
    #[serde(rename = "TSet", default, deserialize_with = "lenient_string")]
    pub target_temperature_raw: String,
    /// Undocumented status code, passed through as-is
    #[serde(rename = "Status", default, deserialize_with = "lenient_string")]
    pub status: String,
    /// `"16"` on, `"0"` off
    #[serde(rename = "Operation", default, deserialize_with = "lenient_string")]
    pub operation: String,
}

impl ConvectorHeaterStatus {
    /// Current temperature in °C
    pub fn temperature(&self) -> Option<f64> {
        tenths(&self.temperature_raw)
    }

    /// Target temperature in °C
    pub fn target_temperature(&self) -> Option<f64> {
        tenths(&self.target_temperature_raw)
    }

    /// On/off state, if the device reported a known value
    pub fn state(&self) -> Option<ConvectorState> {
        ConvectorState::from_operation(&self.operation)
    }
}

fn tenths(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().map(|v| v / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_mapping() {
        assert_eq!(ConvectorState::from_domain(0).unwrap().request(), "Off");
        assert_eq!(ConvectorState::from_domain(16).unwrap().request(), "On");
        assert_eq!(ConvectorState::On.domain_value(), 16);
    }

    #[test]
    fn test_invalid_state() {
        for value in [1, 15, 17, 255] {
            let err = ConvectorState::try_from(value).unwrap_err();
            assert!(matches!(
                err,
                ProtocolError::InvalidDomainState {
                    family: DeviceFamily::ConvectorHeater,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_state_command() {
        let cmd = state_command("R7alOFhj9kDslr2X", ConvectorState::On);
        assert_eq!(
            cmd.to_json(),
            r#"{"ID":"R7alOFhj9kDslr2X","Req":"On","CID":"1","CRC":"EC378CF7"}"#
        );
    }

    #[test]
    fn test_temperature_command() {
        let cmd = temperature_command("R7alOFhj9kDslr2X", 22, &ConvectorSchedule::default());
        assert_eq!(
            cmd.fields().names(),
            vec![
                "ID",
                "Req",
                "TSet",
                "AutoTimeSet",
                "Rate1",
                "Rate2",
                "SystemSettings",
                "Lock",
                "CID",
                "CRC"
            ]
        );
        assert_eq!(cmd.get("TSet"), Some("22"));
        assert_eq!(cmd.crc(), "E0E35489");
    }

    #[test]
    fn test_custom_schedule_changes_stamp() {
        let schedule = ConvectorSchedule {
            lock: "1".to_string(),
            ..Default::default()
        };
        let cmd = temperature_command("R7alOFhj9kDslr2X", 22, &schedule);
        assert_eq!(cmd.get("Lock"), Some("1"));
        assert_ne!(cmd.crc(), "E0E35489");
        assert!(cmd.verify());
    }

    #[test]
    fn test_status_decode() {
        let status: ConvectorHeaterStatus = serde_json::from_value(json!({
            "ID": "R7alOFhj9kDslr2X",
            "T": "200",
            "TSet": 190,
            "Status": "1",
            "Operation": "16",
            "Unknown": "ignored"
        }))
        .unwrap();

        assert_eq!(status.temperature(), Some(20.0));
        assert_eq!(status.target_temperature(), Some(19.0));
        assert_eq!(status.state(), Some(ConvectorState::On));
        assert_eq!(status.status, "1");
    }

    #[test]
    fn test_status_decode_missing_fields() {
        let status: ConvectorHeaterStatus = serde_json::from_value(json!({})).unwrap();
        assert_eq!(status.temperature(), None);
        assert_eq!(status.state(), None);
    }
}
