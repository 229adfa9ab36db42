//! Response shapes shared by device families

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Acknowledgment returned for state-changing requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeAck {
    /// Echo of the request name ("On", "Off", "SetParams", ...)
    #[serde(rename = "Res", default, deserialize_with = "lenient_string")]
    pub result: String,
    /// Execution code, "0" on success
    #[serde(rename = "Code", default, deserialize_with = "lenient_string")]
    pub code: String,
    /// Response type, e.g. "OK"
    #[serde(rename = "Type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    /// Reason, e.g. "SUCCESS"
    #[serde(rename = "Reason", default, deserialize_with = "lenient_string")]
    pub reason: String,
}

impl StateChangeAck {
    /// Whether the device reported success
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }

    /// Whether the response carried no fields at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accept a JSON string, number or bool and keep it as text
///
/// Firmware revisions disagree on whether numeric fields are quoted.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
