//! Device families reachable through the direct-request relay

use std::fmt;

use serde::{Deserialize, Serialize};

/// Device family, carrying the wire behavior that differs between families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Convector heaters: plain JSON command bodies and responses
    ConvectorHeater,
    /// Flat boilers: bodies and responses wrapped in the encrypted envelope
    FlatBoiler,
}

impl DeviceFamily {
    /// Whether commands for this family travel inside the `{"Msg": ...}` envelope
    pub fn encrypted(self) -> bool {
        matches!(self, Self::FlatBoiler)
    }

    /// Human-readable family name
    pub fn name(self) -> &'static str {
        match self {
            Self::ConvectorHeater => "convector heater",
            Self::FlatBoiler => "flat boiler",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_per_family() {
        assert!(!DeviceFamily::ConvectorHeater.encrypted());
        assert!(DeviceFamily::FlatBoiler.encrypted());
    }
}
