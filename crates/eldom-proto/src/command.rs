//! Direct-request commands
//!
//! A command is an ordered set of string fields. The order in which fields are
//! added is part of the wire contract: the checksum is computed over the
//! literal serialized form, so the same fields in a different order produce a
//! different `CRC`.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::checksum::checksum;
use crate::error::ProtocolResult;

/// Channel id carried by every command
pub const CHANNEL_ID: &str = "1";

/// Field names shared by every command
pub mod field {
    /// Device pair token
    pub const ID: &str = "ID";
    /// Operation name
    pub const REQ: &str = "Req";
    /// Channel id
    pub const CID: &str = "CID";
    /// Checksum stamp, always last
    pub const CRC: &str = "CRC";

    /// Fields placed by the builder itself
    pub const RESERVED: [&str; 4] = [ID, REQ, CID, CRC];

    /// Whether `name` is placed by the builder rather than the caller
    pub fn is_reserved(name: &str) -> bool {
        RESERVED.contains(&name)
    }
}

/// Insertion-ordered string fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFields(Vec<(String, String)>);

impl CommandFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. An existing field keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON object text: no whitespace between tokens, insertion order kept
    pub fn to_json(&self) -> String {
        let members: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{}:{}", Value::from(k.as_str()), Value::from(v.as_str())))
            .collect();
        format!("{{{}}}", members.join(","))
    }
}

impl Serialize for CommandFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommandFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = CommandFields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a JSON object with string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = CommandFields::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    fields.insert(name, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// A checksum-stamped command, ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    fields: CommandFields,
}

impl Command {
    /// Start a command addressed to a device pair token
    pub fn builder(pair_token: impl Into<String>, request: impl Into<String>) -> CommandBuilder {
        let mut fields = CommandFields::new();
        fields.insert(field::ID, pair_token);
        fields.insert(field::REQ, request);
        CommandBuilder { fields }
    }

    /// Parse a command from its wire JSON, keeping field order
    ///
    /// The stamp is not checked; use [`Command::verify`] for that.
    pub fn parse(json: &str) -> ProtocolResult<Self> {
        let fields: CommandFields = serde_json::from_str(json)?;
        Ok(Self { fields })
    }

    /// Operation name (`Req`)
    pub fn request(&self) -> &str {
        self.fields.get(field::REQ).unwrap_or_default()
    }

    /// Device pair token (`ID`)
    pub fn device_id(&self) -> &str {
        self.fields.get(field::ID).unwrap_or_default()
    }

    /// Checksum stamp (`CRC`)
    pub fn crc(&self) -> &str {
        self.fields.get(field::CRC).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &CommandFields {
        &self.fields
    }

    /// Wire form of the command
    pub fn to_json(&self) -> String {
        self.fields.to_json()
    }

    /// Recompute the checksum over every field but `CRC` and compare
    pub fn verify(&self) -> bool {
        let mut unstamped = self.fields.clone();
        match unstamped.remove(field::CRC) {
            Some(crc) => checksum(&unstamped) == crc,
            None => false,
        }
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Builder for [`Command`]
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    fields: CommandFields,
}

impl CommandBuilder {
    /// Add a family-specific field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Add several fields in order
    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in fields {
            self.fields.insert(name, value);
        }
        self
    }

    /// Append `CID`, compute the checksum and append `CRC` last
    ///
    /// Any `CID` or `CRC` added earlier is dropped, so both always trail the
    /// family fields.
    pub fn build(mut self) -> Command {
        self.fields.remove(field::CRC);
        self.fields.remove(field::CID);
        self.fields.insert(field::CID, CHANNEL_ID);
        let crc = checksum(&self.fields);
        self.fields.insert(field::CRC, crc);
        Command {
            fields: self.fields,
        }
    }
}
