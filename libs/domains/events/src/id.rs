//! Event identity

use mongodb::bson::Bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store identity of an event.
///
/// Events created by this service get a UUID v7, stored as a hyphenated
/// string. Documents written to the collection by other tools usually carry an
/// ObjectId, which is kept as is so it can be matched in queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventId {
    Uuid(Uuid),
    ObjectId(ObjectId),
}

impl EventId {
    pub fn new() -> Self {
        Self::Uuid(Uuid::now_v7())
    }

    /// The value held in `_id`.
    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Uuid(id) => Bson::String(id.hyphenated().to_string()),
            Self::ObjectId(id) => Bson::ObjectId(*id),
        }
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Self::ObjectId(id) => f.write_str(&id.to_hex()),
        }
    }
}

impl FromStr for EventId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(raw) {
            return Ok(Self::Uuid(id));
        }
        ObjectId::parse_str(raw)
            .map(Self::ObjectId)
            .map_err(|_| format!("'{}' is neither a UUID nor an ObjectId", raw))
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // BSON keeps the native ObjectId; JSON clients get the hex string.
            Self::ObjectId(id) if !serializer.is_human_readable() => id.serialize(serializer),
            _ => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::String(raw) => raw.parse().map_err(de::Error::custom),
            Bson::ObjectId(id) => Ok(Self::ObjectId(id)),
            Bson::Binary(binary) => Uuid::from_slice(&binary.bytes)
                .map(Self::Uuid)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!("unsupported event id: {}", other))),
        }
    }
}
