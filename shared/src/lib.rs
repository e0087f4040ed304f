//! Wire protocol shared by the relay server, the test client and the integration tests.
//!
//! Every frame is a JSON object carrying a `type` tag. Inbound frames decode once
//! into [`ClientMessage`]; everything the server emits is a [`ServerMessage`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 30;
pub const DEFAULT_WORLD_WIDTH: u32 = 800;
pub const DEFAULT_WORLD_HEIGHT: u32 = 600;

/// Name of the single broadcast topic every session subscribes to.
pub const EVENTS_TOPIC: &str = "events";

pub type SessionId = u64;

/// The shared target coordinate.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Beacon {
    pub x: u32,
    pub y: u32,
}

impl Beacon {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("message has no string `type` field")]
    MissingType,
}

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Hello,
    /// Opaque game event; holds every field of the frame except `type`.
    Event(Map<String, Value>),
    Beacon,
    /// A well-formed frame whose `type` the relay does not recognise.
    Unknown(String),
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(ProtocolError::NotAnObject(json_kind(&other))),
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(ProtocolError::MissingType),
        };

        Ok(match kind.as_str() {
            "hello" => ClientMessage::Hello,
            "event" => ClientMessage::Event(fields),
            "beacon" => ClientMessage::Beacon,
            _ => ClientMessage::Unknown(kind),
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            ClientMessage::Hello => "hello",
            ClientMessage::Event(_) => "event",
            ClientMessage::Beacon => "beacon",
            ClientMessage::Unknown(kind) => kind.as_str(),
        }
    }

    pub fn encode(&self) -> String {
        let mut fields = match self {
            ClientMessage::Event(fields) => fields.clone(),
            _ => Map::new(),
        };
        fields.insert("type".to_string(), Value::String(self.kind().to_string()));
        Value::Object(fields).to_string()
    }
}

/// A frame sent by the relay, either directly to one session or through the hub.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Hello {
        ticks: f64,
        id: SessionId,
        beacon: Beacon,
    },
    /// Relayed event: the sender's fields plus its session `id`.
    Event(Map<String, Value>),
    Beacon {
        id: SessionId,
        beacon: Beacon,
    },
}

impl ServerMessage {
    /// Stamps the sender's session id onto an event payload.
    ///
    /// A client-supplied `id` field is overwritten so receivers can always trust it.
    pub fn event(mut fields: Map<String, Value>, sender: SessionId) -> Self {
        fields.remove("type");
        fields.insert("id".to_string(), Value::from(sender));
        ServerMessage::Event(fields)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
