//! Wire messages.
//!
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coord::Coordinate;
use crate::location::LocationFix;

use super::error::ChannelError;
use super::identity::ActorIdentity;

/// Outbound identification event.
pub const EVENT_IDENTIFY: &str = "connect-user";

/// Outbound location event.
pub const EVENT_LOCATION_UPDATE: &str = "location-update";

/// Inbound job assignment event (drivers).
pub const EVENT_JOB_ASSIGNMENT: &str = "job-assignment";

/// A framed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Identification sent right after every successful connect.
    pub fn identify(identity: &ActorIdentity, platform: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            EVENT_IDENTIFY,
            json!({
                "userId": identity.id(),
                "role": identity.role().as_str(),
                "timestamp": iso8601(at),
                "platform": platform,
            }),
        )
    }

    /// Location update keyed `driverId` or `riderId` by role.
    pub fn location(identity: &ActorIdentity, fix: &LocationFix) -> Self {
        let at = DateTime::<Utc>::from_timestamp_millis(fix.timestamp_millis()).unwrap_or_else(Utc::now);
        let mut data = serde_json::Map::new();
        data.insert(identity.role().location_key().to_string(), json!(identity.id()));
        data.insert("lat".to_string(), json!(fix.latitude()));
        data.insert("lng".to_string(), json!(fix.longitude()));
        data.insert("timestamp".to_string(), json!(iso8601(at)));
        Self::new(EVENT_LOCATION_UPDATE, Value::Object(data))
    }

    pub fn to_text(&self) -> Result<String, ChannelError> {
        serde_json::to_string(self).map_err(|e| ChannelError::Protocol(e.to_string()))
    }

    pub fn from_text(text: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(text).map_err(|e| ChannelError::Protocol(e.to_string()))
    }
}

fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A pickup or drop-off point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Waypoint {
    pub fn coordinate(&self) -> Result<Coordinate, ChannelError> {
        Coordinate::new(self.latitude, self.longitude)
            .map_err(|e| ChannelError::Protocol(format!("invalid waypoint: {}", e)))
    }
}

/// A trip assigned to the local driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAssignment {
    pub pickup: Waypoint,
    pub destination: Waypoint,
}

/// Category of inbound message, used as the dispatch key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    JobAssignment,
    /// Any other named event.
    Event(String),
}

impl MessageKind {
    pub fn from_event(event: &str) -> Self {
        match event {
            EVENT_JOB_ASSIGNMENT => Self::JobAssignment,
            other => Self::Event(other.to_string()),
        }
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    JobAssignment(JobAssignment),
    /// An event with no typed payload.
    Broadcast { event: String, data: Value },
}

impl InboundMessage {
    /// Decode an envelope. Malformed job payloads fall back to `Broadcast`
    /// so they stay observable.
    pub fn from_envelope(envelope: Envelope) -> Self {
        if envelope.event == EVENT_JOB_ASSIGNMENT {
            match serde_json::from_value::<JobAssignment>(envelope.data.clone()) {
                Ok(job) if job.pickup.coordinate().is_ok() && job.destination.coordinate().is_ok() => {
                    return Self::JobAssignment(job);
                }
                _ => tracing::warn!("Malformed job assignment payload"),
            }
        }
        Self::Broadcast {
            event: envelope.event,
            data: envelope.data,
        }
    }

    /// The dispatch key for this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::JobAssignment(_) => MessageKind::JobAssignment,
            Self::Broadcast { event, .. } => MessageKind::Event(event.clone()),
        }
    }

    pub fn event(&self) -> &str {
        match self {
            Self::JobAssignment(_) => EVENT_JOB_ASSIGNMENT,
            Self::Broadcast { event, .. } => event,
        }
    }

    /// One-line summary for status display.
    pub fn summary(&self) -> String {
        match self {
            Self::JobAssignment(job) => format!(
                "{}: {} -> {}",
                EVENT_JOB_ASSIGNMENT,
                job.pickup.address.as_deref().unwrap_or("pickup"),
                job.destination.address.as_deref().unwrap_or("destination"),
            ),
            Self::Broadcast { event, data } => format!("{}: {}", event, data),
        }
    }
}
