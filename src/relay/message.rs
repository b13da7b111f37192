// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay wire messages
//!
//! Every frame is a JSON array whose first element names the message type.

use serde_json::{json, Value};

use super::error::RelayError;
use crate::event::{Event, Filter};

/// Messages sent from client to relay
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `["REQ", <subscription_id>, <filter>...]`
    Req {
        subscription_id: String,
        filters: Vec<Filter>,
    },
    /// `["EVENT", <event>]`
    Event(Box<Event>),
    /// `["CLOSE", <subscription_id>]`
    Close(String),
}

/// Messages sent from relay to client
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    /// End of stored events
    Eose { subscription_id: String },
    Closed {
        subscription_id: String,
        message: String,
    },
    Notice { message: String },
}

fn protocol(reason: impl Into<String>) -> RelayError {
    RelayError::Protocol(reason.into())
}

fn parse_frame(json: &str) -> Result<Vec<Value>, RelayError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(items)) if !items.is_empty() => Ok(items),
        Ok(_) => Err(protocol("frame is not a non-empty JSON array")),
        Err(e) => Err(protocol(format!("invalid JSON: {}", e))),
    }
}

fn string_at(items: &[Value], index: usize, field: &str) -> Result<String, RelayError> {
    items
        .get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| protocol(format!("missing {}", field)))
}

fn event_at(items: &[Value], index: usize) -> Result<Box<Event>, RelayError> {
    let value = items.get(index).cloned().ok_or_else(|| protocol("missing event"))?;
    serde_json::from_value(value)
        .map(Box::new)
        .map_err(|e| protocol(format!("invalid event: {}", e)))
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, RelayError> {
        let value = match self {
            ClientMessage::Req {
                subscription_id,
                filters,
            } => {
                let mut frame = vec![json!("REQ"), json!(subscription_id)];
                for filter in filters {
                    frame.push(serde_json::to_value(filter).map_err(|e| protocol(e.to_string()))?);
                }
                Value::Array(frame)
            }
            ClientMessage::Event(event) => json!(["EVENT", event]),
            ClientMessage::Close(subscription_id) => json!(["CLOSE", subscription_id]),
        };
        Ok(value.to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let items = parse_frame(json)?;
        match items[0].as_str() {
            Some("REQ") => {
                let subscription_id = string_at(&items, 1, "subscription id")?;
                let filters = items[2..]
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()))
                    .collect::<Result<Vec<Filter>, _>>()
                    .map_err(|e| protocol(format!("invalid filter: {}", e)))?;
                Ok(ClientMessage::Req {
                    subscription_id,
                    filters,
                })
            }
            Some("EVENT") => Ok(ClientMessage::Event(event_at(&items, 1)?)),
            Some("CLOSE") => Ok(ClientMessage::Close(string_at(&items, 1, "subscription id")?)),
            other => Err(protocol(format!("unknown client message {:?}", other))),
        }
    }
}

impl RelayMessage {
    pub fn to_json(&self) -> String {
        match self {
            RelayMessage::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]),
            RelayMessage::Ok {
                event_id,
                accepted,
                message,
            } => json!(["OK", event_id, accepted, message]),
            RelayMessage::Eose { subscription_id } => json!(["EOSE", subscription_id]),
            RelayMessage::Closed {
                subscription_id,
                message,
            } => json!(["CLOSED", subscription_id, message]),
            RelayMessage::Notice { message } => json!(["NOTICE", message]),
        }
        .to_string()
    }

    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let items = parse_frame(json)?;
        match items[0].as_str() {
            Some("EVENT") => Ok(RelayMessage::Event {
                subscription_id: string_at(&items, 1, "subscription id")?,
                event: event_at(&items, 2)?,
            }),
            Some("OK") => Ok(RelayMessage::Ok {
                event_id: string_at(&items, 1, "event id")?,
                accepted: items
                    .get(2)
                    .and_then(Value::as_bool)
                    .ok_or_else(|| protocol("missing OK status"))?,
                message: items.get(3).and_then(Value::as_str).unwrap_or_default().to_string(),
            }),
            Some("EOSE") => Ok(RelayMessage::Eose {
                subscription_id: string_at(&items, 1, "subscription id")?,
            }),
            Some("CLOSED") => Ok(RelayMessage::Closed {
                subscription_id: string_at(&items, 1, "subscription id")?,
                message: items.get(2).and_then(Value::as_str).unwrap_or_default().to_string(),
            }),
            Some("NOTICE") => Ok(RelayMessage::Notice {
                message: string_at(&items, 1, "notice")?,
            }),
            other => Err(protocol(format!("unknown relay message {:?}", other))),
        }
    }
}
