//! Keydesk Common - Shared client model and API protocol
//!
//! This crate contains the client records exchanged with the backend API,
//! the route builders for its endpoints, and the change detection used by
//! the panel to decide when a re-render is needed.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Payload is a JSON-encoded string, expected a JSON body")]
    DoubleEncoded,
}

/// Backend identifier of a client
pub type ClientId = i64;

/// A registered API consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,

    /// Display name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Access key (empty until one has been generated)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key: String,
}

/// Body of create and rename requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
}

impl NewClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode the body of `GET /clients`
pub fn decode_clients(body: &str) -> Result<Vec<Client>, ProtocolError> {
    serde_json::from_str(body).map_err(|e| classify(body, e))
}

/// Decode a single client record
pub fn decode_client(body: &str) -> Result<Client, ProtocolError> {
    serde_json::from_str(body).map_err(|e| classify(body, e))
}

/// A body that parses as a JSON string was encoded twice by the sender.
fn classify(body: &str, err: serde_json::Error) -> ProtocolError {
    if serde_json::from_str::<String>(body).is_ok() {
        ProtocolError::DoubleEncoded
    } else {
        ProtocolError::Decode(err)
    }
}

/// `{base}/clients`
pub fn clients_url(base: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), constants::CLIENTS_PATH)
}

/// `{base}/clients/{id}`
pub fn client_url(base: &str, id: ClientId) -> String {
    format!("{}/{}", clients_url(base), id)
}

/// `{base}/clients/{id}/generate_key`
pub fn generate_key_url(base: &str, id: ClientId) -> String {
    format!("{}/{}", client_url(base, id), constants::GENERATE_KEY_PATH)
}

/// Ids of the most recently rendered client list.
///
/// The set is only ever replaced wholesale through [`KnownIds::rebuild`],
/// so its cardinality and membership always mirror the last render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIds {
    ids: HashSet<ClientId>,
}

impl KnownIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `current` needs a re-render.
    ///
    /// Only lengths and id membership are compared. A renamed client or a
    /// regenerated key under a known id is not a difference.
    pub fn is_different(&self, current: &[Client]) -> bool {
        current.len() != self.ids.len() || current.iter().any(|c| !self.ids.contains(&c.id))
    }

    /// Replace the set with the ids of `current`
    pub fn rebuild(&mut self, current: &[Client]) {
        self.ids = current.iter().map(|c| c.id).collect();
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Constants for the protocol
pub mod constants {
    /// Collection path under the API base
    pub const CLIENTS_PATH: &str = "clients";

    /// Key regeneration path under a client
    pub const GENERATE_KEY_PATH: &str = "generate_key";
}
