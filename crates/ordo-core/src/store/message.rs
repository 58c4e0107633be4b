//! Remote store protocol message types
//!
//! Messages exchanged with an ordo record server using CBOR encoding.
//! The client opens with a hello carrying its access claim; the server
//! answers with a welcome, then pushes full collection snapshots and
//! acknowledges each write request by request id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AccessMode;
use crate::models::Item;

/// Client ID for identifying this session
pub type ClientId = String;

/// Protocol version
pub const PROTOCOL_V1: &str = "1";

/// Messages sent to the record server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Handshake carrying the access claim
    #[serde(rename = "hello")]
    Hello {
        #[serde(rename = "senderId")]
        sender_id: ClientId,
        access: AccessMode,
        #[serde(rename = "supportedProtocolVersions")]
        supported_protocol_versions: Vec<String>,
    },

    /// Create a record; the server assigns the id
    #[serde(rename = "create")]
    Create {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        content: String,
        order: i64,
    },

    /// Partial update of a record's order key
    #[serde(rename = "update")]
    Update {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        id: Uuid,
        order: i64,
    },

    /// Delete a record
    #[serde(rename = "delete")]
    Delete {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        id: Uuid,
    },
}

/// Messages received from the record server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Handshake response
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(rename = "senderId")]
        sender_id: ClientId,
        #[serde(rename = "selectedProtocolVersion")]
        selected_protocol_version: String,
    },

    /// Full collection snapshot, pushed after every committed change
    #[serde(rename = "snapshot")]
    Snapshot { items: Vec<Item> },

    /// A write request succeeded; `item` is set for creates
    #[serde(rename = "ack")]
    Ack {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        item: Option<Item>,
    },

    /// A write request failed
    #[serde(rename = "refused")]
    Refused {
        #[serde(rename = "requestId")]
        request_id: Uuid,
        message: String,
    },

    /// The access claim was rejected
    #[serde(rename = "denied")]
    Denied { message: String },
}

impl ClientMessage {
    /// Create a hello message
    pub fn hello(sender_id: &str, access: AccessMode) -> Self {
        ClientMessage::Hello {
            sender_id: sender_id.to_string(),
            access,
            supported_protocol_versions: vec![PROTOCOL_V1.to_string()],
        }
    }

    /// Create a create-record message
    pub fn create(request_id: Uuid, content: &str, order: i64) -> Self {
        ClientMessage::Create {
            request_id,
            content: content.to_string(),
            order,
        }
    }

    /// Create an order-update message
    pub fn update(request_id: Uuid, id: Uuid, order: i64) -> Self {
        ClientMessage::Update {
            request_id,
            id,
            order,
        }
    }

    /// Create a delete message
    pub fn delete(request_id: Uuid, id: Uuid) -> Self {
        ClientMessage::Delete { request_id, id }
    }

    /// Encode message to CBOR bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).expect("CBOR encoding failed");
        bytes
    }
}

impl ServerMessage {
    /// Decode message from CBOR bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_message_encoding() {
        let msg = ClientMessage::hello("ordo-abc123", AccessMode::SharedKey { key: "k".into() });
        let bytes = msg.encode();

        // Should be non-empty CBOR
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_write_message_encoding() {
        let msg = ClientMessage::update(Uuid::new_v4(), Uuid::new_v4(), 2000);
        assert!(!msg.encode().is_empty());

        let msg = ClientMessage::create(Uuid::new_v4(), "buy milk", 1000);
        assert!(!msg.encode().is_empty());
    }

    #[test]
    fn test_snapshot_decoding() {
        let msg = ServerMessage::Snapshot {
            items: vec![Item::new("a", 1000), Item::new("b", 2000)],
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&msg, &mut bytes).unwrap();
        let decoded = ServerMessage::decode(&bytes).unwrap();

        match decoded {
            ServerMessage::Snapshot { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].content, "a");
            }
            _ => panic!("Expected Snapshot message"),
        }
    }

    #[test]
    fn test_ack_decoding() {
        let request_id = Uuid::new_v4();
        let msg = ServerMessage::Ack {
            request_id,
            item: Some(Item::new("created", 1000)),
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&msg, &mut bytes).unwrap();

        match ServerMessage::decode(&bytes).unwrap() {
            ServerMessage::Ack {
                request_id: rid,
                item,
            } => {
                assert_eq!(rid, request_id);
                assert_eq!(item.unwrap().content, "created");
            }
            _ => panic!("Expected Ack message"),
        }
    }
}
