//! Access modes for the record store boundary
//!
//! Two authorization policies are interchangeable at the store boundary:
//! owner-scoped (each signed-in user sees only their own items) and
//! shared-key (anyone holding the key sees the same collection). The list
//! manager is identical under either policy; the access mode only travels
//! in the remote handshake.

use serde::{Deserialize, Serialize};

/// Authorization policy presented to a remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum AccessMode {
    /// Owner-scoped access: the token identifies a signed-in user and the
    /// store limits visibility to that user's items
    Owner {
        /// Opaque session token issued by the identity provider
        token: String,
    },
    /// Shared-key access: all items are visible and writable to any holder
    /// of the key, no per-user identity required
    SharedKey {
        /// The shared access key
        key: String,
    },
}

impl AccessMode {
    /// Build an access mode from configuration.
    ///
    /// A configured `access_key` selects shared-key access; otherwise an
    /// owner token is required.
    pub fn from_parts(access_key: Option<String>, token: Option<String>) -> Option<Self> {
        match (access_key, token) {
            (Some(key), _) => Some(AccessMode::SharedKey { key }),
            (None, Some(token)) => Some(AccessMode::Owner { token }),
            (None, None) => None,
        }
    }

    /// Short label for status output
    pub fn label(&self) -> &'static str {
        match self {
            AccessMode::Owner { .. } => "owner",
            AccessMode::SharedKey { .. } => "shared-key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_key_takes_precedence() {
        let mode = AccessMode::from_parts(Some("k".into()), Some("t".into())).unwrap();
        assert_eq!(mode, AccessMode::SharedKey { key: "k".into() });
    }

    #[test]
    fn test_owner_from_token() {
        let mode = AccessMode::from_parts(None, Some("t".into())).unwrap();
        assert_eq!(mode.label(), "owner");
    }

    #[test]
    fn test_no_credentials() {
        assert!(AccessMode::from_parts(None, None).is_none());
    }

    #[test]
    fn test_serialization_tags() {
        let mode = AccessMode::SharedKey { key: "k".into() };
        let json = serde_json::to_string(&mode).unwrap();
        assert!(json.contains("shared-key"));
        let back: AccessMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mode);
    }
}
