//! Export/import interchange payload.

use serde::{Deserialize, Serialize};

use crate::store::types::{Contact, MessageMap};
use crate::store::StoreError;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub version: String,
    pub exported_at: u64,
}

/// Full {contacts, messages} aggregate as an interchange document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub contacts: Vec<Contact>,
    pub messages: MessageMap,
    pub meta: SnapshotMeta,
}

impl SnapshotPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    contacts: Option<Vec<Contact>>,
    messages: Option<MessageMap>,
    meta: Option<SnapshotMeta>,
}

/// Parses an interchange document. Both `contacts` and `messages` must be
/// present; absence of either is a hard validation failure.
pub fn parse_snapshot(json: &str) -> Result<SnapshotPayload, StoreError> {
    let raw: RawSnapshot =
        serde_json::from_str(json).map_err(|err| StoreError::MalformedSnapshot(err.to_string()))?;

    let contacts = raw
        .contacts
        .ok_or(StoreError::IncompleteSnapshot("contacts"))?;
    let messages = raw
        .messages
        .ok_or(StoreError::IncompleteSnapshot("messages"))?;

    Ok(SnapshotPayload {
        contacts,
        messages,
        meta: raw.meta.unwrap_or(SnapshotMeta {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: 0,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_json_payload() {
        match parse_snapshot("not json at all") {
            Err(StoreError::MalformedSnapshot(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_contacts() {
        match parse_snapshot(r#"{"messages": {}}"#) {
            Err(StoreError::IncompleteSnapshot("contacts")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_messages() {
        match parse_snapshot(r#"{"contacts": []}"#) {
            Err(StoreError::IncompleteSnapshot("messages")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_meta_defaults_to_current_version() {
        let payload =
            parse_snapshot(r#"{"contacts": [], "messages": {}}"#).expect("valid snapshot");
        assert_eq!(payload.meta.version, SNAPSHOT_VERSION);
        assert_eq!(payload.meta.exported_at, 0);
    }
}
