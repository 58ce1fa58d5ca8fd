//! Conversation store: the single source of truth for contacts and messages.
//!
//! Every state-changing operation is written through to the storage
//! collaborator immediately. Storage failures are logged and never surfaced;
//! the store always holds some valid in-memory state, with seed data as the
//! ultimate fallback.

pub mod seed;
pub mod snapshot;
pub mod storage;
pub mod types;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite;


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::store::snapshot::{SnapshotMeta, SnapshotPayload, SNAPSHOT_VERSION};
use crate::store::storage::StorageBackend;
use crate::store::types::{
    Contact, ContactUpdate, DeliveryStatus, Message, MessageMap, SenderRole, SocialProfile,
};
use crate::telemetry::events::{record_snapshot_imported, record_store_write_failure};

pub const CONTACTS_KEY: &str = "asiltcom_contacts";
pub const MESSAGES_KEY: &str = "asiltcom_messages";
pub const PROFILE_KEY_PREFIX: &str = "asiltcom_social_profile_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("contact name must not be blank")]
    BlankName,
    #[error("phone number must not be blank")]
    BlankPhoneNumber,
    #[error("not a valid universal phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("unknown contact id: {0}")]
    UnknownContact(String),
    #[error("snapshot payload is not valid JSON: {0}")]
    MalformedSnapshot(String),
    #[error("snapshot payload is missing the `{0}` field")]
    IncompleteSnapshot(&'static str),
}

struct StoreState {
    contacts: Vec<Contact>,
    messages: MessageMap,
    active_contact: Option<String>,
}

pub struct ConversationStore {
    storage: Arc<dyn StorageBackend>,
    state: Mutex<StoreState>,
}

impl ConversationStore {
    /// Builds the store from persisted data, merging in seed entries that the
    /// persisted roster does not know yet. Absent or malformed persisted data
    /// falls back to seed data without erroring.
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let now = epoch_millis();

        let contacts = match read_key::<Vec<Contact>>(storage.as_ref(), CONTACTS_KEY) {
            Some(persisted) => merge_seed_contacts(seed::contacts(now), persisted),
            None => seed::contacts(now),
        };

        let messages = match read_key::<MessageMap>(storage.as_ref(), MESSAGES_KEY) {
            Some(mut persisted) => {
                for (contact_id, thread) in seed::messages(now) {
                    persisted.entry(contact_id).or_insert(thread);
                }
                persisted
            }
            None => seed::messages(now),
        };

        Self {
            storage,
            state: Mutex::new(StoreState {
                contacts,
                messages,
                active_contact: None,
            }),
        }
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.lock_state().contacts.clone()
    }

    pub fn contact(&self, id: &str) -> Option<Contact> {
        self.lock_state()
            .contacts
            .iter()
            .find(|contact| contact.id == id)
            .cloned()
    }

    /// Message sequence for one contact, empty if none has been recorded.
    pub fn messages(&self, contact_id: &str) -> Vec<Message> {
        self.lock_state()
            .messages
            .get(contact_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn active_contact(&self) -> Option<String> {
        self.lock_state().active_contact.clone()
    }

    /// Appends a message to a contact's sequence and updates the contact's
    /// preview, timestamp and unread counter. The unread counter only grows
    /// for contact-sender messages on a conversation that is not active;
    /// everything else resets it to zero. The roster re-sorts most recent
    /// first, and both keys are written through.
    pub fn append_message(
        &self,
        contact_id: &str,
        sender: SenderRole,
        text: &str,
        image_url: Option<String>,
    ) -> Result<Message, StoreError> {
        let mut state = self.lock_state();

        if !state.contacts.iter().any(|c| c.id == contact_id) {
            return Err(StoreError::UnknownContact(contact_id.to_string()));
        }

        let message = Message {
            id: fresh_id("msg"),
            contact_id: contact_id.to_string(),
            sender,
            text: text.to_string(),
            image_url,
            timestamp: epoch_millis(),
            status: match sender {
                SenderRole::User => DeliveryStatus::Sent,
                SenderRole::Contact => DeliveryStatus::Delivered,
            },
        };

        state
            .messages
            .entry(contact_id.to_string())
            .or_default()
            .push(message.clone());

        let is_active = state.active_contact.as_deref() == Some(contact_id);
        if let Some(contact) = state.contacts.iter_mut().find(|c| c.id == contact_id) {
            contact.last_message = message.text.clone();
            contact.last_message_time = message.timestamp;
            contact.unread_count = if sender == SenderRole::Contact && !is_active {
                contact.unread_count + 1
            } else {
                0
            };
        }

        state
            .contacts
            .sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));

        self.persist_contacts(&state);
        self.persist_messages(&state);

        Ok(message)
    }

    /// Marks a contact as the active conversation and clears its unread
    /// counter. Idempotent: repeated calls are no-ops beyond the reset.
    pub fn select_contact(&self, contact_id: &str) -> Result<(), StoreError> {
        let mut state = self.lock_state();

        let contact = state
            .contacts
            .iter_mut()
            .find(|c| c.id == contact_id)
            .ok_or_else(|| StoreError::UnknownContact(contact_id.to_string()))?;
        contact.unread_count = 0;
        state.active_contact = Some(contact_id.to_string());

        self.persist_contacts(&state);
        Ok(())
    }

    pub fn clear_active(&self) {
        self.lock_state().active_contact = None;
    }

    /// Creates a contact from validated input and prepends it to the roster.
    /// Validation failure mutates nothing.
    pub fn add_contact(&self, name: &str, phone_number: &str) -> Result<Contact, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::BlankName);
        }
        if phone_number.trim().is_empty() {
            return Err(StoreError::BlankPhoneNumber);
        }
        if !is_valid_phone_number(phone_number) {
            return Err(StoreError::InvalidPhoneNumber(phone_number.to_string()));
        }

        let contact = Contact {
            id: fresh_id("contact"),
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            avatar_url: None,
            cover_url: None,
            last_message: String::new(),
            last_message_time: epoch_millis(),
            unread_count: 0,
        };

        let mut state = self.lock_state();
        state.contacts.insert(0, contact.clone());
        self.persist_contacts(&state);

        Ok(contact)
    }

    /// Applies a profile edit to an existing contact.
    pub fn update_contact(&self, contact_id: &str, update: ContactUpdate) -> Result<Contact, StoreError> {
        let mut state = self.lock_state();

        let contact = state
            .contacts
            .iter_mut()
            .find(|c| c.id == contact_id)
            .ok_or_else(|| StoreError::UnknownContact(contact_id.to_string()))?;

        if let Some(name) = update.name {
            contact.name = name;
        }
        if let Some(avatar_url) = update.avatar_url {
            contact.avatar_url = Some(avatar_url);
        }
        if let Some(cover_url) = update.cover_url {
            contact.cover_url = Some(cover_url);
        }
        let updated = contact.clone();

        self.persist_contacts(&state);
        Ok(updated)
    }

    /// Snapshot of the full aggregate with a version tag and export timestamp.
    pub fn export_snapshot(&self) -> SnapshotPayload {
        let state = self.lock_state();
        SnapshotPayload {
            contacts: state.contacts.clone(),
            messages: state.messages.clone(),
            meta: SnapshotMeta {
                version: SNAPSHOT_VERSION.to_string(),
                exported_at: epoch_millis(),
            },
        }
    }

    /// Replaces the full aggregate from an interchange document. All or
    /// nothing: a validation failure leaves current state untouched.
    pub fn import_snapshot(&self, json: &str) -> Result<(), StoreError> {
        let payload = snapshot::parse_snapshot(json)?;

        let mut state = self.lock_state();
        state.contacts = payload.contacts;
        state.messages = payload.messages;
        state.active_contact = None;

        record_snapshot_imported(state.contacts.len(), state.messages.len());
        self.persist_contacts(&state);
        self.persist_messages(&state);
        Ok(())
    }

    /// Persists a contact's social profile under its own storage key.
    pub fn save_profile(&self, contact_id: &str, profile: &SocialProfile) -> Result<(), StoreError> {
        if self.contact(contact_id).is_none() {
            return Err(StoreError::UnknownContact(contact_id.to_string()));
        }
        self.persist_value(&profile_key(contact_id), profile);
        Ok(())
    }

    /// Loads a contact's social profile. Absent or malformed data reads as
    /// `None`; the caller regenerates a default profile in that case.
    pub fn load_profile(&self, contact_id: &str) -> Option<SocialProfile> {
        read_key::<SocialProfile>(self.storage.as_ref(), &profile_key(contact_id))
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist_contacts(&self, state: &StoreState) {
        self.persist_value(CONTACTS_KEY, &state.contacts);
    }

    fn persist_messages(&self, state: &StoreState) {
        self.persist_value(MESSAGES_KEY, &state.messages);
    }

    fn persist_value<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(target: "conversation_store", key, %err, "failed to serialize state");
                record_store_write_failure(key, &err.to_string());
                return;
            }
        };

        if let Err(err) = self.storage.set(key, &json) {
            warn!(target: "conversation_store", key, %err, "failed to write through to storage");
            record_store_write_failure(key, &err.to_string());
        }
    }
}

fn profile_key(contact_id: &str) -> String {
    format!("{PROFILE_KEY_PREFIX}{contact_id}")
}

fn read_key<T: DeserializeOwned>(storage: &dyn StorageBackend, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(target: "conversation_store", key, %err, "storage read failed, using fallback");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target: "conversation_store",
                key,
                %err,
                "persisted data is malformed, using fallback"
            );
            None
        }
    }
}

/// Seed contacts missing from the persisted roster are prepended; persisted
/// contacts win on id collision.
fn merge_seed_contacts(seed: Vec<Contact>, persisted: Vec<Contact>) -> Vec<Contact> {
    let mut merged: Vec<Contact> = seed
        .into_iter()
        .filter(|candidate| !persisted.iter().any(|c| c.id == candidate.id))
        .collect();
    merged.extend(persisted);
    merged
}

/// Permissive universal-number shape: optional `+`, an optional parenthesised
/// group of one to four leading digits, then digits, spaces, hyphens, dots and
/// slashes.
fn is_valid_phone_number(raw: &str) -> bool {
    let mut rest = raw;
    rest = rest.strip_prefix('+').unwrap_or(rest);

    let parenthesised = rest.starts_with('(');
    if parenthesised {
        rest = &rest[1..];
    }

    let leading_digits = rest.chars().take_while(char::is_ascii_digit).count();
    if leading_digits == 0 {
        return false;
    }

    if parenthesised {
        if leading_digits > 4 {
            return false;
        }
        rest = &rest[leading_digits..];
        match rest.strip_prefix(')') {
            Some(tail) => rest = tail,
            None => return false,
        }
    }

    rest.chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '.' | '/'))
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn fresh_id(prefix: &str) -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{seq}", epoch_millis())
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
