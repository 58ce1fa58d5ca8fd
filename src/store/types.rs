//! Conversation data model.
//!
//! All records serialize in camelCase so that persisted blobs and export files
//! stay interchangeable with the ASILTCOM web client's JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered message sequences keyed by contact id. A contact with no recorded
/// messages has no entry, not an empty one.
pub type MessageMap = BTreeMap<String, Vec<Message>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: u64,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub contact_id: String,
    pub sender: SenderRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: u64,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Contact,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Contact => "contact",
        }
    }
}

/// Delivery progress of a message. One-directional: once `Delivered` or `Read`
/// a message never reverts to `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}

/// Fields a profile edit may change on a contact. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
}

/// Per-contact social profile, persisted under its own storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProfile {
    pub followers: String,
    pub following: String,
    pub intro: String,
    #[serde(default)]
    pub is_friend: bool,
    #[serde(default)]
    pub friend_status: FriendStatus,
    #[serde(default)]
    pub stories: Vec<String>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    #[default]
    None,
    Requested,
    Friends,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub time_raw: u64,
    pub time_label: String,
    pub text: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub shares: u32,
    #[serde(default)]
    pub show_comments: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub time: String,
}
