//! Item identifiers and the normalized mailbox item

use crate::response::RawItem;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Header holding the item's identifier.
pub const ITEM_ID_HEADER: &str = "Item ID";
pub const SENDER_HEADER: &str = "Sender";
pub const TO_HEADER: &str = "To";
pub const CC_HEADER: &str = "Cc";
pub const BCC_HEADER: &str = "Bcc";
pub const SUBJECT_HEADER: &str = "Subject";
pub const TIME_SENT_HEADER: &str = "Time Sent";
pub const BODY_HEADER: &str = "Body";

/// Opaque identifier of one remote item, valid for a single
/// enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A mail item normalized from whatever the remote service returned.
///
/// Besides the typed fields, every item carries a header map. The
/// normalized fields are mirrored into it under [`ITEM_ID_HEADER`],
/// [`SUBJECT_HEADER`] and friends so that storage can treat every
/// value as a named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailboxItem {
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub time_sent: Option<DateTime<Utc>>,
    headers: HashMap<String, String>,
}

impl MailboxItem {
    /// Look up a header value by name.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// All header names, sorted.
    #[must_use]
    pub fn header_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The item's identifier, read back from its headers.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.header(ITEM_ID_HEADER)
    }
}

impl From<RawItem> for MailboxItem {
    fn from(raw: RawItem) -> Self {
        let mut headers: HashMap<String, String> = raw
            .headers
            .into_iter()
            .filter(|(key, _)| !is_normalized(key))
            .collect();

        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                headers.insert(key.to_string(), value);
            }
        };
        set(ITEM_ID_HEADER, raw.id.map(|id| id.0));
        set(SENDER_HEADER, raw.sender.clone());
        set(TO_HEADER, join(&raw.recipients));
        set(CC_HEADER, join(&raw.cc));
        set(BCC_HEADER, join(&raw.bcc));
        set(SUBJECT_HEADER, raw.subject.clone());
        set(
            TIME_SENT_HEADER,
            raw.time_sent
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        set(BODY_HEADER, raw.body.clone());

        Self {
            sender: raw.sender,
            recipients: raw.recipients,
            cc: raw.cc,
            bcc: raw.bcc,
            subject: raw.subject,
            body: raw.body,
            time_sent: raw.time_sent,
            headers,
        }
    }
}

const NORMALIZED_HEADERS: [&str; 8] = [
    ITEM_ID_HEADER,
    SENDER_HEADER,
    TO_HEADER,
    CC_HEADER,
    BCC_HEADER,
    SUBJECT_HEADER,
    TIME_SENT_HEADER,
    BODY_HEADER,
];

/// Whether `key` names a header that normalization owns, ignoring case.
fn is_normalized(key: &str) -> bool {
    NORMALIZED_HEADERS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(key))
}

fn join(addresses: &[String]) -> Option<String> {
    if addresses.is_empty() {
        None
    } else {
        Some(addresses.join(", "))
    }
}
