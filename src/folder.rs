//! Folder identifiers and folder enumeration
//!
//! A folder is named either by a well-known distinguished root
//! (inbox, sent items, the message folder root, ...) or by an opaque
//! identifier that the service handed back from a folder listing.

use crate::error::Result;
use crate::response::validate;
use crate::service::MailService;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// A well-known folder every mailbox has.
///
/// # Examples
///
/// ```
/// use mailbox_sync::DistinguishedFolder;
///
/// assert_eq!(DistinguishedFolder::Inbox.as_str(), "inbox");
/// assert_eq!(
///     DistinguishedFolder::parse("SentItems"),
///     Some(DistinguishedFolder::SentItems)
/// );
/// assert_eq!(DistinguishedFolder::parse("Projects"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinguishedFolder {
    Inbox,
    SentItems,
    Drafts,
    DeletedItems,
    JunkEmail,
    Archive,
    Outbox,
    /// Parent of every user-visible mail folder.
    MsgFolderRoot,
    /// Top of the whole folder hierarchy.
    Root,
}

impl DistinguishedFolder {
    const ALL: [Self; 9] = [
        Self::Inbox,
        Self::SentItems,
        Self::Drafts,
        Self::DeletedItems,
        Self::JunkEmail,
        Self::Archive,
        Self::Outbox,
        Self::MsgFolderRoot,
        Self::Root,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::SentItems => "sentitems",
            Self::Drafts => "drafts",
            Self::DeletedItems => "deleteditems",
            Self::JunkEmail => "junkemail",
            Self::Archive => "archive",
            Self::Outbox => "outbox",
            Self::MsgFolderRoot => "msgfolderroot",
            Self::Root => "root",
        }
    }

    /// Match a distinguished name, ignoring ASCII case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|folder| name.eq_ignore_ascii_case(folder.as_str()))
    }

    /// Whether this folder sits above the mail folders rather than
    /// being one of them.
    #[must_use]
    pub const fn is_hierarchy_root(self) -> bool {
        matches!(self, Self::MsgFolderRoot | Self::Root)
    }
}

impl fmt::Display for DistinguishedFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names a folder on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderId {
    Distinguished(DistinguishedFolder),
    /// An identifier resolved from a folder listing.
    Id(String),
}

impl FolderId {
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Distinguished(folder) => folder.as_str(),
            Self::Id(id) => id,
        }
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FolderId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<DistinguishedFolder> for FolderId {
    fn from(folder: DistinguishedFolder) -> Self {
        Self::Distinguished(folder)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        DistinguishedFolder::parse(s).map_or_else(|| Self::Id(s.to_string()), Self::Distinguished)
    }
}

impl From<String> for FolderId {
    fn from(s: String) -> Self {
        DistinguishedFolder::parse(&s).map_or(Self::Id(s), Self::Distinguished)
    }
}

/// List the folders under `root`, in the order the service returned
/// them.
///
/// A response without a root folder or folder array yields an empty
/// list. Entries that carry no identifier are skipped.
///
/// # Errors
///
/// Propagates transport errors and service faults unchanged.
pub async fn list_folders<S>(service: &S, root: &FolderId) -> Result<Vec<FolderId>>
where
    S: MailService + ?Sized,
{
    debug!("Finding folders under {}", root);
    let validated = validate(service.find_folders(root).await?)?;

    if !validated.outcome.has_folders {
        info!("No folders found under {}", root);
        return Ok(Vec::new());
    }
    let entries = validated
        .response
        .root_folder
        .and_then(|root_folder| root_folder.folders)
        .unwrap_or_default();

    let total = entries.len();
    let folders: Vec<FolderId> = entries
        .into_iter()
        .filter_map(|entry| {
            if entry.id.is_none() {
                warn!(
                    "Skipping folder {} without an id",
                    entry.display_name.as_deref().unwrap_or("<unnamed>")
                );
            }
            entry.id
        })
        .collect();

    info!("Found {} of {} folders under {}", folders.len(), total, root);
    Ok(folders)
}
