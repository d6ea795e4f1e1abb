//! Plain response records and their validation
//!
//! A [`MailService`](crate::MailService) fills these records from
//! whatever wire format it speaks. Optional substructures are modelled
//! as `Option` fields: `None` means the service left them out, which
//! is reported by [`validate`] but is not an error on its own.

use crate::error::{Fault, Result};
use crate::folder::FolderId;
use crate::item::ItemId;
use chrono::{DateTime, Utc};

/// Status code attached to every service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    /// Any other code, by name. All of them are fatal.
    Error(String),
}

impl ResponseCode {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::NoError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindFoldersResponse {
    pub code: ResponseCode,
    pub root_folder: Option<FolderSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSet {
    pub folders: Option<Vec<FolderEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: Option<FolderId>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindItemsResponse {
    pub code: ResponseCode,
    pub root_folder: Option<ItemSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    pub items: Option<Vec<ItemEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub id: Option<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetItemsResponse {
    pub code: ResponseCode,
    pub items: Option<Vec<RawItem>>,
}

/// One item as returned by the service, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub id: Option<ItemId>,
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub time_sent: Option<DateTime<Utc>>,
    /// Internet headers in the order the message carried them.
    pub headers: Vec<(String, String)>,
}

/// Which optional substructures a successful response carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub has_root_folder: bool,
    pub has_items: bool,
    pub has_folders: bool,
}

/// Common view over the three response records.
pub trait ServiceResponse {
    fn code(&self) -> &ResponseCode;
    fn outcome(&self) -> ResponseOutcome;
}

impl ServiceResponse for FindFoldersResponse {
    fn code(&self) -> &ResponseCode {
        &self.code
    }

    fn outcome(&self) -> ResponseOutcome {
        ResponseOutcome {
            has_root_folder: self.root_folder.is_some(),
            has_folders: self
                .root_folder
                .as_ref()
                .is_some_and(|root| root.folders.is_some()),
            ..ResponseOutcome::default()
        }
    }
}

impl ServiceResponse for FindItemsResponse {
    fn code(&self) -> &ResponseCode {
        &self.code
    }

    fn outcome(&self) -> ResponseOutcome {
        ResponseOutcome {
            has_root_folder: self.root_folder.is_some(),
            has_items: self
                .root_folder
                .as_ref()
                .is_some_and(|root| root.items.is_some()),
            ..ResponseOutcome::default()
        }
    }
}

impl ServiceResponse for GetItemsResponse {
    fn code(&self) -> &ResponseCode {
        &self.code
    }

    fn outcome(&self) -> ResponseOutcome {
        ResponseOutcome {
            has_items: self.items.is_some(),
            ..ResponseOutcome::default()
        }
    }
}

/// A response that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<R> {
    pub outcome: ResponseOutcome,
    pub response: R,
}

/// Interpret the outcome of one remote call.
///
/// # Errors
///
/// Returns [`Fault::NullResponse`] when `response` is `None` and
/// [`Fault::ErrorResponse`] when its status code is not
/// [`ResponseCode::NoError`].
pub fn validate<R: ServiceResponse>(response: Option<R>) -> Result<Validated<R>> {
    let response = response.ok_or(Fault::NullResponse)?;
    match response.code() {
        ResponseCode::NoError => Ok(Validated {
            outcome: response.outcome(),
            response,
        }),
        ResponseCode::Error(code) => Err(Fault::ErrorResponse(code.clone()).into()),
    }
}
