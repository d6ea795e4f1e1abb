//! The remote mailbox service boundary

use crate::error::Result;
use crate::folder::FolderId;
use crate::item::ItemId;
use crate::page::PageCursor;
use crate::response::{FindFoldersResponse, FindItemsResponse, GetItemsResponse};
use async_trait::async_trait;

/// One "find items" request: a window of item ids in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindItemsRequest {
    pub folder: FolderId,
    pub offset: u32,
    pub max_entries: u32,
}

impl FindItemsRequest {
    /// Build a request, clamping a negative offset to 0 and a
    /// `max_entries` below 1 to 1.
    #[must_use]
    pub fn new(folder: FolderId, offset: i64, max_entries: i64) -> Self {
        Self::at(folder, PageCursor::new(offset, max_entries))
    }

    #[must_use]
    pub const fn at(folder: FolderId, cursor: PageCursor) -> Self {
        Self {
            folder,
            offset: cursor.offset(),
            max_entries: cursor.page_size(),
        }
    }
}

/// A stateless request/response mail service.
///
/// Implementations return `Ok(None)` when the service produced no
/// response at all and `Err` only when the service could not be
/// reached. Status codes travel inside the response records.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Find the folders under `root`.
    async fn find_folders(&self, root: &FolderId) -> Result<Option<FindFoldersResponse>>;

    /// Find one window of item ids in a folder.
    async fn find_items(&self, request: &FindItemsRequest) -> Result<Option<FindItemsResponse>>;

    /// Fetch the full content of the given items.
    async fn get_items(&self, ids: &[ItemId]) -> Result<Option<GetItemsResponse>>;
}
