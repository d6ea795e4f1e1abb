//! Offset-based pagination over a folder's item ids
//!
//! Each page is one stateless "find items" call. The position in the
//! folder lives in a [`PageCursor`] value that every step consumes and
//! hands back, so a pagination can be stopped and resumed from a
//! remembered cursor.

use crate::error::{Error, Result};
use crate::folder::FolderId;
use crate::item::ItemId;
use crate::response::validate;
use crate::service::{FindItemsRequest, MailService};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

/// Position of the next page: where it starts and how many entries to
/// ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: u32,
    page_size: u32,
}

impl PageCursor {
    /// A cursor at `offset` asking for `page_size` entries per page.
    ///
    /// A negative offset clamps to 0 and a page size below 1 clamps
    /// to 1.
    ///
    /// ```
    /// use mailbox_sync::PageCursor;
    ///
    /// let cursor = PageCursor::new(-4, 0);
    /// assert_eq!(cursor.offset(), 0);
    /// assert_eq!(cursor.page_size(), 1);
    /// ```
    #[must_use]
    pub fn new(offset: i64, page_size: i64) -> Self {
        Self {
            offset: clamp_to_u32(offset, 0),
            page_size: clamp_to_u32(page_size, 1),
        }
    }

    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// The cursor after a page that returned `returned` entries.
    #[must_use]
    pub fn advance(self, returned: usize) -> Self {
        let returned = u32::try_from(returned).unwrap_or(u32::MAX);
        Self {
            offset: self.offset.saturating_add(returned),
            ..self
        }
    }
}

fn clamp_to_u32(value: i64, min: u32) -> u32 {
    u32::try_from(value.max(i64::from(min))).unwrap_or(u32::MAX)
}

/// The result of one pagination step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Ids of the entries that carried one, in service order.
    pub ids: Vec<ItemId>,
    /// Where the next page starts, or `None` when the folder is done.
    pub next: Option<PageCursor>,
}

/// Fetch the page at `cursor`.
///
/// A response without a root folder or item array means the folder
/// has no remaining items. A page shorter than the cursor's page size
/// is the last one.
///
/// # Errors
///
/// Propagates transport errors and service faults.
pub async fn fetch_page<S>(service: &S, folder: &FolderId, cursor: PageCursor) -> Result<Page>
where
    S: MailService + ?Sized,
{
    debug!(
        "Finding items in {} at offset {} (page size {})",
        folder,
        cursor.offset(),
        cursor.page_size()
    );
    let request = FindItemsRequest::at(folder.clone(), cursor);
    let validated = validate(service.find_items(&request).await?)?;

    if !validated.outcome.has_items {
        debug!("No items left in {}", folder);
        return Ok(Page {
            ids: Vec::new(),
            next: None,
        });
    }
    let entries = validated
        .response
        .root_folder
        .and_then(|root_folder| root_folder.items)
        .unwrap_or_default();

    let returned = entries.len();
    let ids: Vec<ItemId> = entries.into_iter().filter_map(|entry| entry.id).collect();
    if ids.len() < returned {
        warn!(
            "Skipped {} item(s) without an id in {} at offset {}",
            returned - ids.len(),
            folder,
            cursor.offset()
        );
    }

    let full_page = u32::try_from(returned).is_ok_and(|n| n >= cursor.page_size());
    let next = full_page.then(|| cursor.advance(returned));
    Ok(Page { ids, next })
}

/// Walk every item id in `folder`, starting at offset 0.
///
/// The stream issues one request per page, only when the previous
/// page has been consumed, and ends after the first error.
pub fn paginate_items<S>(
    service: &S,
    folder: FolderId,
    page_size: i64,
) -> impl Stream<Item = Result<ItemId>> + Send + '_
where
    S: MailService + ?Sized,
{
    paginate_items_from(service, folder, PageCursor::new(0, page_size))
}

/// Walk the item ids in `folder` from a remembered cursor.
pub fn paginate_items_from<S>(
    service: &S,
    folder: FolderId,
    cursor: PageCursor,
) -> impl Stream<Item = Result<ItemId>> + Send + '_
where
    S: MailService + ?Sized,
{
    stream::try_unfold(Some(cursor), move |cursor| {
        let folder = folder.clone();
        async move {
            match cursor {
                Some(cursor) => fetch_page(service, &folder, cursor)
                    .await
                    .map(|page| Some((page.ids, page.next))),
                None => Ok(None),
            }
        }
    })
    .map_ok(|ids| stream::iter(ids).map(Ok::<_, Error>))
    .try_flatten()
}
