//! Folder-by-folder synchronization of a mailbox
//!
//! [`MailboxSync`] strings the folder listing, pagination and batch
//! fetch together into one lazy stream. Nothing is requested until the
//! caller polls, and at most one page of ids plus one batch of items is
//! held at a time.

use crate::batch::fetch_items;
use crate::error::{Error, Result};
use crate::folder::{FolderId, list_folders};
use crate::item::{ItemId, MailboxItem};
use crate::page::paginate_items;
use crate::service::MailService;
use futures::stream::{self, Stream, StreamExt, TryChunksError, TryStreamExt};
use tracing::info;

/// Drives a [`MailService`] through a full enumeration pass.
///
/// The engine keeps no state between runs; several runs over disjoint
/// folders may share one engine concurrently.
#[derive(Debug)]
pub struct MailboxSync<S> {
    service: S,
}

impl<S: MailService> MailboxSync<S> {
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// List the folders under `root`.
    ///
    /// # Errors
    ///
    /// See [`list_folders`].
    pub async fn list_folders(&self, root: &FolderId) -> Result<Vec<FolderId>> {
        list_folders(&self.service, root).await
    }

    /// Walk every item id in `folder`.
    pub fn item_ids(
        &self,
        folder: FolderId,
        page_size: i64,
    ) -> impl Stream<Item = Result<ItemId>> + Send + '_ {
        paginate_items(&self.service, folder, page_size)
    }

    /// Fetch one batch of items.
    ///
    /// # Errors
    ///
    /// See [`fetch_items`].
    pub async fn fetch_items(&self, ids: &[ItemId]) -> Result<Vec<MailboxItem>> {
        fetch_items(&self.service, ids).await
    }

    /// Stream every item of one folder, fetched `batch_size` ids at a
    /// time. A `batch_size` of 0 is treated as 1.
    pub fn folder_items(
        &self,
        folder: FolderId,
        page_size: i64,
        batch_size: usize,
    ) -> impl Stream<Item = Result<MailboxItem>> + Send + '_ {
        let items = paginate_items(&self.service, folder, page_size)
            .try_chunks(batch_size.max(1))
            .map_err(|TryChunksError(_, err)| err)
            .and_then(move |ids| async move { fetch_items(&self.service, &ids).await })
            .map_ok(|items| stream::iter(items).map(Ok::<_, Error>))
            .try_flatten();
        stop_after_error(items)
    }

    /// Stream every item in every folder under `root`.
    ///
    /// Items arrive folder by folder in listing order, and within a
    /// folder page by page and batch by batch. The first error ends
    /// the stream; items already yielded remain valid.
    pub fn synchronize(
        &self,
        root: FolderId,
        page_size: i64,
        batch_size: usize,
    ) -> impl Stream<Item = Result<MailboxItem>> + Send + '_ {
        let folders = stream::once(async move { list_folders(&self.service, &root).await })
            .map_ok(|folders| stream::iter(folders).map(Ok::<_, Error>))
            .try_flatten();

        let items = folders
            .map_ok(move |folder| {
                info!("Synchronizing folder {}", folder);
                self.folder_items(folder, page_size, batch_size)
            })
            .try_flatten();

        stop_after_error(items)
    }
}

/// End `stream` right after the first `Err` it yields, without polling
/// it again.
fn stop_after_error<T>(stream: impl Stream<Item = Result<T>>) -> impl Stream<Item = Result<T>> {
    stream::unfold(
        (Box::pin(stream), false),
        |(mut stream, failed)| async move {
            if failed {
                return None;
            }
            let item = stream.next().await?;
            let failed = item.is_err();
            Some((item, (stream, failed)))
        },
    )
}
