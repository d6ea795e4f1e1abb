//! Mailbox enumeration over a stateless, paginated mail service
//!
//! Resolves the folders under a root, pages through each folder's
//! item ids, fetches full items in batches and normalizes them into
//! [`MailboxItem`]s. The remote side is any [`MailService`];
//! [`ImapService`] provides one over IMAP.
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use mailbox_sync::{DistinguishedFolder, ImapConfig, ImapService, MailboxSync};
//!
//! # async fn run() -> mailbox_sync::Result<()> {
//! let sync = MailboxSync::new(ImapService::new(ImapConfig::from_env()?));
//! let items: Vec<_> = sync
//!     .synchronize(DistinguishedFolder::MsgFolderRoot.into(), 1000, 100)
//!     .try_collect()
//!     .await?;
//! println!("{} items", items.len());
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod connection;
mod error;
mod folder;
mod imap;
mod item;
mod page;
mod response;
mod service;
mod sync;
mod writer;

pub use batch::fetch_items;
pub use config::{ImapConfig, SyncConfig};
pub use error::{Error, Fault, Result};
pub use folder::{DistinguishedFolder, FolderId, list_folders};
pub use imap::ImapService;
pub use item::{
    BCC_HEADER, BODY_HEADER, CC_HEADER, ITEM_ID_HEADER, ItemId, MailboxItem, SENDER_HEADER,
    SUBJECT_HEADER, TIME_SENT_HEADER, TO_HEADER,
};
pub use page::{Page, PageCursor, fetch_page, paginate_items, paginate_items_from};
pub use response::{
    FindFoldersResponse, FindItemsResponse, FolderEntry, FolderSet, GetItemsResponse, ItemEntry,
    ItemSet, RawItem, ResponseCode, ResponseOutcome, ServiceResponse, Validated, validate,
};
pub use service::{FindItemsRequest, MailService};
pub use sync::MailboxSync;
pub use writer::{
    DEFAULT_BUFFER_SIZE, DEFAULT_COLUMN_FAMILY, DEFAULT_KEY_HEADER, MailWriter, Row, RowWriter,
};
