//! In-memory mail service for integration testing
//!
//! Provides a builder-style API for constructing service state:
//!
//! ```ignore
//! let service = FakeService::builder()
//!     .folder("inbox-id")
//!         .ids(["a", "b"])
//!         .entry_without_id()
//!     .folder("archive-id")
//!         .item(raw_item)
//!     .build();
//! ```
//!
//! Every call is recorded so tests can assert which pages and batches
//! were requested, in which order. Individual responses can be
//! scripted to be null, to carry an error code, or to fail at the
//! transport level.

#![allow(dead_code)]

use async_trait::async_trait;
use mailbox_sync::{
    Error, FindFoldersResponse, FindItemsRequest, FindItemsResponse, FolderEntry, FolderId,
    FolderSet, GetItemsResponse, ItemEntry, ItemId, ItemSet, MailService, RawItem, ResponseCode,
    Result,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// A recorded service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindFolders(FolderId),
    FindItems {
        folder: String,
        offset: u32,
        max_entries: u32,
    },
    GetItems(Vec<String>),
}

/// A scripted reply that replaces the computed one.
#[derive(Debug, Clone)]
pub enum Scripted<R> {
    Respond(Option<R>),
    Disconnect,
}

impl<R> Scripted<R> {
    fn play(self) -> Result<Option<R>> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Disconnect => Err(Error::Transport("connection reset by peer".into())),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeService {
    folders: Vec<FolderEntry>,
    entries: HashMap<String, Vec<ItemEntry>>,
    contents: HashMap<ItemId, RawItem>,
    find_folders_script: Option<Scripted<FindFoldersResponse>>,
    find_items_script: HashMap<(String, u32), Scripted<FindItemsResponse>>,
    get_items_script: Option<Scripted<GetItemsResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeService {
    pub fn builder() -> FakeServiceBuilder {
        FakeServiceBuilder {
            service: Self::default(),
            current: None,
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn find_items_calls(&self) -> Vec<(String, u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::FindItems {
                    folder,
                    offset,
                    max_entries,
                } => Some((folder, offset, max_entries)),
                _ => None,
            })
            .collect()
    }

    pub fn get_items_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetItems(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MailService for FakeService {
    async fn find_folders(&self, root: &FolderId) -> Result<Option<FindFoldersResponse>> {
        self.record(Call::FindFolders(root.clone()));

        if let Some(script) = &self.find_folders_script {
            return script.clone().play();
        }

        Ok(Some(FindFoldersResponse {
            code: ResponseCode::NoError,
            root_folder: Some(FolderSet {
                folders: Some(self.folders.clone()),
            }),
        }))
    }

    async fn find_items(&self, request: &FindItemsRequest) -> Result<Option<FindItemsResponse>> {
        let folder = request.folder.as_str().to_string();
        self.record(Call::FindItems {
            folder: folder.clone(),
            offset: request.offset,
            max_entries: request.max_entries,
        });

        if let Some(script) = self.find_items_script.get(&(folder.clone(), request.offset)) {
            return script.clone().play();
        }

        let Some(entries) = self.entries.get(&folder) else {
            return Ok(Some(FindItemsResponse {
                code: ResponseCode::Error("ErrorFolderNotFound".into()),
                root_folder: None,
            }));
        };

        let page = entries
            .iter()
            .skip(request.offset as usize)
            .take(request.max_entries as usize)
            .cloned()
            .collect();

        Ok(Some(FindItemsResponse {
            code: ResponseCode::NoError,
            root_folder: Some(ItemSet { items: Some(page) }),
        }))
    }

    async fn get_items(&self, ids: &[ItemId]) -> Result<Option<GetItemsResponse>> {
        self.record(Call::GetItems(
            ids.iter().map(|id| id.as_str().to_string()).collect(),
        ));

        if let Some(script) = &self.get_items_script {
            return script.clone().play();
        }

        Ok(Some(GetItemsResponse {
            code: ResponseCode::NoError,
            items: Some(
                ids.iter()
                    .filter_map(|id| self.contents.get(id).cloned())
                    .collect(),
            ),
        }))
    }
}

/// Builder for constructing a `FakeService` step by step.
///
/// Call `.folder(id)` to start a new folder, then chain `.ids(..)`,
/// `.item(..)` or `.entry_without_id()` to add entries to it.
pub struct FakeServiceBuilder {
    service: FakeService,
    current: Option<String>,
}

impl FakeServiceBuilder {
    /// Add a folder. Subsequent entries go into this folder.
    pub fn folder(mut self, id: &str) -> Self {
        self.service.folders.push(FolderEntry {
            id: Some(FolderId::from(id)),
            display_name: Some(id.to_string()),
        });
        self.service.entries.entry(folder_key(id)).or_default();
        self.current = Some(folder_key(id));
        self
    }

    /// Add a folder listing entry that carries no id.
    pub fn folder_without_id(mut self, display_name: &str) -> Self {
        self.service.folders.push(FolderEntry {
            id: None,
            display_name: Some(display_name.to_string()),
        });
        self
    }

    /// Add items with default content to the current folder.
    pub fn ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter().fold(self, |builder, id| {
            let id = ItemId::new(id);
            let raw = message(&id);
            builder.item(raw)
        })
    }

    /// Add an item to the current folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call or with an item
    /// that has no id.
    pub fn item(mut self, raw: RawItem) -> Self {
        let id = raw.id.clone().expect("use .entry_without_id() for items without an id");
        self.current_entries().push(ItemEntry {
            id: Some(id.clone()),
        });
        self.service.contents.insert(id, raw);
        self
    }

    /// Add an entry without an id to the current folder.
    pub fn entry_without_id(mut self) -> Self {
        self.current_entries().push(ItemEntry { id: None });
        self
    }

    pub fn find_folders(mut self, script: Scripted<FindFoldersResponse>) -> Self {
        self.service.find_folders_script = Some(script);
        self
    }

    /// Script the reply to the page of `folder` starting at `offset`.
    pub fn find_items_at(
        mut self,
        folder: &str,
        offset: u32,
        script: Scripted<FindItemsResponse>,
    ) -> Self {
        self.service
            .find_items_script
            .insert((folder_key(folder), offset), script);
        self
    }

    pub fn get_items(mut self, script: Scripted<GetItemsResponse>) -> Self {
        self.service.get_items_script = Some(script);
        self
    }

    pub fn build(self) -> FakeService {
        self.service
    }

    fn current_entries(&mut self) -> &mut Vec<ItemEntry> {
        let folder = self
            .current
            .clone()
            .expect("call .folder() before adding items");
        self.service.entries.entry(folder).or_default()
    }
}

/// The name a folder id travels under in requests.
fn folder_key(id: &str) -> String {
    FolderId::from(id).as_str().to_string()
}

/// Default content for an item: enough fields to tell items apart.
pub fn message(id: &ItemId) -> RawItem {
    RawItem {
        id: Some(id.clone()),
        sender: Some("sender@example.com".to_string()),
        recipients: vec!["recipient@example.com".to_string()],
        subject: Some(format!("Subject of {id}")),
        body: Some(format!("Body of {id}")),
        ..RawItem::default()
    }
}

/// Ids `the0id`, `the1id`, ... `the{n-1}id`.
pub fn generate_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("the{i}id")).collect()
}

pub fn error_code(code: &str) -> ResponseCode {
    ResponseCode::Error(code.to_string())
}
