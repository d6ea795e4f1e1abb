//! [`MailService`] over IMAP
//!
//! Each call opens its own session, so the service holds no state
//! between calls, just like a stateless web service would. Folders map
//! to IMAP mailboxes, item ids are `mailbox:uid` pairs, and pages are
//! windows over the mailbox's UIDs in ascending order.
//!
//! Tagged `NO` and `BAD` replies surface as error status codes; I/O
//! failures and dropped connections surface as transport errors.

use crate::config::ImapConfig;
use crate::connection::{ImapSession, connect};
use crate::error::{Error, Result};
use crate::folder::{DistinguishedFolder, FolderId};
use crate::item::ItemId;
use crate::response::{
    FindFoldersResponse, FindItemsResponse, FolderEntry, FolderSet, GetItemsResponse, ItemEntry,
    ItemSet, RawItem, ResponseCode,
};
use crate::service::{FindItemsRequest, MailService};
use async_imap::error::Error as ImapError;
use async_imap::types::NameAttribute;
use async_trait::async_trait;
use chrono::DateTime;
use futures::StreamExt;
use mailparse::{MailAddr, MailHeaderMap, ParsedMail};
use std::collections::HashMap;
use tracing::{debug, info, warn};

type ImapResult<T> = std::result::Result<T, ImapError>;

/// Read-only mail service backed by an IMAP server
#[derive(Debug, Clone)]
pub struct ImapService {
    config: ImapConfig,
}

impl ImapService {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailService for ImapService {
    async fn find_folders(&self, root: &FolderId) -> Result<Option<FindFoldersResponse>> {
        let mut session = connect(&self.config).await?;
        let listed = list_mailboxes(&mut session).await;
        session.logout().await.ok();

        let mailboxes = match listed {
            Ok(mailboxes) => mailboxes,
            Err(e) => {
                return Ok(Some(FindFoldersResponse {
                    code: refused(e)?,
                    root_folder: None,
                }));
            }
        };

        let root_name = mailbox_name(root);
        let folders: Vec<FolderEntry> = mailboxes
            .into_iter()
            .filter(|mailbox| is_hierarchy_root(root) || mailbox.is_under(root_name))
            .map(|mailbox| FolderEntry {
                id: mailbox.selectable.then(|| FolderId::id(mailbox.name.clone())),
                display_name: Some(mailbox.name),
            })
            .collect();

        info!("Listed {} mailbox(es) under {}", folders.len(), root);
        Ok(Some(FindFoldersResponse {
            code: ResponseCode::NoError,
            root_folder: Some(FolderSet {
                folders: Some(folders),
            }),
        }))
    }

    async fn find_items(&self, request: &FindItemsRequest) -> Result<Option<FindItemsResponse>> {
        let mailbox = mailbox_name(&request.folder);

        let mut session = connect(&self.config).await?;
        let searched = search_uids(&mut session, mailbox).await;
        session.logout().await.ok();

        let uids = match searched {
            Ok(uids) => uids,
            Err(e) => {
                return Ok(Some(FindItemsResponse {
                    code: refused(e)?,
                    root_folder: None,
                }));
            }
        };

        let items = window(uids, request.offset, request.max_entries)
            .into_iter()
            .map(|uid| ItemEntry {
                id: Some(item_id(mailbox, uid)),
            })
            .collect();

        Ok(Some(FindItemsResponse {
            code: ResponseCode::NoError,
            root_folder: Some(ItemSet { items: Some(items) }),
        }))
    }

    async fn get_items(&self, ids: &[ItemId]) -> Result<Option<GetItemsResponse>> {
        let groups = group_by_mailbox(ids)?;

        let mut session = connect(&self.config).await?;
        let fetched = fetch_groups(&mut session, &groups).await;
        session.logout().await.ok();

        match fetched {
            Ok(items) => Ok(Some(GetItemsResponse {
                code: ResponseCode::NoError,
                items: Some(items?),
            })),
            Err(e) => Ok(Some(GetItemsResponse {
                code: refused(e)?,
                items: None,
            })),
        }
    }
}

/// Turn a failed IMAP command into an error status code, or into a
/// transport error when the server never answered.
fn refused(e: ImapError) -> Result<ResponseCode> {
    match e {
        ImapError::No(msg) => Ok(ResponseCode::Error(format!("NO {msg}"))),
        ImapError::Bad(msg) => Ok(ResponseCode::Error(format!("BAD {msg}"))),
        ImapError::Io(e) => Err(Error::Io(e)),
        other => Err(Error::Transport(other.to_string())),
    }
}

/// The IMAP mailbox a folder id refers to.
///
/// Distinguished folders use the names common to IMAP servers; the
/// hierarchy roots map to the empty name.
fn mailbox_name(folder: &FolderId) -> &str {
    match folder {
        FolderId::Distinguished(folder) => match folder {
            DistinguishedFolder::Inbox => "INBOX",
            DistinguishedFolder::SentItems => "Sent",
            DistinguishedFolder::Drafts => "Drafts",
            DistinguishedFolder::DeletedItems => "Trash",
            DistinguishedFolder::JunkEmail => "Spam",
            DistinguishedFolder::Archive => "Archive",
            DistinguishedFolder::Outbox => "Outbox",
            DistinguishedFolder::MsgFolderRoot | DistinguishedFolder::Root => "",
        },
        FolderId::Id(name) => name,
    }
}

const fn is_hierarchy_root(folder: &FolderId) -> bool {
    match folder {
        FolderId::Distinguished(folder) => folder.is_hierarchy_root(),
        FolderId::Id(_) => false,
    }
}

/// One entry of a LIST reply.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListedMailbox {
    name: String,
    delimiter: Option<String>,
    selectable: bool,
}

impl ListedMailbox {
    /// Whether this mailbox is `root` itself or one of its descendants.
    ///
    /// `INBOX` is case-insensitive, including as the first level of a
    /// child's name.
    fn is_under(&self, root: &str) -> bool {
        let inbox = root.eq_ignore_ascii_case("INBOX");
        let same = |name: &str| {
            if inbox {
                name.eq_ignore_ascii_case(root)
            } else {
                name == root
            }
        };
        if same(&self.name) {
            return true;
        }
        let Some((prefix, rest)) = self.name.split_at_checked(root.len()) else {
            return false;
        };
        same(prefix)
            && self
                .delimiter
                .as_deref()
                .is_some_and(|delimiter| rest.starts_with(delimiter))
    }
}

async fn list_mailboxes(session: &mut ImapSession) -> ImapResult<Vec<ListedMailbox>> {
    let mut names = session.list(Some(""), Some("*")).await?;

    let mut mailboxes = Vec::new();
    while let Some(name) = names.next().await {
        let name = name?;
        mailboxes.push(ListedMailbox {
            name: name.name().to_string(),
            delimiter: name.delimiter().map(str::to_string),
            selectable: !name
                .attributes()
                .iter()
                .any(|attribute| matches!(attribute, NameAttribute::NoSelect)),
        });
    }
    Ok(mailboxes)
}

async fn search_uids(session: &mut ImapSession, mailbox: &str) -> ImapResult<Vec<u32>> {
    session.select(mailbox).await?;
    let uids = session.uid_search("ALL").await?;
    debug!("Found {} message(s) in {}", uids.len(), mailbox);
    Ok(uids.into_iter().collect())
}

async fn fetch_messages(
    session: &mut ImapSession,
    mailbox: &str,
    uids: &[u32],
) -> ImapResult<HashMap<u32, Vec<u8>>> {
    session.select(mailbox).await?;

    let uid_set = uids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mut messages = session.uid_fetch(&uid_set, "(UID BODY.PEEK[])").await?;

    let mut bodies = HashMap::with_capacity(uids.len());
    while let Some(message) = messages.next().await {
        let message = message?;
        if let (Some(uid), Some(body)) = (message.uid, message.body()) {
            bodies.insert(uid, body.to_vec());
        }
    }
    Ok(bodies)
}

/// Fetch and parse every group in order. The outer error is an IMAP
/// refusal; the inner one a message that failed to parse.
async fn fetch_groups(
    session: &mut ImapSession,
    groups: &[(String, Vec<u32>)],
) -> ImapResult<Result<Vec<RawItem>>> {
    let mut items = Vec::new();
    for (mailbox, uids) in groups {
        let mut bodies = fetch_messages(session, mailbox, uids).await?;
        for uid in uids {
            match bodies.remove(uid) {
                Some(body) => match raw_item(item_id(mailbox, *uid), &body) {
                    Ok(item) => items.push(item),
                    Err(e) => return Ok(Err(e)),
                },
                None => warn!("Server returned no message for UID {} in {}", uid, mailbox),
            }
        }
    }
    Ok(Ok(items))
}

/// Sort `uids` ascending and cut out one page.
fn window(mut uids: Vec<u32>, offset: u32, max_entries: u32) -> Vec<u32> {
    uids.sort_unstable();
    uids.into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(max_entries).unwrap_or(usize::MAX))
        .collect()
}

fn item_id(mailbox: &str, uid: u32) -> ItemId {
    ItemId::new(format!("{mailbox}:{uid}"))
}

/// Split an id produced by [`item_id`] back into mailbox and UID.
fn split_item_id(id: &ItemId) -> Result<(&str, u32)> {
    id.as_str()
        .rsplit_once(':')
        .and_then(|(mailbox, uid)| Some((mailbox, uid.parse().ok()?)))
        .ok_or_else(|| Error::Parse(format!("Not an IMAP item id: {id}")))
}

/// Group ids by mailbox, keeping consecutive runs together so the
/// fetched items come back in request order.
fn group_by_mailbox(ids: &[ItemId]) -> Result<Vec<(String, Vec<u32>)>> {
    let mut groups: Vec<(String, Vec<u32>)> = Vec::new();
    for id in ids {
        let (mailbox, uid) = split_item_id(id)?;
        match groups.last_mut() {
            Some((last, uids)) if last == mailbox => uids.push(uid),
            _ => groups.push((mailbox.to_string(), vec![uid])),
        }
    }
    Ok(groups)
}

/// Parse a raw RFC 2822 message.
fn raw_item(id: ItemId, message: &[u8]) -> Result<RawItem> {
    let parsed = mailparse::parse_mail(message)
        .map_err(|e| Error::Parse(format!("Message {id}: {e}")))?;

    let addresses = |key: &str| -> Vec<String> {
        parsed
            .headers
            .get_all_headers(key)
            .into_iter()
            .flat_map(|header| {
                mailparse::addrparse_header(header).map_or_else(
                    |_| vec![header.get_value()],
                    |list| list.iter().flat_map(mailbox_addresses).collect(),
                )
            })
            .collect()
    };

    Ok(RawItem {
        sender: addresses("From").into_iter().next(),
        recipients: addresses("To"),
        cc: addresses("Cc"),
        bcc: addresses("Bcc"),
        subject: parsed.headers.get_first_value("Subject"),
        body: text_body(&parsed, "text/plain").or_else(|| text_body(&parsed, "text/")),
        time_sent: parsed
            .headers
            .get_first_value("Date")
            .and_then(|date| mailparse::dateparse(&date).ok())
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0)),
        headers: parsed
            .headers
            .iter()
            .map(|header| (header.get_key(), header.get_value()))
            .collect(),
        id: Some(id),
    })
}

fn mailbox_addresses(addr: &MailAddr) -> Vec<String> {
    match addr {
        MailAddr::Single(single) => vec![single.addr.clone()],
        MailAddr::Group(group) => group.addrs.iter().map(|s| s.addr.clone()).collect(),
    }
}

/// The body of the first leaf part whose MIME type starts with
/// `mimetype`.
fn text_body(part: &ParsedMail<'_>, mimetype: &str) -> Option<String> {
    if part.subparts.is_empty() {
        return part
            .ctype
            .mimetype
            .starts_with(mimetype)
            .then(|| part.get_body().ok())
            .flatten();
    }
    part.subparts
        .iter()
        .find_map(|subpart| text_body(subpart, mimetype))
}
