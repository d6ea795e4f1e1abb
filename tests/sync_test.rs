//! End-to-end synchronization against the in-memory service.

mod support;

use chrono::{TimeZone, Utc};
use futures::{StreamExt, TryStreamExt};
use mailbox_sync::{
    FindItemsResponse, FolderId, ITEM_ID_HEADER, ItemId, MailboxItem, MailboxSync, RawItem,
    RowWriter, TIME_SENT_HEADER, TO_HEADER,
};
use support::{Call, FakeService, Scripted, error_code, generate_ids};

fn ids_of(items: &[MailboxItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.id().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_single_item_fields() {
    let sent = Utc.with_ymd_and_hms(2012, 6, 14, 9, 30, 0).unwrap();
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .item(RawItem {
                id: Some(ItemId::from("foobar27")),
                sender: Some("bkerr@example.com".to_string()),
                recipients: vec!["alice@example.com".to_string(), "bob@example.com".to_string()],
                cc: vec!["carol@example.com".to_string()],
                bcc: vec![],
                subject: Some("Timber counts".to_string()),
                body: Some("See attached.".to_string()),
                time_sent: Some(sent),
                headers: vec![],
            })
            .build(),
    );

    let items: Vec<MailboxItem> = sync
        .synchronize(FolderId::from("INBOX"), 1000, 1000)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.id(), Some("foobar27"));
    assert_eq!(item.sender.as_deref(), Some("bkerr@example.com"));
    assert_eq!(item.recipients.len(), 2);
    assert_eq!(item.cc, vec!["carol@example.com".to_string()]);
    assert!(item.bcc.is_empty());
    assert_eq!(item.subject.as_deref(), Some("Timber counts"));
    assert_eq!(item.body.as_deref(), Some("See attached."));
    assert_eq!(item.time_sent, Some(sent));
    assert_eq!(item.header(TIME_SENT_HEADER), Some("2012-06-14T09:30:00Z"));
    assert_eq!(
        item.header(TO_HEADER),
        Some("alice@example.com, bob@example.com")
    );
}

#[tokio::test]
async fn test_folders_in_order_listed_once() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("first")
            .ids(["f1", "f2"])
            .folder("second")
            .folder("third")
            .ids(["t1"])
            .build(),
    );

    let items: Vec<MailboxItem> = sync
        .synchronize(FolderId::from("msgfolderroot"), 10, 10)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids_of(&items), vec!["f1", "f2", "t1"]);

    let calls = sync.service().calls();
    let listings = calls
        .iter()
        .filter(|call| matches!(call, Call::FindFolders(_)))
        .count();
    assert_eq!(listings, 1);
    assert!(matches!(calls[0], Call::FindFolders(_)));

    let pages: Vec<String> = sync
        .service()
        .find_items_calls()
        .into_iter()
        .map(|(folder, _, _)| folder)
        .collect();
    assert_eq!(pages, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_batches_never_exceed_batch_size() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .ids(generate_ids(7))
            .build(),
    );

    let items: Vec<MailboxItem> = sync
        .synchronize(FolderId::from("INBOX"), 1000, 3)
        .try_collect()
        .await
        .unwrap();

    let expected: Vec<String> = generate_ids(7);
    assert_eq!(ids_of(&items), expected);

    let sizes: Vec<usize> = sync
        .service()
        .get_items_calls()
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn test_batches_span_pages() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .ids(generate_ids(5))
            .build(),
    );

    let items: Vec<MailboxItem> = sync
        .synchronize(FolderId::from("INBOX"), 2, 3)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 5);
    assert_eq!(
        sync.service().get_items_calls(),
        vec![
            vec!["the0id".to_string(), "the1id".to_string(), "the2id".to_string()],
            vec!["the3id".to_string(), "the4id".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_zero_batch_size_fetches_one_at_a_time() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .ids(["a", "b"])
            .build(),
    );

    let items: Vec<MailboxItem> = sync
        .folder_items(FolderId::from("INBOX"), 10, 0)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids_of(&items), vec!["a", "b"]);
    assert_eq!(sync.service().get_items_calls().len(), 2);
}

#[tokio::test]
async fn test_fault_ends_run() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("first")
            .ids(["f1", "f2"])
            .folder("second")
            .ids(["s1"])
            .folder("third")
            .ids(["t1"])
            .find_items_at(
                "second",
                0,
                Scripted::Respond(Some(FindItemsResponse {
                    code: error_code("ErrorAccessDenied"),
                    root_folder: None,
                })),
            )
            .build(),
    );

    let results: Vec<_> = sync
        .synchronize(FolderId::from("msgfolderroot"), 10, 10)
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().id(), Some("f1"));
    assert_eq!(results[1].as_ref().unwrap().id(), Some("f2"));
    assert_eq!(
        results[2].as_ref().unwrap_err().to_string(),
        "Service response contained an error."
    );

    let pages: Vec<String> = sync
        .service()
        .find_items_calls()
        .into_iter()
        .map(|(folder, _, _)| folder)
        .collect();
    assert_eq!(pages, vec!["first", "second"]);
}

#[tokio::test]
async fn test_folder_listing_fault_yields_only_error() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("first")
            .ids(["f1"])
            .find_folders(Scripted::Respond(None))
            .build(),
    );

    let results: Vec<_> = sync
        .synchronize(FolderId::from("msgfolderroot"), 10, 10)
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap_err().to_string(),
        "Null response from mail service."
    );
    assert!(sync.service().find_items_calls().is_empty());
}

#[tokio::test]
async fn test_nothing_requested_until_polled() {
    let sync = MailboxSync::new(FakeService::builder().folder("INBOX").ids(["a"]).build());

    let stream = sync.synchronize(FolderId::from("INBOX"), 10, 10);
    assert!(sync.service().calls().is_empty());
    drop(stream);
    assert!(sync.service().calls().is_empty());
}

#[tokio::test]
async fn test_rows_written_per_item() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .ids(generate_ids(3))
            .build(),
    );

    let mut writer = RowWriter::new(Vec::new()).with_buffer_size(2);
    let written = writer
        .write_all(sync.synchronize(FolderId::from("INBOX"), 1000, 1000))
        .await
        .unwrap();
    assert_eq!(written, 3);

    let out = String::from_utf8(writer.into_inner()).unwrap();
    let rows: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["key"], "the0id");
    assert_eq!(rows[0]["family"], "h");
    assert_eq!(rows[2]["columns"][ITEM_ID_HEADER], "the2id");
    assert_eq!(rows[2]["columns"]["Subject"], "Subject of the2id");
}

#[tokio::test]
async fn test_rows_flushed_before_error() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("first")
            .ids(["f1"])
            .folder("second")
            .ids(["s1"])
            .find_items_at("second", 0, Scripted::Disconnect)
            .build(),
    );

    let mut writer = RowWriter::new(Vec::new());
    let err = writer
        .write_all(sync.synchronize(FolderId::from("msgfolderroot"), 10, 10))
        .await
        .unwrap_err();
    assert!(err.is_transport());

    let out = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("\"f1\""));
}

#[tokio::test]
async fn test_batch_fault_stops_paging() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("INBOX")
            .ids(generate_ids(5))
            .get_items(Scripted::Respond(None))
            .build(),
    );

    let results: Vec<_> = sync
        .folder_items(FolderId::from("INBOX"), 2, 2)
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap_err().to_string(),
        "Null response from mail service."
    );
    assert_eq!(
        sync.service().calls(),
        vec![
            Call::FindItems {
                folder: "inbox".to_string(),
                offset: 0,
                max_entries: 2,
            },
            Call::GetItems(vec!["the0id".to_string(), "the1id".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_batch_fault_skips_remaining_folders() {
    let sync = MailboxSync::new(
        FakeService::builder()
            .folder("first")
            .ids(["f1", "f2", "f3"])
            .folder("second")
            .ids(["s1"])
            .get_items(Scripted::Disconnect)
            .build(),
    );

    let results: Vec<_> = sync
        .synchronize(FolderId::from("msgfolderroot"), 2, 2)
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap_err().is_transport());

    let calls = sync.service().calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], Call::FindFolders(_)));
    assert_eq!(sync.service().find_items_calls(), vec![("first".to_string(), 0, 2)]);
    assert_eq!(sync.service().get_items_calls().len(), 1);
}
