#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for enumerating and exporting a mailbox over IMAP (read-only)

use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use mailbox_sync::{
    FolderId, ImapConfig, ImapService, MailboxItem, MailboxSync, RowWriter, SyncConfig,
};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailsync-cli")]
#[command(about = "Read-only mailbox enumeration and export over IMAP")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the folders under a root
    Folders {
        /// Folder root (defaults to MAILSYNC_ROOT)
        #[arg(long)]
        root: Option<String>,
    },

    /// List the item ids in one folder
    Ids {
        /// Folder to page through
        #[arg(long, default_value = "INBOX")]
        folder: String,

        /// Ids requested per page (defaults to MAILSYNC_PAGE_SIZE)
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },

    /// Fetch every item under a root
    Sync {
        /// Folder root (defaults to MAILSYNC_ROOT)
        #[arg(long)]
        root: Option<String>,

        /// Ids requested per page (defaults to MAILSYNC_PAGE_SIZE)
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,

        /// Items fetched per batch (defaults to MAILSYNC_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Emit keyed storage rows as JSON lines
        #[arg(long, conflicts_with = "json")]
        rows: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = SyncConfig::from_env()?;
    let sync = MailboxSync::new(ImapService::new(ImapConfig::from_env()?));

    match &args.command {
        Command::Folders { root } => {
            let root = root.as_deref().map_or_else(|| settings.root.clone(), FolderId::from);
            cmd_folders(&sync, &args, &root).await?;
        }
        Command::Ids { folder, page_size } => {
            let page_size = page_size.unwrap_or(settings.page_size);
            cmd_ids(&sync, &args, FolderId::from(folder.as_str()), page_size).await?;
        }
        Command::Sync {
            root,
            page_size,
            batch_size,
            rows,
        } => {
            let settings = SyncConfig {
                root: root.as_deref().map_or(settings.root.clone(), FolderId::from),
                page_size: page_size.unwrap_or(settings.page_size),
                batch_size: batch_size.unwrap_or(settings.batch_size),
                ..settings
            };
            if *rows {
                cmd_rows(&sync, &settings).await?;
            } else {
                cmd_sync(&sync, &args, &settings).await?;
            }
        }
    }

    Ok(())
}

async fn cmd_folders(
    sync: &MailboxSync<ImapService>,
    args: &Args,
    root: &FolderId,
) -> anyhow::Result<()> {
    let folders = sync.list_folders(root).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else {
        for folder in &folders {
            println!("{folder}");
        }
    }

    Ok(())
}

async fn cmd_ids(
    sync: &MailboxSync<ImapService>,
    args: &Args,
    folder: FolderId,
    page_size: i64,
) -> anyhow::Result<()> {
    let ids: Vec<_> = sync.item_ids(folder, page_size).try_collect().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in &ids {
            println!("{id}");
        }
        println!("\n{} id(s)", ids.len());
    }

    Ok(())
}

async fn cmd_sync(
    sync: &MailboxSync<ImapService>,
    args: &Args,
    settings: &SyncConfig,
) -> anyhow::Result<()> {
    let items = sync.synchronize(
        settings.root.clone(),
        settings.page_size,
        settings.batch_size,
    );
    let mut items = std::pin::pin!(items);

    let mut count = 0usize;
    if !args.json {
        print_table_header();
    }
    while let Some(item) = items.try_next().await? {
        if args.json {
            println!("{}", serde_json::to_string(&item)?);
        } else {
            print_table_row(&item);
        }
        count += 1;
    }

    if !args.json {
        println!("\n{count} item(s)");
    }

    Ok(())
}

async fn cmd_rows(sync: &MailboxSync<ImapService>, settings: &SyncConfig) -> anyhow::Result<()> {
    let items = sync.synchronize(
        settings.root.clone(),
        settings.page_size,
        settings.batch_size,
    );

    let mut writer = RowWriter::new(std::io::stdout().lock())
        .with_key_header(&settings.key_header)
        .with_family(&settings.column_family)
        .with_buffer_size(settings.buffer_size);
    let written = writer.write_all(items).await?;
    writer.into_inner().flush()?;

    eprintln!("{written} row(s) written");
    Ok(())
}

fn print_table_header() {
    println!(
        "{:<20} {:<20} {:<30} {}",
        "Item", "Sent", "From", "Subject"
    );
    println!("{}", "-".repeat(100));
}

fn print_table_row(item: &MailboxItem) {
    println!(
        "{:<20} {:<20} {:<30} {}",
        truncate(item.id().unwrap_or("-"), 18),
        item.time_sent
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
        truncate(item.sender.as_deref().unwrap_or("-"), 28),
        truncate(item.subject.as_deref().unwrap_or(""), 40),
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
