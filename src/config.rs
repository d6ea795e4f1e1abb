//! Connection and synchronization settings

use crate::error::{Error, Result};
use crate::folder::{DistinguishedFolder, FolderId};
use crate::writer::{DEFAULT_BUFFER_SIZE, DEFAULT_COLUMN_FAMILY, DEFAULT_KEY_HEADER};
use std::env;
use std::str::FromStr;

/// IMAP connection configuration
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Upgrade a plain connection with STARTTLS instead of connecting
    /// over TLS from the start.
    pub starttls: bool,
}

impl ImapConfig {
    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `IMAP_HOST` (default: `127.0.0.1`)
    /// - `IMAP_PORT` (default: `1143`)
    /// - `IMAP_STARTTLS` (default: `true`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or
    /// a value does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("IMAP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("IMAP_PORT", 1143)?,
            username: env::var("IMAP_USERNAME")
                .map_err(|_| Error::Config("IMAP_USERNAME not set".into()))?,
            password: env::var("IMAP_PASSWORD")
                .map_err(|_| Error::Config("IMAP_PASSWORD not set".into()))?,
            starttls: parse_var("IMAP_STARTTLS", true)?,
        })
    }
}

/// What to synchronize and how to store it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub root: FolderId,
    pub page_size: i64,
    pub batch_size: usize,
    pub key_header: String,
    pub column_family: String,
    pub buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: FolderId::Distinguished(DistinguishedFolder::MsgFolderRoot),
            page_size: 1000,
            batch_size: 1000,
            key_header: DEFAULT_KEY_HEADER.to_string(),
            column_family: DEFAULT_COLUMN_FAMILY.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl SyncConfig {
    /// Load synchronization settings from environment variables
    ///
    /// All variables are optional:
    /// - `MAILSYNC_ROOT` (default: `msgfolderroot`)
    /// - `MAILSYNC_PAGE_SIZE` (default: `1000`)
    /// - `MAILSYNC_BATCH_SIZE` (default: `1000`)
    /// - `MAILSYNC_KEY_HEADER` (default: `Item ID`)
    /// - `MAILSYNC_COLUMN_FAMILY` (default: `h`)
    /// - `MAILSYNC_BUFFER_SIZE` (default: `10000`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric value does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            root: env::var("MAILSYNC_ROOT").map_or(defaults.root, FolderId::from),
            page_size: parse_var("MAILSYNC_PAGE_SIZE", defaults.page_size)?,
            batch_size: parse_var("MAILSYNC_BATCH_SIZE", defaults.batch_size)?,
            key_header: env::var("MAILSYNC_KEY_HEADER").unwrap_or(defaults.key_header),
            column_family: env::var("MAILSYNC_COLUMN_FAMILY").unwrap_or(defaults.column_family),
            buffer_size: parse_var("MAILSYNC_BUFFER_SIZE", defaults.buffer_size)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
