//! Keyed, column-family rows for downstream storage
//!
//! Every [`MailboxItem`] becomes one [`Row`]: the value of a chosen key
//! header is the row key, and every header becomes a column in a single
//! column family. [`RowWriter`] emits rows as JSON lines and buffers
//! them on the client side between flushes.

use crate::error::{Error, Result};
use crate::item::{ITEM_ID_HEADER, MailboxItem};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// Column family used when none is configured.
pub const DEFAULT_COLUMN_FAMILY: &str = "h";

/// Header whose value keys each row when none is configured.
pub const DEFAULT_KEY_HEADER: &str = ITEM_ID_HEADER;

/// Rows buffered before an automatic flush.
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

/// A sink for normalized items.
pub trait MailWriter {
    /// Queue one item for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be keyed or stored.
    fn write(&mut self, item: &MailboxItem) -> Result<()>;

    /// Push every queued item to storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage rejects the write.
    fn flush(&mut self) -> Result<()>;
}

/// One stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub key: String,
    pub family: String,
    pub columns: BTreeMap<String, String>,
}

impl Row {
    /// Build the row for `item`, keyed on `key_header`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`] if the item has no such header.
    pub fn from_item(item: &MailboxItem, key_header: &str, family: &str) -> Result<Self> {
        let key = item
            .header(key_header)
            .ok_or_else(|| Error::MissingKey(key_header.to_string()))?;

        Ok(Self {
            key: key.to_string(),
            family: family.to_string(),
            columns: item
                .headers()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }
}

/// Writes rows as JSON lines to any [`Write`].
#[derive(Debug)]
pub struct RowWriter<W: Write> {
    out: W,
    key_header: String,
    family: String,
    buffer_size: usize,
    pending: Vec<Row>,
}

impl<W: Write> RowWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            key_header: DEFAULT_KEY_HEADER.to_string(),
            family: DEFAULT_COLUMN_FAMILY.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key_header(mut self, key_header: impl Into<String>) -> Self {
        self.key_header = key_header.into();
        self
    }

    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Flush automatically once `buffer_size` rows are pending. A size
    /// of 0 is treated as 1.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drain `items` into this writer and flush at the end.
    ///
    /// Returns the number of rows written. Rows queued before an error
    /// are flushed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error from the stream or from writing.
    pub async fn write_all<St>(&mut self, items: St) -> Result<u64>
    where
        St: Stream<Item = Result<MailboxItem>>,
    {
        let mut items = std::pin::pin!(items);
        let mut written = 0;
        let outcome = loop {
            match items.try_next().await {
                Ok(Some(item)) => {
                    if let Err(e) = self.write(&item) {
                        break Err(e);
                    }
                    written += 1;
                }
                Ok(None) => break Ok(written),
                Err(e) => break Err(e),
            }
        };
        self.flush()?;
        outcome
    }

    /// Consume the writer, returning the underlying output. Pending
    /// rows are discarded.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MailWriter for RowWriter<W> {
    fn write(&mut self, item: &MailboxItem) -> Result<()> {
        self.pending
            .push(Row::from_item(item, &self.key_header, &self.family)?);
        if self.pending.len() >= self.buffer_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        debug!("Flushing {} row(s)", self.pending.len());
        for row in self.pending.drain(..) {
            serde_json::to_writer(&mut self.out, &row)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
