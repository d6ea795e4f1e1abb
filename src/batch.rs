//! Batch retrieval of full item content

use crate::error::{Error, Result};
use crate::item::{ItemId, MailboxItem};
use crate::response::validate;
use crate::service::MailService;
use tracing::{debug, warn};

/// Fetch and normalize the items named by `ids` with a single
/// "get items" call.
///
/// Items come back in the order the service returned them, which must
/// correspond one-to-one with `ids`. Returned items without an id are
/// dropped. An empty `ids` returns an empty batch without calling the
/// service.
///
/// # Errors
///
/// Propagates transport errors and service faults. Returns
/// [`Error::MalformedResponse`] when the response carries no items or a
/// different number of items than requested.
pub async fn fetch_items<S>(service: &S, ids: &[ItemId]) -> Result<Vec<MailboxItem>>
where
    S: MailService + ?Sized,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    debug!("Getting {} item(s)", ids.len());
    let validated = validate(service.get_items(ids).await?)?;

    if !validated.outcome.has_items {
        return Err(Error::MalformedResponse(format!(
            "no items returned for a batch of {}",
            ids.len()
        )));
    }
    let raw_items = validated.response.items.unwrap_or_default();

    if raw_items.len() != ids.len() {
        return Err(Error::MalformedResponse(format!(
            "requested {} item(s) but {} were returned",
            ids.len(),
            raw_items.len()
        )));
    }

    let items: Vec<MailboxItem> = raw_items
        .into_iter()
        .zip(ids)
        .filter_map(|(raw, requested)| {
            if raw.id.is_none() {
                warn!("Dropping item returned for {} without an id", requested);
                return None;
            }
            Some(MailboxItem::from(raw))
        })
        .collect();

    Ok(items)
}
