//! Cursor-following collection for "next link" paginated listings.
//!
//! Every listing the migrator reads (spaces, pages, attachments, comments,
//! labels) hands back one page of items plus an opaque cursor for the next
//! page. [`collect_all`] drains such a listing and, on failure, keeps what it
//! already has instead of throwing it away.
//!
//! # Usage
//!
//! ```rust,ignore
//! let collected = collect_all("source spaces", |cursor| async move {
//!     source.list_spaces(cursor.as_deref()).await
//! })
//! .await;
//!
//! if let Some(err) = &collected.error {
//!     // partial result in collected.items
//! }
//! ```

use anyhow::Result;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, warn};

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Everything a listing produced before it ended or failed.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Number of page fetches issued, including a failed one.
    pub fetches: usize,
    /// The failure that cut pagination short, if any.
    pub error: Option<anyhow::Error>,
}

impl<T> Collected<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| format!("{:#}", e))
    }
}

/// Fetch pages until the cursor runs out.
///
/// A fetch failure stops pagination and returns the items collected so far
/// with the error attached. A server that hands back a cursor it already gave
/// out, directly or after a cycle, would loop forever, so any repeated cursor
/// also ends the listing.
pub async fn collect_all<T, F, Fut>(what: &str, mut fetch: F) -> Collected<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Listing<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut fetches = 0;

    loop {
        fetches += 1;
        match fetch(cursor.clone()).await {
            Ok(listing) => {
                items.extend(listing.items);
                match listing.next {
                    None => break,
                    Some(next) if !seen.insert(next.clone()) => {
                        warn!(what, cursor = %next, "Listing returned a cursor it already gave out, stopping");
                        break;
                    }
                    Some(next) => cursor = Some(next),
                }
            }
            Err(e) => {
                warn!(
                    what,
                    collected = items.len(),
                    error = %format!("{:#}", e),
                    "Listing failed, keeping partial result"
                );
                return Collected {
                    items,
                    fetches,
                    error: Some(e),
                };
            }
        }
    }

    debug!(what, count = items.len(), fetches, "Listing complete");
    Collected {
        items,
        fetches,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn paged(total: usize, page_size: usize, cursor: Option<String>) -> Listing<usize> {
        let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (start + page_size).min(total);
        let next = (end < total).then(|| end.to_string());
        Listing::new((start..end).collect(), next)
    }

    #[tokio::test]
    async fn fetches_ceil_n_over_p_pages() {
        for (total, page_size, expected_fetches) in [(10, 3, 4), (9, 3, 3), (1, 5, 1), (0, 5, 1)] {
            let collected = collect_all("numbers", |cursor| async move {
                Ok::<_, anyhow::Error>(paged(total, page_size, cursor))
            })
            .await;

            assert!(collected.is_complete());
            assert_eq!(collected.items, (0..total).collect::<Vec<_>>());
            assert_eq!(collected.fetches, expected_fetches, "total={total} page={page_size}");
        }
    }

    #[tokio::test]
    async fn failure_keeps_partial_result_and_stops() {
        let calls = AtomicUsize::new(0);
        let collected = collect_all("numbers", |cursor| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 2 {
                    anyhow::bail!("HTTP 502");
                }
                Ok(paged(20, 4, cursor))
            }
        })
        .await;

        assert_eq!(collected.items, (0..8).collect::<Vec<_>>());
        assert_eq!(collected.fetches, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(collected.error_message().as_deref(), Some("HTTP 502"));
    }

    #[tokio::test]
    async fn repeated_cursor_ends_listing() {
        let collected = collect_all("stuck", |_cursor| async move {
            Ok::<_, anyhow::Error>(Listing::new(vec![1], Some("same".to_string())))
        })
        .await;

        assert!(collected.is_complete());
        assert_eq!(collected.fetches, 2);
        assert_eq!(collected.items, vec![1, 1]);
    }

    #[tokio::test]
    async fn cursor_cycle_ends_listing() {
        let calls = AtomicUsize::new(0);
        let collected = collect_all("cycling", |cursor| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let next = match cursor.as_deref() {
                    Some("a") => "b",
                    _ => "a",
                };
                Ok::<_, anyhow::Error>(Listing::new(vec![1], Some(next.to_string())))
            }
        })
        .await;

        // None -> a -> b -> a (already seen)
        assert!(collected.is_complete());
        assert_eq!(collected.fetches, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(collected.items.len(), 3);
    }
}
