//! Contribution fetcher: walks every page of a user's contributions and
//! keeps the earliest edit per title.

use std::time::Duration;

use tracing::{debug, info, warn};

use views_core::models::{Contribution, ContributionMap};

use crate::client::{ContinuationToken, WikiApi};

/// Fold `items` into `map`, keeping the earliest timestamp per title.
///
/// Timestamps are fixed-width `%Y-%m-%dT%H:%M:%SZ`, so string order is
/// chronological order.
pub fn merge_contributions<I>(map: &mut ContributionMap, items: I)
where
    I: IntoIterator<Item = Contribution>,
{
    for item in items {
        match map.get(&item.title) {
            Some(existing) if existing.as_str() <= item.timestamp.as_str() => {}
            _ => {
                map.insert(item.title, item.timestamp);
            }
        }
    }
}

/// Page through `user`'s contributions until the listing is exhausted.
///
/// `delay` is slept between pages. A failed page ends pagination and the
/// titles gathered so far are returned; an unknown or empty user simply
/// yields an empty map.
pub async fn fetch_contributions<A>(api: &A, user: &str, delay: Duration) -> ContributionMap
where
    A: WikiApi + ?Sized,
{
    info!("Fetching contributions for user: {}", user);

    let mut contribs = ContributionMap::new();
    let mut continuation: Option<ContinuationToken> = None;
    let mut pages = 0usize;

    loop {
        let page = match api.contributions_page(user, continuation.as_ref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    error = %e,
                    pages,
                    kept = contribs.len(),
                    "Error fetching contributions; keeping partial results"
                );
                break;
            }
        };
        pages += 1;
        merge_contributions(&mut contribs, page.contributions);

        match page.continuation {
            Some(next) => {
                continuation = Some(next);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            None => break,
        }
    }

    debug!(pages, titles = contribs.len(), "contribution listing complete");
    contribs
}

// ── Tests ─────────────────────────────────────────────────────────────────────
