//! Pagination fan-out.
//!
//! [`combine_pages`] fetches page 1, reads the pagination metadata from its
//! body and then fetches every remaining page at once:
//!
//! ```text
//! page 1 ──► current_page, total_count, per_page
//!              │
//!              ├─► page 2 ─┐
//!              ├─► page 3 ─┼─► join_all ─► { data: [page 1, page 2, ...] }
//!              └─► page N ─┘
//! ```
//!
//! Only a page-1 failure stops the run. Later failures stay in the result
//! list and the loader still ends in success.

use std::future::Future;

use futures_util::future::join_all;
use hermes_core::{Action, ApiCtx, ApiFailure, FetchJson, Store};
use hermes_telemetry::metrics::record_pages_fetched;
use serde_json::{json, Value};

/// Page cap used when none is configured.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Pagination metadata carried by a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// The page this response holds.
    pub current_page: u32,
    /// Items across all pages.
    pub total_count: u64,
    /// Items per page.
    pub per_page: u64,
}

impl PageInfo {
    /// Reads `current_page`, `total_count` and `per_page` from a body.
    ///
    /// Numbers sent as strings are accepted. Returns `None` if any field is
    /// missing.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        Some(Self {
            current_page: u32::try_from(number(body, "current_page")?).ok()?,
            total_count: number(body, "total_count")?,
            per_page: number(body, "per_page")?,
        })
    }

    /// Returns the last page to fetch: `min(max, ceil(total_count / per_page))`.
    ///
    /// With `per_page == 0` nothing beyond the current page is fetched.
    ///
    /// ```
    /// use hermes_client::PageInfo;
    ///
    /// let info = PageInfo { current_page: 1, total_count: 97, per_page: 20 };
    /// assert_eq!(info.last_page(50), 5);
    /// assert_eq!(info.last_page(3), 3);
    /// ```
    #[must_use]
    pub fn last_page(&self, max: u32) -> u32 {
        if self.per_page == 0 {
            return self.current_page;
        }
        let pages = self.total_count.div_ceil(self.per_page);
        u32::try_from(pages).unwrap_or(u32::MAX).min(max)
    }
}

fn number(body: &Value, field: &str) -> Option<u64> {
    match body.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Every page's outcome, page 1 first and the rest in issuance order.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedPages {
    /// Per-page outcomes.
    pub data: Vec<FetchJson>,
}

impl CombinedPages {
    /// Returns the number of pages fetched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no page was fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the bodies of the pages that succeeded.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.iter().filter_map(|page| page.as_ref().ok())
    }

    /// Returns the failures of the pages that did not.
    pub fn failures(&self) -> impl Iterator<Item = &ApiFailure> {
        self.data.iter().filter_map(|page| page.as_ref().err())
    }

    /// Renders the result as `{ "data": [{ "ok": .., .. }, ..] }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let data: Vec<Value> = self
            .data
            .iter()
            .map(|page| match page {
                Ok(value) => json!({ "ok": true, "data": value }),
                Err(failure) => json!({ "ok": false, "error": failure }),
            })
            .collect();
        json!({ "data": data })
    }
}

fn page_outcome(ctx: &mut ApiCtx) -> FetchJson {
    match ctx.take_json() {
        Some(outcome) => outcome,
        None if ctx.aborted() => Err(ApiFailure::new("The operation was aborted")),
        None => Err(ApiFailure::new(format!("{} produced no response", ctx.name()))),
    }
}

/// Fetches every page of a paginated resource.
///
/// `fetch_page(n)` runs the call for page `n`. The loader `key` tracks the
/// whole run; `endpoint` names the paginated route in metrics. Page 1 completes before any other page is requested; pages
/// `current_page + 1 ..= last_page` are then requested together.
///
/// # Errors
///
/// Returns the page-1 failure, after recording it on the loader. An
/// aborted page 1 resets the loader instead.
pub async fn combine_pages<F, Fut>(
    store: &Store,
    endpoint: &str,
    key: &str,
    max: u32,
    fetch_page: F,
) -> Result<CombinedPages, ApiFailure>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = ApiCtx>,
{
    store.dispatch(Action::LoaderStart { id: key.to_string() });

    let mut first = fetch_page(1).await;
    let body = match page_outcome(&mut first) {
        Ok(body) => body,
        Err(failure) => {
            if first.aborted() {
                store.dispatch(Action::LoaderReset { id: key.to_string() });
            } else {
                store.dispatch(Action::LoaderError {
                    id: key.to_string(),
                    message: failure.message.clone(),
                    meta: Value::Null,
                });
            }
            return Err(failure);
        }
    };

    let (current_page, last_page) = match PageInfo::from_body(&body) {
        Some(info) => (info.current_page, info.last_page(max)),
        None => (1, 1),
    };
    tracing::debug!(key, current_page, last_page, "fanning out page requests");

    let rest = join_all((current_page.saturating_add(1)..=last_page).map(&fetch_page)).await;

    let mut data = Vec::with_capacity(rest.len() + 1);
    data.push(Ok(body));
    data.extend(rest.into_iter().map(|mut ctx| page_outcome(&mut ctx)));
    let pages = CombinedPages { data };

    let failed = pages.failures().count();
    if failed > 0 {
        tracing::debug!(key, failed, "some pages failed");
    }
    record_pages_fetched(endpoint, pages.len() as u64);

    store.dispatch(Action::LoaderSuccess {
        id: key.to_string(),
        meta: json!({ "pages": pages.len(), "failed": failed }),
    });
    Ok(pages)
}
