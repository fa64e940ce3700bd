//! Bounded walking of paginated listings.

use serde::de::DeserializeOwned;

use crate::client::FinanceApi;
use crate::error::{ReportError, Result};
use crate::models::Page;

/// Hard ceiling on pages fetched from one listing, whatever the server
/// claims in its pagination metadata.
pub(crate) const MAX_PAGES: i64 = 500;

/// Requests `path` page by page and hands each page's items to `visit`.
///
/// Stops once the current page reaches the reported `total_pages` (a
/// missing, zero or negative count ends after page 1) or [`MAX_PAGES`] is
/// hit. Returns the number of pages fetched.
///
/// A page that does not parse as a listing is a
/// [`ReportError::DataShape`] error.
pub(crate) fn fetch_pages<A, T, F>(
    api: &A,
    path: &str,
    query: &[(&str, String)],
    mut visit: F,
) -> Result<i64>
where
    A: FinanceApi + ?Sized,
    T: DeserializeOwned,
    F: FnMut(Vec<T>),
{
    let mut page: i64 = 1;
    loop {
        let mut params = query.to_vec();
        params.push(("page", page.to_string()));
        let body = api.get_json(path, &params)?;
        let parsed: Page<T> = serde_json::from_value(body)
            .map_err(|err| ReportError::DataShape(format!("{path} (page {page}): {err}")))?;
        let total_pages = parsed.total_pages();
        visit(parsed.data);

        if page >= total_pages {
            return Ok(page);
        }
        if page >= MAX_PAGES {
            tracing::warn!(
                path = %path,
                total_pages,
                "pagination exceeds page limit, stopping early"
            );
            return Ok(page);
        }
        page += 1;
    }
}

/// Collects every item of a paginated listing.
pub(crate) fn fetch_all<A, T>(api: &A, path: &str, query: &[(&str, String)]) -> Result<Vec<T>>
where
    A: FinanceApi + ?Sized,
    T: DeserializeOwned,
{
    let mut items = Vec::new();
    let pages = fetch_pages(api, path, query, |data: Vec<T>| items.extend(data))?;
    tracing::debug!(path = %path, pages, items = items.len(), "fetched listing");
    Ok(items)
}
