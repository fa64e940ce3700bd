//! JSON:API envelopes shared by every Firefly III endpoint.

use serde::Deserialize;

/// A single resource object: `{"id": ..., "attributes": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource<I, A> {
    /// Resource identifier.
    pub id: I,
    /// Resource attributes.
    pub attributes: A,
}

/// A response carrying one resource under `data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document<T> {
    /// The resource.
    pub data: T,
}

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    /// Resources on this page.
    pub data: Vec<T>,
    /// Listing metadata, absent on some endpoints.
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T> Page<T> {
    /// Total page count reported by the server.
    ///
    /// A page without pagination metadata is treated as the only page.
    #[inline]
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pagination.as_ref())
            .and_then(|pagination| pagination.total_pages)
            .unwrap_or(1)
    }
}

/// Listing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Meta {
    /// Pagination block.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination counters. Signed, since the server is not trusted to send
/// sensible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// Number of items across all pages.
    #[serde(default)]
    pub total: Option<i64>,
    /// Page this response represents.
    #[serde(default)]
    pub current_page: Option<i64>,
    /// Number of pages.
    #[serde(default)]
    pub total_pages: Option<i64>,
}
