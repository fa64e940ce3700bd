//! In-memory [`FinanceApi`] for engine tests.

use core::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::client::FinanceApi;
use crate::error::{ReportError, Result};

/// Canned responses keyed by path, or by path and page number.
///
/// Unknown paths answer like the real server does for a missing
/// resource: HTTP 404.
#[derive(Debug, Default)]
pub(crate) struct MockApi {
    /// Response bodies by key.
    responses: HashMap<String, Value>,
    /// Error statuses by path.
    statuses: HashMap<String, u16>,
    /// Every request as `path?query`, in order.
    calls: RefCell<Vec<String>>,
}

impl MockApi {
    /// Creates a mock with no responses.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers every request for `path` with `body`.
    pub(crate) fn with(mut self, path: &str, body: Value) -> Self {
        drop(self.responses.insert(path.to_owned(), body));
        self
    }

    /// Answers requests for one page of `path` with `body`.
    pub(crate) fn with_page(mut self, path: &str, page: i64, body: Value) -> Self {
        drop(self.responses.insert(format!("{path}#page={page}"), body));
        self
    }

    /// Answers every request for `path` with an error status.
    pub(crate) fn with_status(mut self, path: &str, status: u16) -> Self {
        _ = self.statuses.insert(path.to_owned(), status);
        self
    }

    /// All requests made so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of requests made for exactly `path`.
    pub(crate) fn call_count(&self, path: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.split('?').next() == Some(path))
            .count()
    }
}

impl FinanceApi for MockApi {
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let rendered: Vec<String> = query.iter().map(|(key, value)| format!("{key}={value}")).collect();
        self.calls
            .borrow_mut()
            .push(format!("{path}?{}", rendered.join("&")));

        if let Some(&status) = self.statuses.get(path) {
            return Err(ReportError::Api {
                status,
                message: "mock failure".to_owned(),
            });
        }
        let page_key = query
            .iter()
            .find(|(key, _)| *key == "page")
            .map(|(_, page)| format!("{path}#page={page}"));
        page_key
            .and_then(|key| self.responses.get(&key))
            .or_else(|| self.responses.get(path))
            .cloned()
            .ok_or_else(|| ReportError::Api {
                status: 404,
                message: r#"{"message":"Resource not found","exception":"NotFoundHttpException"}"#
                    .to_owned(),
            })
    }
}
