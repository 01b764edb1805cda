//! Range-header pagination for the Heroku Platform API
//!
//! Heroku pages list endpoints with a `Range` request header. A `206 Partial
//! Content` response carries a `Next-Range` header holding the value to send
//! for the following page; a `200 OK` is the last page.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Maximum page size supported by the Heroku API.
/// Using this as default minimizes API calls.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Response header carrying the range of the next page
pub const NEXT_RANGE_HEADER: &str = "Next-Range";

/// Range parameters for the first request of a listing.
///
/// Listings range over `id` in the API's default order.
///
/// # Example
/// ```ignore
/// let range = RangeParams::new().max(200);
/// assert_eq!(range.header_value(), "id ..; max=200");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RangeParams {
    /// Number of items per page (default: 1000, max: 1000)
    pub max: usize,
}

impl Default for RangeParams {
    fn default() -> Self {
        Self { max: MAX_PAGE_SIZE }
    }
}

impl RangeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn max(mut self, max: usize) -> Self {
        self.max = max.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Value for the `Range` request header.
    pub fn header_value(&self) -> String {
        format!("id ..; max={}", self.max)
    }
}

/// One page of a ranged listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    /// `Range` value for the next request; `None` on the last page
    pub next_range: Option<String>,
}

/// Extract the next page's range from a response.
///
/// Only a `206` with a non-empty `Next-Range` header continues the listing.
pub fn next_range(status: StatusCode, headers: &HeaderMap) -> Option<String> {
    if status != StatusCode::PARTIAL_CONTENT {
        return None;
    }
    headers
        .get(NEXT_RANGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
