//! Query parameters and pagination utilities

use crate::storage::{Sort, SortDirection};
use serde::{Deserialize, Serialize};

const MAX_LIMIT: u64 = 100;
/// Largest offset the storage backends accept (MongoDB encodes it as i64)
const MAX_SKIP: u64 = i64::MAX as u64;

/// Pagination and sort parameters shared by every listing
///
/// Values are kept as raw strings so a malformed number falls back to the
/// default instead of rejecting the request.
///
/// # Example
/// ```text
/// GET /api/orders?page=2&limit=10&sort=createdAt&order=asc
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListParams {
    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Number of items per page
    pub limit: Option<String>,

    /// Field to sort on
    pub sort: Option<String>,

    /// `asc` or `desc` (default)
    pub order: Option<String>,
}

impl ListParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Get limit, clamped to 1..=100
    pub fn limit(&self, default: u64) -> u64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<u64>().ok())
            .unwrap_or(default)
            .clamp(1, MAX_LIMIT)
    }

    /// Number of records to skip for the requested page
    pub fn skip(&self, default_limit: u64) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit(default_limit))
            .min(MAX_SKIP)
    }

    /// Requested sort; fields outside `allowed` fall back to `createdAt`
    pub fn sort(&self, allowed: &[&str]) -> Sort {
        let field = self
            .sort
            .as_deref()
            .filter(|field| allowed.contains(field))
            .unwrap_or("createdAt");
        let direction = self
            .order
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or_default();

        Sort {
            field: field.to_string(),
            direction,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub limit: u64,

    /// Total number of items (after filters)
    pub total: u64,

    /// Total number of pages
    pub total_pages: u64,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
