use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Clamp the requested window to `1..=max_limit` rows starting at a non-negative offset.
    pub fn resolve(self, default_limit: i64, max_limit: i64) -> Pagination {
        Pagination {
            limit: self.limit.unwrap_or(default_limit).clamp(1, max_limit),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total_count,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}
