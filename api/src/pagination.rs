use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

/// One page of a fully materialized result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole result set before paging
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    /// Slice `items` to `[offset, offset + limit)`.
    ///
    /// Negative offsets count as zero and the limit is clamped to `1..=MAX_LIMIT`.
    pub fn paginate(items: Vec<T>, limit: i64, offset: i64) -> Self {
        let limit = limit.clamp(1, MAX_LIMIT);
        let offset = offset.max(0);
        let total = items.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
        // limit is clamped to a small positive range
        let take = limit as usize;

        let items = items.into_iter().skip(start).take(take).collect();
        Self {
            items,
            total,
            limit,
            offset,
        }
    }
}
