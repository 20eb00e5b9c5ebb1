use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Common `?page=&limit=` query parameters, clamped to sane bounds.
///
/// Query structs carry the two raw fields themselves (serde_urlencoded does
/// not support flattening them) and convert via [`PageQuery::new`].
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Pagination metadata returned alongside paginated listings.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        Self {
            page: query.page(),
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(1_000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 0);

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.offset(), 20);

        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_page_info() {
        let q = PageQuery {
            page: Some(2),
            limit: Some(10),
        };
        let info = PageInfo::new(&q, 25);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.page, 2);

        let info = PageInfo::new(&q, 0);
        assert_eq!(info.total_pages, 0);
    }
}
