//! Page arithmetic and the `{data, meta}` response envelope

use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query values. Missing, non-numeric or non-positive
    /// values fall back to the defaults; the limit has no upper bound.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Leading digits only, so `"3abc"` reads as 3
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim_start();
    let digits = raw.len() - raw.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    raw[..digits].parse::<u64>().ok().filter(|v| *v > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, request: &PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(request.limit.max(1)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing_or_invalid() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("0")),
            PageRequest { page: 1, limit: 20 }
        );
        assert_eq!(
            PageRequest::from_query(Some("-2"), Some("")),
            PageRequest { page: 1, limit: 20 }
        );
        assert_eq!(
            PageRequest::from_query(Some("3abc"), Some(" 15")),
            PageRequest { page: 3, limit: 15 }
        );
    }

    #[test]
    fn test_skip_and_unbounded_limit() {
        let request = PageRequest::from_query(Some("3"), Some("500"));
        assert_eq!(request.limit, 500);
        assert_eq!(request.skip(), 1000);
        assert_eq!(PageRequest::default().skip(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let request = PageRequest { page: 1, limit: 20 };
        assert_eq!(PageMeta::new(0, &request).total_pages, 0);
        assert_eq!(PageMeta::new(20, &request).total_pages, 1);
        assert_eq!(PageMeta::new(41, &request).total_pages, 3);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PageMeta::new(45, &PageRequest { page: 2, limit: 20 });
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "total": 45, "page": 2, "limit": 20, "totalPages": 3 })
        );
    }
}
