//! Wire types for the matter API list endpoints.

use serde::{Deserialize, Serialize};

/// Paging metadata. Any field may be missing; see `has_more_pages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// One page of a list endpoint. Records stay raw JSON until the
/// transformer for their type decodes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageEnvelope {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Decide whether another page should be requested after receiving
/// `received` records ending at `next_offset`.
///
/// An explicit `has_more` wins; otherwise the total, then the limit the
/// server echoed. Without any metadata the server may have capped the page
/// below the requested size, so only an empty page ends the listing.
pub fn has_more_pages(pagination: Option<&Pagination>, next_offset: i64, received: i64) -> bool {
    let Some(p) = pagination else {
        return received > 0;
    };
    match (p.has_more, p.total, p.limit) {
        (Some(has_more), _, _) => has_more,
        (None, Some(total), _) => next_offset < total,
        (None, None, Some(limit)) => received >= limit,
        (None, None, None) => received > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_pagination_parses() {
        let page: PageEnvelope =
            serde_json::from_str(r#"{"data":[{"id":1},{"id":2}]}"#).expect("envelope");
        assert_eq!(page.data.len(), 2);
        assert!(page.pagination.is_none());
    }

    #[test]
    fn explicit_has_more_wins() {
        let p = Pagination {
            total: Some(10),
            limit: Some(5),
            has_more: Some(false),
        };
        assert!(!has_more_pages(Some(&p), 5, 5));
    }

    #[test]
    fn total_then_echoed_limit() {
        let by_total = Pagination {
            total: Some(120),
            ..Default::default()
        };
        assert!(has_more_pages(Some(&by_total), 100, 100));
        assert!(!has_more_pages(Some(&by_total), 120, 20));

        let by_limit = Pagination {
            limit: Some(50),
            ..Default::default()
        };
        assert!(has_more_pages(Some(&by_limit), 50, 50));
        assert!(!has_more_pages(Some(&by_limit), 80, 30));
    }

    #[test]
    fn short_page_without_metadata_keeps_paging() {
        // Asked for 500 tasks, the server capped the page at 200.
        assert!(has_more_pages(None, 200, 200));
        assert!(has_more_pages(Some(&Pagination::default()), 200, 200));
        assert!(!has_more_pages(None, 200, 0));
    }
}
