use serde::Deserialize;
use serde_json::Value;

/// A collection response as the backend sends it.
///
/// Most list endpoints return a paginated envelope; a few return the bare array.
/// Records are kept as raw JSON here so that one malformed record can be skipped
/// without losing the rest of the page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Bare(Vec<Value>),
    Page(Page),
}

/// The paginated envelope: `{count, next, previous, results}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<Value>,
}

impl ListResponse {
    /// Splits the response into this page's records and the link to the next page, if any.
    pub fn into_parts(self) -> (Vec<Value>, Option<String>) {
        match self {
            ListResponse::Bare(records) => (records, None),
            ListResponse::Page(page) => (
                page.results,
                page.next.filter(|link| !link.trim().is_empty()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_has_no_next_page() {
        let resp: ListResponse = serde_json::from_value(json!([{"id": 1}, {"id": 2}])).unwrap();
        let (records, next) = resp.into_parts();
        assert_eq!(records.len(), 2);
        assert!(next.is_none());
    }

    #[test]
    fn envelope_carries_next_link() {
        let resp: ListResponse = serde_json::from_value(json!({
            "count": 12,
            "next": "http://localhost:8000/api/trades/trades/?page=2",
            "previous": null,
            "results": [{"id": 1}]
        }))
        .unwrap();
        let (records, next) = resp.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(next.as_deref(), Some("http://localhost:8000/api/trades/trades/?page=2"));
    }

    #[test]
    fn envelope_without_results_is_empty() {
        let resp: ListResponse = serde_json::from_value(json!({"count": 0, "next": ""})).unwrap();
        let (records, next) = resp.into_parts();
        assert!(records.is_empty());
        assert!(next.is_none());
    }
}
