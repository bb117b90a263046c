//! One page of the listing endpoint.

use serde_json::Value;

use super::identifier::Identifier;

/// Identifiers extracted from a single pagination call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number that produced this page
    pub number: u32,
    /// Usable identifiers, in listing order
    pub identifiers: Vec<Identifier>,
    /// Raw number of entries in `results`, including ones without a usable uid
    pub entry_count: usize,
}

impl Page {
    /// Build a page from a listing payload (`{"results": [{"uid": ...}, ...]}`).
    ///
    /// A missing or non-array `results` field is read as an empty page.
    pub fn from_payload(number: u32, payload: &Value) -> Self {
        let entries = payload
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Self {
            number,
            identifiers: entries
                .iter()
                .filter_map(Identifier::from_listing_entry)
                .collect(),
            entry_count: entries.len(),
        }
    }

    /// An empty page marks the end of the catalog
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Fewer entries than requested
    pub fn is_short(&self, page_limit: u32) -> bool {
        self.entry_count < page_limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_entries_without_uid_but_counts_them() {
        let payload = json!({
            "results": [
                {"uid": "1", "name": "Luke Skywalker"},
                {"uid": "   ", "name": "blank"},
                {"name": "missing"},
                {"uid": "4", "name": "Darth Vader"}
            ]
        });

        let page = Page::from_payload(3, &payload);
        assert_eq!(page.number, 3);
        assert_eq!(page.entry_count, 4);
        let ids: Vec<&str> = page.identifiers.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert!(!page.is_empty());
    }

    #[test]
    fn missing_results_is_an_empty_page() {
        assert!(Page::from_payload(1, &json!({"message": "ok"})).is_empty());
        assert!(Page::from_payload(1, &json!({"results": null})).is_empty());
        assert!(Page::from_payload(1, &json!({"results": []})).is_empty());
    }

    #[test]
    fn short_page_detection_uses_raw_entry_count() {
        let payload = json!({"results": [{"uid": ""}, {"uid": "2"}]});
        let page = Page::from_payload(1, &payload);
        assert!(page.is_short(3));
        assert!(!page.is_short(2));
    }
}
