//! The label→URL mapping that drives an extraction batch.
//!
//! Output order is contractually the iteration order of the input map, so a
//! plain `HashMap` would break reproducibility. `IndexMap` preserves
//! insertion order, and with serde that means JSON-object document order:
//! `{"sofa": …, "lamp": …}` always resolves sofa first.

use indexmap::IndexMap;

/// Insertion-ordered mapping from arbitrary label to product-page URL.
///
/// Keys are unique; deserialising a JSON object with a repeated key keeps
/// the first key's position and the last key's value.
pub type LinkMap = IndexMap<String, String>;

/// Parse a LinkMap from a JSON object string.
///
/// This is the wire format the boundary receives (`links` form field).
pub fn parse_link_map(json: &str) -> Result<LinkMap, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_document_order() {
        let links =
            parse_link_map(r#"{"zebra": "https://z", "apple": "https://a", "mango": "https://m"}"#)
                .unwrap();
        let labels: Vec<&String> = links.keys().collect();
        assert_eq!(labels, ["zebra", "apple", "mango"]);
    }

    #[test]
    fn duplicate_key_last_value_wins() {
        let links = parse_link_map(r#"{"sofa": "https://first", "sofa": "https://second"}"#).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links["sofa"], "https://second");
    }

    #[test]
    fn rejects_non_object_input() {
        assert!(parse_link_map(r#"["https://a", "https://b"]"#).is_err());
        assert!(parse_link_map("not json").is_err());
    }

    #[test]
    fn empty_object_is_empty_map() {
        assert!(parse_link_map("{}").unwrap().is_empty());
    }
}
