//! Search term extraction from JSON publication payloads.
//!
//! Flat-file publications never reach the extractor; their `search` column
//! stays NULL.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

/// Extracts a search index from a JSON list payload.
#[async_trait]
pub trait PayloadExtractor: Send + Sync {
    /// Produce a mapping of search keys to matched values for the payload.
    async fn extract_search_terms(&self, payload: &str) -> Result<Value>;
}

/// Default extractor: walks the payload for case references and collects
/// case number, name and URN wherever they appear.
pub struct JsonSearchExtractor;

#[async_trait]
impl PayloadExtractor for JsonSearchExtractor {
    async fn extract_search_terms(&self, payload: &str) -> Result<Value> {
        let root: Value = serde_json::from_str(payload)?;

        let mut cases = Vec::new();
        collect_cases(&root, &mut cases);

        Ok(json!({ "cases": cases }))
    }
}

/// Recursively collect objects that look like case references.
fn collect_cases(node: &Value, out: &mut Vec<Value>) {
    match node {
        Value::Object(map) => {
            let number = map.get("caseNumber").and_then(Value::as_str);
            let name = map.get("caseName").and_then(Value::as_str);
            let urn = map.get("caseUrn").and_then(Value::as_str);

            if number.is_some() || name.is_some() || urn.is_some() {
                out.push(json!({
                    "caseNumber": number,
                    "caseName": name,
                    "caseUrn": urn,
                }));
            }

            for value in map.values() {
                collect_cases(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_cases(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_nested_case_references() {
        let payload = r#"{
            "courtLists": [{
                "sessions": [{
                    "sittings": [
                        {"hearing": {"caseNumber": "1234", "caseName": "A v B"}},
                        {"hearing": {"caseUrn": "URN-99"}}
                    ]
                }]
            }]
        }"#;

        let extractor = JsonSearchExtractor;
        let search = extractor.extract_search_terms(payload).await.unwrap();

        let cases = search["cases"].as_array().unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0]["caseNumber"], "1234");
        assert_eq!(cases[0]["caseName"], "A v B");
        assert_eq!(cases[1]["caseUrn"], "URN-99");
    }

    #[tokio::test]
    async fn payload_without_cases_yields_empty_index() {
        let extractor = JsonSearchExtractor;
        let search = extractor
            .extract_search_terms(r#"{"venue": {"venueName": "Mold Justice Centre"}}"#)
            .await
            .unwrap();

        assert_eq!(search["cases"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let extractor = JsonSearchExtractor;
        assert!(extractor.extract_search_terms("not json").await.is_err());
    }
}
