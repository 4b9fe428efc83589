//! Response model of the remote image-similarity search
//!
//! The transport lives elsewhere. This module only decides what a query must
//! contain and turns whatever comes back into a result list. Anything
//! unexpected degrades to an empty list.

use serde::{Deserialize, Serialize};

/// What the user submits: an uploaded file or a pasted image URL
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    File { bytes: Vec<u8>, filename: String },
    Url(String),
}

impl SearchQuery {
    /// Build a query from the form state. A file wins over a URL; a blank
    /// URL with no file yields `None` and no request should be made.
    pub fn from_form(file: Option<(Vec<u8>, String)>, url: &str) -> Option<Self> {
        match file {
            Some((bytes, filename)) => Some(SearchQuery::File { bytes, filename }),
            None if !url.trim().is_empty() => Some(SearchQuery::Url(url.trim().to_string())),
            None => None,
        }
    }

    /// Multipart form field the service expects
    pub fn form_field(&self) -> &'static str {
        match self {
            SearchQuery::File { .. } => "file",
            SearchQuery::Url(_) => "image_url",
        }
    }
}

/// One ranked match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Cosine similarity in [0, 1]; absent scores read as 0
    #[serde(default)]
    pub similarity: f64,
}

impl SearchHit {
    /// e.g. `"87.35%"`
    pub fn similarity_percent(&self) -> String {
        format!("{:.2}%", self.similarity * 100.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    /// Parse a response body. Missing `results` or a malformed body gives an
    /// empty list; the failure is logged, never returned.
    pub fn parse(body: &str) -> Vec<SearchHit> {
        match serde_json::from_str::<SearchResponse>(body) {
            Ok(resp) => resp.results,
            Err(e) => {
                log::error!("Search response unreadable: {}", e);
                Vec::new()
            }
        }
    }

    /// Outcome of a transport attempt: failures become an empty list
    pub fn from_transport<E: std::fmt::Display>(outcome: Result<String, E>) -> Vec<SearchHit> {
        match outcome {
            Ok(body) => Self::parse(&body),
            Err(e) => {
                log::error!("Search request failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let body = r#"{"results": [
            {"id": 7, "name": "Desk lamp", "category": "Lighting",
             "image_url": "https://example.com/lamp.jpg", "similarity": 0.87354}
        ]}"#;
        let hits = SearchResponse::parse(body);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_deref(), Some("Desk lamp"));
        assert_eq!(hits[0].similarity_percent(), "87.35%");
    }

    #[test]
    fn test_hit_without_similarity_is_kept() {
        let body = r#"{"results": [
            {"id": "a1", "name": "Chair", "similarity": 0.5},
            {"id": "b2", "name": "Table"}
        ]}"#;
        let hits = SearchResponse::parse(body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].similarity, 0.0);
        assert_eq!(hits[1].similarity_percent(), "0.00%");
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(SearchResponse::parse(r#"{"detail": "Provide file or image_url"}"#).is_empty());
    }

    #[test]
    fn test_garbage_and_transport_errors_are_empty() {
        assert!(SearchResponse::parse("<html>502</html>").is_empty());
        assert!(SearchResponse::from_transport::<&str>(Err("connection reset")).is_empty());
        let ok = SearchResponse::from_transport::<&str>(Ok(r#"{"results": []}"#.into()));
        assert!(ok.is_empty());
    }

    #[test]
    fn test_query_from_form() {
        assert_eq!(SearchQuery::from_form(None, "   "), None);
        let url = SearchQuery::from_form(None, " https://x/y.png ").unwrap();
        assert_eq!(url, SearchQuery::Url("https://x/y.png".into()));
        assert_eq!(url.form_field(), "image_url");

        let file = SearchQuery::from_form(Some((vec![1, 2], "a.png".into())), "https://x").unwrap();
        assert_eq!(file.form_field(), "file");
    }
}
