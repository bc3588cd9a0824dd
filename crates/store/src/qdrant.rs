//! Qdrant REST client.
//!
//! Talks to the collections and points endpoints over JSON. Only the
//! operations the indexing engine relies on are implemented.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

use crate::error::{Result, StoreError};
use crate::traits::VectorStore;
use crate::types::{ChunkPoint, CollectionStats, PayloadFilter, ScoredPoint};

/// [`VectorStore`] backed by a Qdrant server.
pub struct QdrantStore {
    client: Client,
    base_url: String,
}

impl QdrantStore {
    /// Build a client for `base_url` (e.g. `http://localhost:6333`).
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::Storage(format!(
                "Qdrant URL must be http(s): {base_url}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key.trim())
                .map_err(|_| StoreError::Storage("invalid Qdrant API key".to_string()))?;
            headers.insert("api-key", value);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Turn a non-success response into a `Storage` error with the body text.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        Err(StoreError::Storage(format!(
            "Qdrant request failed ({status}): {body}"
        )))
    }
}

/// Render a payload filter in Qdrant's filter DSL.
///
/// Folder scoping uses a full-text match on the `path` field; paths are
/// stored with forward slashes so a prefix always falls on token boundaries.
fn qdrant_filter(filter: &PayloadFilter) -> Option<Value> {
    let mut must = Vec::new();
    let mut must_not = Vec::new();

    if let Some(path) = &filter.path {
        must.push(json!({"key": "path", "match": {"value": path}}));
    }
    if let Some(prefix) = &filter.path_prefix {
        must.push(json!({"key": "path", "match": {"text": prefix}}));
    }
    if let Some(excluded) = &filter.exclude_path {
        must_not.push(json!({"key": "path", "match": {"value": excluded}}));
    }

    if must.is_empty() && must_not.is_empty() {
        return None;
    }

    let mut clause = serde_json::Map::new();
    if !must.is_empty() {
        clause.insert("must".to_string(), Value::Array(must));
    }
    if !must_not.is_empty() {
        clause.insert("must_not".to_string(), Value::Array(must_not));
    }
    Some(Value::Object(clause))
}

fn parse_point(value: &Value, with_vectors: bool) -> Result<ChunkPoint> {
    let id = match &value["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(StoreError::Storage(format!(
                "unexpected point id in Qdrant response: {other}"
            )))
        }
    };

    let payload = serde_json::from_value(value["payload"].clone())?;
    let vector = if with_vectors {
        serde_json::from_value(value["vector"].clone())?
    } else {
        Vec::new()
    };

    Ok(ChunkPoint {
        id,
        vector,
        payload,
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let response = self
            .client
            .get(self.url(&format!("collections/{name}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Creating collection '{name}' (dimension {dimension})");
            let body = json!({
                "vectors": {"size": dimension, "distance": "Cosine"}
            });
            let response = self
                .client
                .put(self.url(&format!("collections/{name}")))
                .json(&body)
                .send()
                .await?;
            Self::check(response).await?;
            return Ok(());
        }

        let info: Value = Self::check(response).await?.json().await?;
        let existing = info["result"]["config"]["params"]["vectors"]["size"].as_u64();
        match existing {
            Some(size) if size == dimension as u64 => Ok(()),
            Some(size) => Err(StoreError::CollectionSchema(format!(
                "collection '{name}' has dimension {size}, requested {dimension}"
            ))),
            None => Err(StoreError::Storage(format!(
                "collection '{name}' description missing vector size"
            ))),
        }
    }

    async fn upsert(&self, collection: &str, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body_points = points
            .iter()
            .map(|p| {
                Ok(json!({
                    "id": p.id,
                    "vector": p.vector,
                    "payload": serde_json::to_value(&p.payload)?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        let response = self
            .client
            .put(self.url(&format!("collections/{collection}/points?wait=true")))
            .json(&json!({"points": body_points}))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.url(&format!("collections/{collection}/points/delete?wait=true")))
            .json(&json!({"points": ids}))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
        filter: Option<&PayloadFilter>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = json!(threshold);
        }
        if let Some(clause) = filter.and_then(qdrant_filter) {
            body["filter"] = clause;
        }

        let response = self
            .client
            .post(self.url(&format!("collections/{collection}/points/search")))
            .json(&body)
            .send()
            .await?;
        let parsed: Value = Self::check(response).await?.json().await?;

        let empty = Vec::new();
        let hits = parsed["result"].as_array().unwrap_or(&empty);
        hits.iter()
            .map(|hit| {
                let point = parse_point(hit, false)?;
                let score = hit["score"].as_f64().unwrap_or(0.0) as f32;
                Ok(ScoredPoint {
                    id: point.id,
                    score,
                    payload: point.payload,
                })
            })
            .collect()
    }

    async fn fetch_by_filter(
        &self,
        collection: &str,
        filter: &PayloadFilter,
        with_vectors: bool,
        limit: usize,
    ) -> Result<Vec<ChunkPoint>> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": with_vectors,
        });
        if let Some(clause) = qdrant_filter(filter) {
            body["filter"] = clause;
        }

        let response = self
            .client
            .post(self.url(&format!("collections/{collection}/points/scroll")))
            .json(&body)
            .send()
            .await?;
        let parsed: Value = Self::check(response).await?.json().await?;

        let empty = Vec::new();
        let points = parsed["result"]["points"].as_array().unwrap_or(&empty);
        points.iter().map(|p| parse_point(p, with_vectors)).collect()
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("collections/{name}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let response = self
            .client
            .get(self.url(&format!("collections/{name}")))
            .send()
            .await?;
        let info: Value = Self::check(response).await?.json().await?;

        let points = info["result"]["points_count"].as_u64().unwrap_or(0) as usize;
        Ok(CollectionStats { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejects_non_http_url() {
        assert!(QdrantStore::new("localhost:6333", None).is_err());
        assert!(QdrantStore::new("http://localhost:6333", None).is_ok());
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let store = QdrantStore::new("http://localhost:6333/", None).unwrap();
        assert_eq!(
            store.url("collections/vault"),
            "http://localhost:6333/collections/vault"
        );
    }

    #[test]
    fn test_empty_filter_renders_to_none() {
        assert!(qdrant_filter(&PayloadFilter::default()).is_none());
    }

    #[test]
    fn test_exact_path_filter_shape() {
        let clause = qdrant_filter(&PayloadFilter::by_path("notes/a.md")).unwrap();
        assert_eq!(
            clause,
            serde_json::json!({
                "must": [{"key": "path", "match": {"value": "notes/a.md"}}]
            })
        );
    }

    #[test]
    fn test_exclude_path_renders_as_must_not() {
        let filter = PayloadFilter {
            exclude_path: Some("notes/a.md".to_string()),
            ..PayloadFilter::default()
        };
        let clause = qdrant_filter(&filter).unwrap();
        assert!(clause["must_not"].is_array());
        assert!(clause.get("must").is_none());
    }

    #[test]
    fn test_parse_point_accepts_numeric_ids() {
        let value = serde_json::json!({
            "id": 7,
            "payload": {
                "path": "a.md",
                "text": "t",
                "heading": null,
                "line_start": 1,
                "line_end": 2,
                "chunk_index": 0,
                "content_fingerprint": "fp"
            }
        });
        let point = parse_point(&value, false).unwrap();
        assert_eq!(point.id, "7");
        assert!(point.vector.is_empty());
    }
}
