use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload stored alongside each chunk vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkPayload {
    /// Vault-relative path with forward slashes
    pub path: String,

    /// Chunk text
    pub text: String,

    /// Nearest enclosing section title
    pub heading: Option<String>,

    /// Start line in the source document (1-indexed)
    pub line_start: usize,

    /// End line in the source document (1-indexed, inclusive)
    pub line_end: usize,

    /// 0-based emission order within the source file
    pub chunk_index: usize,

    /// Fingerprint of the file content this chunk was cut from
    pub content_fingerprint: String,
}

/// A stored point: id, vector, payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Create a point with a fresh random id
    #[must_use]
    pub fn new(vector: Vec<f32>, payload: ChunkPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            payload,
        }
    }
}

/// Payload-level filter for queries and scrolls.
///
/// `path` and `path_prefix` both constrain the `path` field; callers are
/// expected to set at most one of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadFilter {
    /// Exact path match
    pub path: Option<String>,

    /// Path starts with this prefix
    pub path_prefix: Option<String>,

    /// Exclude points with this exact path
    pub exclude_path: Option<String>,
}

impl PayloadFilter {
    /// Filter to a single file
    #[must_use]
    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Filter to a folder subtree
    #[must_use]
    pub fn by_prefix(prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// True when no constraint is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.path_prefix.is_none() && self.exclude_path.is_none()
    }

    /// Evaluate the filter against a payload
    #[must_use]
    pub fn matches(&self, payload: &ChunkPayload) -> bool {
        if let Some(path) = &self.path {
            if payload.path != *path {
                return false;
            }
        }

        if let Some(prefix) = &self.path_prefix {
            if !payload.path.starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(excluded) = &self.exclude_path {
            if payload.path == *excluded {
                return false;
            }
        }

        true
    }
}

/// A query hit with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Collection-level counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Number of stored points
    pub points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload(path: &str) -> ChunkPayload {
        ChunkPayload {
            path: path.to_string(),
            text: "text".to_string(),
            heading: None,
            line_start: 1,
            line_end: 1,
            chunk_index: 0,
            content_fingerprint: "abc".to_string(),
        }
    }

    #[test]
    fn test_filter_exact_path() {
        let filter = PayloadFilter::by_path("notes/a.md");
        assert!(filter.matches(&payload("notes/a.md")));
        assert!(!filter.matches(&payload("notes/a.md.bak")));
        assert!(!filter.matches(&payload("notes/b.md")));
    }

    #[test]
    fn test_filter_prefix() {
        let filter = PayloadFilter::by_prefix("notes/");
        assert!(filter.matches(&payload("notes/a.md")));
        assert!(filter.matches(&payload("notes/deep/b.md")));
        assert!(!filter.matches(&payload("other/a.md")));
    }

    #[test]
    fn test_filter_exclude_path() {
        let filter = PayloadFilter {
            exclude_path: Some("notes/a.md".to_string()),
            ..PayloadFilter::default()
        };
        assert!(!filter.matches(&payload("notes/a.md")));
        assert!(filter.matches(&payload("notes/b.md")));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = PayloadFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&payload("anything.md")));
    }

    #[test]
    fn test_point_ids_are_unique() {
        let a = ChunkPoint::new(vec![0.0], payload("a.md"));
        let b = ChunkPoint::new(vec![0.0], payload("a.md"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_payload_round_trips_through_json() {
        let original = ChunkPayload {
            heading: Some("Heading".to_string()),
            ..payload("notes/a.md")
        };
        let json = serde_json::to_string(&original).unwrap();
        let back: ChunkPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
