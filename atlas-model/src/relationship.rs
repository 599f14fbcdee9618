//! Relationship (edge) types for the architecture graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown relationship type string.
#[derive(Debug, Error)]
#[error("Unknown relationship type: {0}")]
pub struct UnknownRelationshipType(pub String);

/// How two components are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Source imports code from target.
    Import,
    /// Source calls target over HTTP (inferred from port references).
    Http,
    Websocket,
    Grpc,
    Ffi,
    Database,
    File,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Import => "import",
            RelationshipType::Http => "http",
            RelationshipType::Websocket => "websocket",
            RelationshipType::Grpc => "grpc",
            RelationshipType::Ffi => "ffi",
            RelationshipType::Database => "database",
            RelationshipType::File => "file",
        }
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = UnknownRelationshipType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import" => Ok(RelationshipType::Import),
            "http" => Ok(RelationshipType::Http),
            "websocket" => Ok(RelationshipType::Websocket),
            "grpc" => Ok(RelationshipType::Grpc),
            "ffi" => Ok(RelationshipType::Ffi),
            "database" => Ok(RelationshipType::Database),
            "file" => Ok(RelationshipType::File),
            _ => Err(UnknownRelationshipType(s.to_string())),
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two components.
///
/// Invariant: within one scan no two edges share the same
/// `(source, target, type)` triple; the relationship-detection phase
/// enforces this with a first-seen-wins dedup set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source component id.
    pub source: String,

    /// Target component id.
    pub target: String,

    /// Edge classification.
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// Human-readable edge label (import token, "port 8080", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Wire protocol for network edges (e.g. "REST").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Target port for port-inferred edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Whether traffic flows both ways (cross-repo links may declare this).
    #[serde(default)]
    pub bidirectional: bool,
}

impl Relationship {
    /// Create an edge with no optional metadata.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type,
            label: None,
            protocol: None,
            port: None,
            bidirectional: false,
        }
    }

    /// The dedup key: `(source, target, type)`.
    pub fn key(&self) -> (String, String, RelationshipType) {
        (
            self.source.clone(),
            self.target.clone(),
            self.relationship_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relationship_type_round_trips() {
        for ty in [
            RelationshipType::Import,
            RelationshipType::Http,
            RelationshipType::Websocket,
            RelationshipType::Grpc,
            RelationshipType::Ffi,
            RelationshipType::Database,
            RelationshipType::File,
        ] {
            let parsed: RelationshipType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_relationship_key() {
        let a = Relationship::new("a", "b", RelationshipType::Import);
        let mut b = Relationship::new("a", "b", RelationshipType::Import);
        b.label = Some("different label".to_string());
        // Labels don't affect the dedup key.
        assert_eq!(a.key(), b.key());

        let c = Relationship::new("a", "b", RelationshipType::Http);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_relationship_serde_shape() {
        let mut rel = Relationship::new("frontend", "backend", RelationshipType::Http);
        rel.port = Some(8080);
        rel.label = Some("port 8080".to_string());

        let value = serde_json::to_value(&rel).unwrap();
        assert_eq!(value["type"], "http");
        assert_eq!(value["port"], 8080);
        assert_eq!(value["bidirectional"], false);
        assert!(value.get("protocol").is_none());
    }
}
