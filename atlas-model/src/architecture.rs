//! The whole-scan result document.

use crate::component::Component;
use crate::file::FileInfo;
use crate::relationship::Relationship;
use crate::symbol::Symbol;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema/analyzer version stamped into every document.
pub const ANALYZER_VERSION: &str = "1.0.0";

/// Aggregate counts for one scan (or one merged multi-repo document).
///
/// `total_symbols` is the pre-cap discovered count; when a symbol cap is
/// configured the emitted `symbols` list may be shorter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_files: usize,
    pub total_lines: u64,
    pub total_size_bytes: u64,
    /// Line counts per language.
    pub languages: BTreeMap<String, u64>,
    pub total_symbols: usize,
    pub total_components: usize,
    pub total_relationships: usize,
}

impl ScanStats {
    /// Field-wise accumulate another scan's stats (multi-repo merge).
    pub fn absorb(&mut self, other: &ScanStats) {
        self.total_files += other.total_files;
        self.total_lines += other.total_lines;
        self.total_size_bytes += other.total_size_bytes;
        self.total_symbols += other.total_symbols;
        self.total_components += other.total_components;
        self.total_relationships += other.total_relationships;
        for (lang, lines) in &other.languages {
            *self.languages.entry(lang.clone()).or_insert(0) += lines;
        }
    }

    /// The language with the most lines, if any.
    pub fn primary_language(&self) -> Option<&str> {
        self.languages
            .iter()
            .max_by_key(|(_, lines)| **lines)
            .map(|(lang, _)| lang.as_str())
    }
}

/// Descriptor for one repository in a merged multi-repo document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    /// Detected remote URL, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// The complete result of one analyzer invocation. Write-once: assembled at
/// the end of the pipeline and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Project (or solution) name.
    pub name: String,

    /// Short description, usually from the root README.
    pub description: String,

    /// Detected repository URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// RFC 3339 generation timestamp.
    pub generated_at: String,

    /// Analyzer schema version.
    pub analyzer_version: String,

    /// Absolute path of the scanned root (empty for merged documents).
    pub root_path: String,

    /// Component forest, nested depth-first.
    #[serde(default)]
    pub components: Vec<Component>,

    /// Flat relationship list.
    #[serde(default)]
    pub relationships: Vec<Relationship>,

    /// Flat (possibly capped) symbol list.
    #[serde(default)]
    pub symbols: Vec<Symbol>,

    /// Flat file list.
    #[serde(default)]
    pub files: Vec<FileInfo>,

    /// Aggregate counts.
    #[serde(default)]
    pub stats: ScanStats,

    /// Per-repository descriptors (multi-repo only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<RepositoryRef>,
}

impl Architecture {
    /// Create an empty document stamped with the current time.
    pub fn new(name: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            repository: None,
            generated_at: Utc::now().to_rfc3339(),
            analyzer_version: ANALYZER_VERSION.to_string(),
            root_path: root_path.into(),
            components: Vec::new(),
            relationships: Vec::new(),
            symbols: Vec::new(),
            files: Vec::new(),
            stats: ScanStats::default(),
            repositories: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stats_absorb() {
        let mut a = ScanStats {
            total_files: 2,
            total_lines: 100,
            total_size_bytes: 1000,
            languages: BTreeMap::from([("rust".to_string(), 100)]),
            total_symbols: 5,
            total_components: 1,
            total_relationships: 0,
        };
        let b = ScanStats {
            total_files: 3,
            total_lines: 50,
            total_size_bytes: 500,
            languages: BTreeMap::from([("rust".to_string(), 20), ("python".to_string(), 30)]),
            total_symbols: 2,
            total_components: 2,
            total_relationships: 1,
        };
        a.absorb(&b);

        assert_eq!(a.total_files, 5);
        assert_eq!(a.total_lines, 150);
        assert_eq!(a.languages["rust"], 120);
        assert_eq!(a.languages["python"], 30);
        assert_eq!(a.total_relationships, 1);
    }

    #[test]
    fn test_primary_language() {
        let stats = ScanStats {
            languages: BTreeMap::from([("swift".to_string(), 10), ("python".to_string(), 90)]),
            ..Default::default()
        };
        assert_eq!(stats.primary_language(), Some("python"));
        assert_eq!(ScanStats::default().primary_language(), None);
    }

    #[test]
    fn test_architecture_roundtrip() {
        let arch = Architecture::new("demo", "/tmp/demo");
        let json = serde_json::to_string(&arch).unwrap();
        let back: Architecture = serde_json::from_str(&json).unwrap();
        assert_eq!(back, arch);
        assert_eq!(back.analyzer_version, ANALYZER_VERSION);
    }
}
