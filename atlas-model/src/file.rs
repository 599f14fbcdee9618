//! Per-file scan records.

use serde::{Deserialize, Serialize};

/// One scanned source or text file. Created once during the scan phase and
/// immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Root-relative path.
    pub path: String,

    /// Detected language (from the extension table).
    pub language: String,

    /// Line count.
    pub lines: u64,

    /// Size on disk in bytes.
    pub size_bytes: u64,

    /// Ids of symbols detected in this file.
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Raw import tokens, language-native form (module names, relative
    /// paths, crate names).
    #[serde(default)]
    pub imports: Vec<String>,

    /// File-level documentation (module docstring, header comment).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_doc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_info_roundtrip() {
        let info = FileInfo {
            path: "src/index.ts".to_string(),
            language: "typescript".to_string(),
            lines: 42,
            size_bytes: 1337,
            symbols: vec!["src/index.ts:main:1".to_string()],
            imports: vec!["./utils".to_string(), "react".to_string()],
            module_doc: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: FileInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
