//! Symbol records produced by the per-language extractors.

use serde::{Deserialize, Serialize};

/// Best-effort declaration visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Internal,
    Private,
    Fileprivate,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
            Visibility::Fileprivate => "fileprivate",
        }
    }
}

/// One heuristically detected declaration.
///
/// The extractors are line-oriented regex scanners, not parsers: `end_line`
/// comes from a bounded forward scan over braces or indentation and is
/// approximate by design. Ids are the deterministic triple
/// `"{file}:{name}:{line}"`, unique within one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Deterministic id: `"{file}:{name}:{line}"`.
    pub id: String,

    /// Declared name.
    pub name: String,

    /// Declaration kind: class, struct, enum, function, protocol, trait,
    /// interface, type, impl, extension, component, ... Open vocabulary,
    /// language dependent.
    pub kind: String,

    /// Root-relative path of the owning file.
    pub file: String,

    /// 1-based declaration line.
    pub line: u32,

    /// 1-based best-effort block end line.
    pub end_line: u32,

    /// First few lines of the declaration.
    pub code_preview: String,

    /// Best-effort visibility.
    #[serde(default)]
    pub visibility: Visibility,

    /// Documentation comment attached to the declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

impl Symbol {
    /// Build the deterministic symbol id for a declaration site.
    pub fn make_id(file: &str, name: &str, line: u32) -> String {
        format!("{}:{}:{}", file, name, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_make_id_is_deterministic() {
        assert_eq!(Symbol::make_id("src/app.py", "MyApp", 12), "src/app.py:MyApp:12");
        assert_eq!(
            Symbol::make_id("src/app.py", "MyApp", 12),
            Symbol::make_id("src/app.py", "MyApp", 12)
        );
    }

    #[test]
    fn test_visibility_serde() {
        let json = serde_json::to_string(&Visibility::Fileprivate).unwrap();
        assert_eq!(json, "\"fileprivate\"");
        assert_eq!(Visibility::default(), Visibility::Internal);
    }

    #[test]
    fn test_symbol_roundtrip() {
        let sym = Symbol {
            id: Symbol::make_id("lib.rs", "Scanner", 3),
            name: "Scanner".to_string(),
            kind: "struct".to_string(),
            file: "lib.rs".to_string(),
            line: 3,
            end_line: 20,
            code_preview: "pub struct Scanner {".to_string(),
            visibility: Visibility::Public,
            docstring: Some("The scanner.".to_string()),
        };
        let json = serde_json::to_string(&sym).unwrap();
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sym);
    }
}
