//! Go declaration extraction.

use super::{LanguageExtractor, code_preview, find_closing_brace, split_lines};
use atlas_model::{Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^type\s+(\w+)\s+(struct|interface)").unwrap());
static FUNC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^func\s+(?:\(\w+\s+\*?\w+\)\s+)?(\w+)").unwrap());
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([\w./\-]+)""#).unwrap());

fn case_visibility(name: &str) -> Visibility {
    if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

pub struct GoExtractor;

impl LanguageExtractor for GoExtractor {
    fn extract_symbols(
        &self,
        content: &str,
        file_path: &str,
        preview_lines: usize,
    ) -> Vec<Symbol> {
        let lines = split_lines(content);
        let mut symbols = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let (name, kind) = if let Some(caps) = TYPE_RE.captures(line) {
                (caps[1].to_string(), caps[2].to_string())
            } else if let Some(caps) = FUNC_RE.captures(line) {
                (caps[1].to_string(), "function".to_string())
            } else {
                continue;
            };
            let end = find_closing_brace(&lines, i);
            symbols.push(Symbol {
                id: Symbol::make_id(file_path, &name, i as u32 + 1),
                visibility: case_visibility(&name),
                name,
                kind,
                file: file_path.to_string(),
                line: i as u32 + 1,
                end_line: end as u32 + 1,
                code_preview: code_preview(&lines, i, preview_lines),
                docstring: None,
            });
        }
        symbols
    }

    /// Import paths reduce to their final segment; quoted strings outside
    /// import blocks that happen to look like paths are tolerated noise.
    fn extract_imports(&self, content: &str) -> Vec<String> {
        let mut imports: Vec<String> = QUOTED_RE
            .captures_iter(content)
            .filter_map(|c| c[1].rsplit('/').next().map(|s| s.to_string()))
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"package server

import (
    "fmt"
    "net/http"
)

type Server struct {
    addr string
}

func (s *Server) Start() error {
    return nil
}

func newMux() {}
"#;

    #[test]
    fn test_go_symbols() {
        let symbols = GoExtractor.extract_symbols(SAMPLE, "server.go", 5);

        let server = symbols.iter().find(|s| s.name == "Server").unwrap();
        assert_eq!(server.kind, "struct");
        assert_eq!(server.visibility, Visibility::Public);

        // Receiver methods are captured by method name.
        let start = symbols.iter().find(|s| s.name == "Start").unwrap();
        assert_eq!(start.kind, "function");
        assert_eq!(start.visibility, Visibility::Public);

        let mux = symbols.iter().find(|s| s.name == "newMux").unwrap();
        assert_eq!(mux.visibility, Visibility::Private);
    }

    #[test]
    fn test_go_imports_last_segment() {
        assert_eq!(GoExtractor.extract_imports(SAMPLE), vec!["fmt", "http"]);
    }
}
