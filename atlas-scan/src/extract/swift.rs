//! Swift declaration extraction.

use super::{LanguageExtractor, code_preview, doc_before, find_closing_brace, split_lines};
use atlas_model::{Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(public|open|internal|private|fileprivate)?\s*(?:final\s+)?(class|struct|enum|protocol|actor)\s+(\w+)",
    )
    .unwrap()
});
static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\s*)(public|open|internal|private|fileprivate)?\s*(?:static\s+|class\s+|@\w+\s+)*func\s+(\w+)",
    )
    .unwrap()
});
static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*extension\s+(\w+)").unwrap());
static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+(\w+(?:\.\w+)*)").unwrap());
static FILE_HEADER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\.swift$").unwrap());

fn visibility(keyword: Option<&str>) -> Visibility {
    match keyword {
        Some("public") | Some("open") => Visibility::Public,
        Some("private") => Visibility::Private,
        Some("fileprivate") => Visibility::Fileprivate,
        _ => Visibility::Internal,
    }
}

pub struct SwiftExtractor;

impl LanguageExtractor for SwiftExtractor {
    fn extract_symbols(
        &self,
        content: &str,
        file_path: &str,
        preview_lines: usize,
    ) -> Vec<Symbol> {
        let lines = split_lines(content);
        let mut symbols = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if let Some(caps) = TYPE_RE.captures(line) {
                let vis = visibility(caps.get(1).map(|m| m.as_str()));
                let kind = caps[2].to_string();
                let name = caps[3].to_string();
                let end = find_closing_brace(&lines, i);
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &name, i as u32 + 1),
                    name,
                    kind,
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility: vis,
                    docstring: doc_before(&lines, i),
                });
                continue;
            }

            if let Some(caps) = FUNC_RE.captures(line) {
                // Top-level or one nesting only; deeper funcs are noise.
                if caps[1].len() <= 4 {
                    let vis = visibility(caps.get(2).map(|m| m.as_str()));
                    let name = caps[3].to_string();
                    let end = find_closing_brace(&lines, i);
                    symbols.push(Symbol {
                        id: Symbol::make_id(file_path, &name, i as u32 + 1),
                        name,
                        kind: "function".to_string(),
                        file: file_path.to_string(),
                        line: i as u32 + 1,
                        end_line: end as u32 + 1,
                        code_preview: code_preview(&lines, i, preview_lines),
                        visibility: vis,
                        docstring: doc_before(&lines, i),
                    });
                }
                continue;
            }

            if let Some(caps) = EXTENSION_RE.captures(line) {
                let base = &caps[1];
                let end = find_closing_brace(&lines, i);
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &format!("ext_{base}"), i as u32 + 1),
                    name: format!("extension {base}"),
                    kind: "extension".to_string(),
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility: Visibility::Internal,
                    docstring: doc_before(&lines, i),
                });
            }
        }
        symbols
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        IMPORT_RE
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect()
    }

    fn detect_framework(&self, content: &str) -> Option<&'static str> {
        if content.contains("import SwiftUI") {
            Some("SwiftUI")
        } else if content.contains("import UIKit") {
            Some("UIKit")
        } else if content.contains("import AppKit") {
            Some("AppKit")
        } else if content.contains("import Vapor") {
            Some("Vapor")
        } else {
            None
        }
    }

    /// Header `//` comment block, skipping bare file-name lines.
    fn extract_file_doc(&self, content: &str) -> Option<String> {
        let mut doc_lines: Vec<String> = Vec::new();
        for line in content.split('\n') {
            let stripped = line.trim();
            if let Some(rest) = stripped.strip_prefix("//") {
                let text = rest.trim_start_matches('/').trim();
                if !text.is_empty() && !FILE_HEADER_NAME_RE.is_match(text) {
                    doc_lines.push(text.to_string());
                }
            } else if stripped.starts_with("import") || stripped.is_empty() {
                if !doc_lines.is_empty() {
                    break;
                }
            } else {
                break;
            }
        }
        if doc_lines.is_empty() {
            None
        } else {
            Some(doc_lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"//
//  ContentView.swift
//  Root view for the app.
//

import SwiftUI

/// The main view.
public struct ContentView: View {
    var body: some View {
        Text("hello")
    }
}

func helper() {
    print("x")
}

extension ContentView {
    func styled() -> some View { body }
}
"#;

    #[test]
    fn test_swift_symbols() {
        let symbols = SwiftExtractor.extract_symbols(SAMPLE, "ContentView.swift", 5);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"ContentView"));
        assert!(names.contains(&"helper"));
        assert!(names.contains(&"extension ContentView"));

        let view = symbols.iter().find(|s| s.name == "ContentView").unwrap();
        assert_eq!(view.kind, "struct");
        assert_eq!(view.visibility, Visibility::Public);
        assert_eq!(view.docstring.as_deref(), Some("The main view."));
        assert_eq!(view.line, 9);
        assert_eq!(view.end_line, 13);
    }

    #[test]
    fn test_nested_funcs_skipped() {
        // The `styled` func inside the extension is indented 4, so it is
        // still captured; deeper nesting is not.
        let deep = "struct A {\n    struct B {\n        func inner() {}\n    }\n}\n";
        let symbols = SwiftExtractor.extract_symbols(deep, "a.swift", 5);
        assert!(!symbols.iter().any(|s| s.name == "inner"));
    }

    #[test]
    fn test_swift_imports_and_framework() {
        assert_eq!(SwiftExtractor.extract_imports(SAMPLE), vec!["SwiftUI"]);
        assert_eq!(SwiftExtractor.detect_framework(SAMPLE), Some("SwiftUI"));
    }

    #[test]
    fn test_swift_file_doc_skips_filename() {
        let doc = SwiftExtractor.extract_file_doc(SAMPLE).unwrap();
        assert_eq!(doc, "Root view for the app.");
    }
}
