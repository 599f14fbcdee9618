//! Rust declaration extraction.

use super::{LanguageExtractor, code_preview, doc_before, find_closing_brace, split_lines};
use atlas_model::{ApiEndpoint, Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(pub(?:\(\w+\))?\s+)?(struct|enum|trait|union)\s+(\w+)").unwrap()
});
static IMPL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*impl(?:<[^>]+>)?\s+(\w+)").unwrap());
static FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(pub(?:\(\w+\))?\s+)?(?:async\s+)?fn\s+(\w+)").unwrap()
});
static USE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*use\s+([\w:]+)").unwrap());
static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.(get|post|put|delete|patch)\(\s*["']([^"']+)"#).unwrap()
});

fn pub_visibility(keyword: Option<&str>) -> Visibility {
    match keyword {
        Some(k) if k.contains("pub") => Visibility::Public,
        _ => Visibility::Private,
    }
}

pub struct RustExtractor;

impl LanguageExtractor for RustExtractor {
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
                let vis = pub_visibility(caps.get(1).map(|m| m.as_str()));
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

            if let Some(caps) = IMPL_RE.captures(line) {
                let base = &caps[1];
                let end = find_closing_brace(&lines, i);
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &format!("impl_{base}"), i as u32 + 1),
                    name: format!("impl {base}"),
                    kind: "impl".to_string(),
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility: Visibility::Internal,
                    docstring: doc_before(&lines, i),
                });
                continue;
            }

            if let Some(caps) = FN_RE.captures(line) {
                // Free functions and inherent methods only (indent <= 4).
                if caps[1].len() <= 4 {
                    let vis = pub_visibility(caps.get(2).map(|m| m.as_str()));
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
            }
        }
        symbols
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        let mut imports: Vec<String> = USE_RE
            .captures_iter(content)
            .filter_map(|c| c[1].split("::").next().map(|s| s.to_string()))
            .filter(|root| !matches!(root.as_str(), "self" | "super" | "crate"))
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    fn detect_framework(&self, content: &str) -> Option<&'static str> {
        if content.contains("use axum") {
            Some("Axum")
        } else if content.contains("use actix") {
            Some("Actix")
        } else if content.contains("use rocket") {
            Some("Rocket")
        } else if content.contains("use tokio") {
            Some("Tokio")
        } else if content.contains("use warp") {
            Some("Warp")
        } else {
            None
        }
    }

    /// Leading `//!` inner documentation.
    fn extract_file_doc(&self, content: &str) -> Option<String> {
        let mut doc_lines: Vec<String> = Vec::new();
        for line in content.split('\n') {
            let stripped = line.trim();
            if let Some(rest) = stripped.strip_prefix("//!") {
                doc_lines.push(rest.trim().to_string());
            } else if stripped.starts_with("//") || stripped.is_empty() {
                continue;
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

    fn detect_api_endpoints(&self, content: &str) -> Vec<ApiEndpoint> {
        ROUTE_RE
            .captures_iter(content)
            .map(|caps| ApiEndpoint {
                method: caps[1].to_uppercase(),
                path: caps[2].to_string(),
            })
            .collect()
    }
}
