//! TypeScript/JavaScript declaration extraction. One extractor serves both
//! languages; JSX/TSX files additionally get React component detection.

use super::{BLOCK_SCAN_LIMIT, LanguageExtractor, code_preview, doc_before, split_lines};
use atlas_model::{ApiEndpoint, Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(export\s+)?(?:default\s+)?(?:abstract\s+)?(class|interface)\s+(\w+)")
        .unwrap()
});
static TYPE_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(export\s+)?type\s+(\w+)").unwrap());
static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(export\s+)?(?:default\s+)?(?:async\s+)?(?:function|const)\s+(\w+)").unwrap()
});
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w{},\s*]+\s+from\s+)?['"]([@\w/.\-]+)['"]"#).unwrap()
});
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([@\w/.\-]+)['"]\s*\)"#).unwrap());
static EXPRESS_ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\w+\.(get|post|put|delete|patch)\(\s*["']([^"']+)"#).unwrap()
});
static NEXT_HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(?:async\s+)?function\s+(GET|POST|PUT|DELETE|PATCH)\b").unwrap()
});

/// Frameworks recognized from quoted module specifiers, checked in order.
const FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("express", "Express"),
    ("@angular", "Angular"),
];

fn export_visibility(exported: bool) -> Visibility {
    if exported {
        Visibility::Public
    } else {
        Visibility::Internal
    }
}

/// Brace matching with a naive single-line string skip, so braces inside
/// template literals and quoted strings don't skew the depth.
fn find_closing_brace_js(lines: &[String], start: usize) -> usize {
    let mut depth = 0i32;
    let limit = (start + BLOCK_SCAN_LIMIT).min(lines.len());
    for (i, line) in lines.iter().enumerate().take(limit).skip(start) {
        let mut in_string = false;
        let mut prev = '\0';
        for ch in line.chars() {
            if matches!(ch, '"' | '\'' | '`') && prev != '\\' {
                in_string = !in_string;
            }
            if !in_string {
                match ch {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return i;
                        }
                    }
                    _ => {}
                }
            }
            prev = ch;
        }
    }
    (start + 10).min(lines.len().saturating_sub(1))
}

pub struct TypeScriptExtractor;

impl LanguageExtractor for TypeScriptExtractor {
    fn extract_symbols(
        &self,
        content: &str,
        file_path: &str,
        preview_lines: usize,
    ) -> Vec<Symbol> {
        let lines = split_lines(content);
        let mut symbols = Vec::new();
        let head = content.get(..500).unwrap_or(content);
        let react_file =
            head.contains("React") || file_path.contains("jsx") || file_path.contains("tsx");

        for (i, line) in lines.iter().enumerate() {
            if let Some(caps) = CLASS_RE.captures(line) {
                let vis = export_visibility(caps.get(1).is_some());
                let kind = caps[2].to_string();
                let name = caps[3].to_string();
                let end = find_closing_brace_js(&lines, i);
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

            if let Some(caps) = TYPE_ALIAS_RE.captures(line) {
                let vis = export_visibility(caps.get(1).is_some());
                let name = caps[2].to_string();
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &name, i as u32 + 1),
                    name,
                    kind: "type".to_string(),
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: i as u32 + 1,
                    code_preview: code_preview(&lines, i, 3),
                    visibility: vis,
                    docstring: doc_before(&lines, i),
                });
                continue;
            }

            if let Some(caps) = FUNC_RE.captures(line) {
                let vis = export_visibility(caps.get(1).is_some());
                let name = caps[2].to_string();
                let upper_start = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
                let kind = if upper_start && react_file {
                    "component"
                } else {
                    "function"
                };
                let end = find_closing_brace_js(&lines, i);
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &name, i as u32 + 1),
                    name,
                    kind: kind.to_string(),
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility: vis,
                    docstring: doc_before(&lines, i),
                });
            }
        }
        symbols
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        let mut imports: Vec<String> = Vec::new();
        for caps in IMPORT_RE.captures_iter(content) {
            let module = &caps[1];
            if module.starts_with('.') {
                // Relative imports keep their path for later resolution.
                imports.push(module.to_string());
            } else {
                let mut parts = module.split('/');
                let first = parts.next().unwrap_or(module);
                if first.starts_with('@') {
                    // Scoped packages keep @scope/package.
                    match parts.next() {
                        Some(second) => imports.push(format!("{first}/{second}")),
                        None => imports.push(first.to_string()),
                    }
                } else {
                    imports.push(first.to_string());
                }
            }
        }
        for caps in REQUIRE_RE.captures_iter(content) {
            if let Some(first) = caps[1].split('/').next() {
                imports.push(first.to_string());
            }
        }
        imports.sort();
        imports.dedup();
        imports
    }

    fn detect_framework(&self, content: &str) -> Option<&'static str> {
        FRAMEWORKS.iter().find_map(|(module, name)| {
            let single = format!("'{module}");
            let double = format!("\"{module}");
            if content.contains(&single) || content.contains(&double) {
                Some(*name)
            } else {
                None
            }
        })
    }

    /// Top-of-file JSDoc block or `//` comment run.
    fn extract_file_doc(&self, content: &str) -> Option<String> {
        let mut doc_lines: Vec<String> = Vec::new();
        let mut in_block = false;
        for line in content.split('\n') {
            let stripped = line.trim();
            if stripped.starts_with("/**") && !in_block {
                in_block = true;
                let text = stripped
                    .trim_start_matches("/**")
                    .trim_end_matches("*/")
                    .trim();
                if !text.is_empty() {
                    doc_lines.push(text.to_string());
                }
                if stripped.ends_with("*/") {
                    in_block = false;
                }
                continue;
            }
            if in_block {
                let text = stripped
                    .trim_end_matches("*/")
                    .trim()
                    .trim_start_matches('*')
                    .trim();
                if !text.is_empty() {
                    doc_lines.push(text.to_string());
                }
                if stripped.ends_with("*/") {
                    break;
                }
                continue;
            }
            if stripped.starts_with("//") && !stripped.starts_with("///") {
                let text = stripped[2..].trim();
                if !text.is_empty() && !text.starts_with("@ts-") && !text.starts_with("eslint") {
                    doc_lines.push(text.to_string());
                }
                continue;
            }
            if stripped.is_empty() || stripped.starts_with("'use ") || stripped.starts_with("\"use ")
            {
                if !doc_lines.is_empty() {
                    break;
                }
                continue;
            }
            break;
        }
        if doc_lines.is_empty() {
            None
        } else {
            Some(doc_lines.join("\n"))
        }
    }

    fn detect_api_endpoints(&self, content: &str) -> Vec<ApiEndpoint> {
        let mut endpoints: Vec<ApiEndpoint> = EXPRESS_ROUTE_RE
            .captures_iter(content)
            .map(|caps| ApiEndpoint {
                method: caps[1].to_uppercase(),
                path: caps[2].to_string(),
            })
            .collect();
        // Next.js app-router handlers are file-based routes.
        for caps in NEXT_HANDLER_RE.captures_iter(content) {
            endpoints.push(ApiEndpoint {
                method: caps[1].to_string(),
                path: "(file-based)".to_string(),
            });
        }
        endpoints
    }
}
