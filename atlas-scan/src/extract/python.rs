//! Python declaration extraction.

use super::{LanguageExtractor, code_preview, python_docstring, split_lines, BLOCK_SCAN_LIMIT};
use atlas_model::{ApiEndpoint, Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^class\s+(\w+)").unwrap());
static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?def\s+(\w+)").unwrap());
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+([\w.]+)\s+import|import\s+([\w.]+))").unwrap()
});
static DECORATOR_ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@\w+\.(get|post|put|delete|patch|route)\(\s*["']([^"']+)"#).unwrap()
});
static ROUTER_ADD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"router\.add_(get|post|put|delete)\(\s*["']([^"']+)"#).unwrap()
});
static WEB_ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"web\.(get|post|put|delete)\(\s*["']([^"']+)"#).unwrap()
});

/// Web/tooling frameworks recognized from import lines, checked in order.
const FRAMEWORKS: &[(&str, &str)] = &[
    ("flask", "Flask"),
    ("django", "Django"),
    ("fastapi", "FastAPI"),
    ("aiohttp", "aiohttp"),
    ("tornado", "Tornado"),
    ("starlette", "Starlette"),
    ("pytest", "pytest"),
    ("click", "Click"),
];

fn name_visibility(name: &str) -> Visibility {
    if name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

/// Last line of the indentation block opened at `start`, bounded.
fn indent_block_end(lines: &[String], start: usize) -> usize {
    if start >= lines.len() {
        return start;
    }
    let base_indent = lines[start].len() - lines[start].trim_start().len();
    let limit = (start + BLOCK_SCAN_LIMIT).min(lines.len());
    for i in start + 1..limit {
        let stripped = lines[i].trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let indent = lines[i].len() - lines[i].trim_start().len();
        if indent <= base_indent {
            return i - 1;
        }
    }
    (start + 10).min(lines.len().saturating_sub(1))
}

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn extract_symbols(
        &self,
        content: &str,
        file_path: &str,
        preview_lines: usize,
    ) -> Vec<Symbol> {
        let lines = split_lines(content);
        let mut symbols = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let (name, kind) = if let Some(caps) = CLASS_RE.captures(line) {
                (caps[1].to_string(), "class")
            } else if let Some(caps) = DEF_RE.captures(line) {
                (caps[1].to_string(), "function")
            } else {
                continue;
            };
            let end = indent_block_end(&lines, i);
            symbols.push(Symbol {
                id: Symbol::make_id(file_path, &name, i as u32 + 1),
                visibility: name_visibility(&name),
                name,
                kind: kind.to_string(),
                file: file_path.to_string(),
                line: i as u32 + 1,
                end_line: end as u32 + 1,
                code_preview: code_preview(&lines, i, preview_lines),
                docstring: python_docstring(&lines, i + 1),
            });
        }
        symbols
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        let mut imports: Vec<String> = IMPORT_RE
            .captures_iter(content)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| {
                m.as_str()
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .filter(|s| !s.is_empty())
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    fn detect_framework(&self, content: &str) -> Option<&'static str> {
        FRAMEWORKS.iter().find_map(|(module, name)| {
            let import = format!("import {module}");
            let from = format!("from {module}");
            if content.contains(&import) || content.contains(&from) {
                Some(*name)
            } else {
                None
            }
        })
    }

    /// Module docstring at the top of the file.
    fn extract_file_doc(&self, content: &str) -> Option<String> {
        let lines = split_lines(content);
        for (i, line) in lines.iter().enumerate() {
            let stripped = line.trim();
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }
            if stripped.starts_with("\"\"\"") || stripped.starts_with("'''") {
                return python_docstring(&lines, i);
            }
            break;
        }
        None
    }

    fn detect_api_endpoints(&self, content: &str) -> Vec<ApiEndpoint> {
        let mut endpoints = Vec::new();
        for re in [&*DECORATOR_ROUTE_RE, &*ROUTER_ADD_RE, &*WEB_ROUTE_RE] {
            for caps in re.captures_iter(content) {
                endpoints.push(ApiEndpoint {
                    method: caps[1].to_uppercase(),
                    path: caps[2].to_string(),
                });
            }
        }
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#""""Order service entry point."""

import os
from flask import Flask

app = Flask(__name__)


class OrderStore:
    """Keeps orders in memory."""

    def add(self, order):
        self._orders.append(order)


@app.route("/orders")
def list_orders():
    """Return all orders."""
    return []


def _helper():
    pass
"#;

    #[test]
    fn test_python_symbols() {
        let symbols = PythonExtractor.extract_symbols(SAMPLE, "app.py", 5);
        let store = symbols.iter().find(|s| s.name == "OrderStore").unwrap();
        assert_eq!(store.kind, "class");
        assert_eq!(store.visibility, Visibility::Public);
        assert_eq!(store.docstring.as_deref(), Some("Keeps orders in memory."));

        // Methods indented inside the class are not top-level defs.
        assert!(!symbols.iter().any(|s| s.name == "add"));

        let helper = symbols.iter().find(|s| s.name == "_helper").unwrap();
        assert_eq!(helper.visibility, Visibility::Private);
    }

    #[test]
    fn test_python_imports_deduped_sorted() {
        assert_eq!(PythonExtractor.extract_imports(SAMPLE), vec!["flask", "os"]);
    }

    #[test]
    fn test_python_framework_and_endpoints() {
        assert_eq!(PythonExtractor.detect_framework(SAMPLE), Some("Flask"));
        let endpoints = PythonExtractor.detect_api_endpoints(SAMPLE);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].method, "ROUTE");
        assert_eq!(endpoints[0].path, "/orders");
    }

    #[test]
    fn test_python_module_doc() {
        assert_eq!(
            PythonExtractor.extract_file_doc(SAMPLE).as_deref(),
            Some("Order service entry point.")
        );
    }

    #[test]
    fn test_indent_block_end() {
        // The trailing blank line is folded into the block.
        let lines = split_lines("def f():\n    a = 1\n    b = 2\n\nx = 3");
        assert_eq!(indent_block_end(&lines, 0), 3);
    }
}
