//! Ruby declaration extraction.

use super::{BLOCK_SCAN_LIMIT, LanguageExtractor, code_preview, doc_before, split_lines};
use atlas_model::{ApiEndpoint, Symbol, Visibility};
use regex::Regex;
use std::sync::LazyLock;

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(class|module)\s+([A-Z]\w*(?:::[A-Z]\w*)*)").unwrap());
static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*def\s+(self\.)?(\w+[?!=]?)").unwrap());
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\s+['"]([^'"]+)['"]"#).unwrap());
static REQUIRE_RELATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require_relative\s+['"]([^'"]+)['"]"#).unwrap());
static BLOCK_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:class|module|def|do|if|unless|case|while|until|for|begin)\b").unwrap()
});
static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(get|post|put|patch|delete)\s+["']([^"']+)"#).unwrap()
});

/// Line index of the `end` that closes the block opened at `start`, counting
/// block keywords and trailing `do`s.
fn find_ruby_end(lines: &[String], start: usize) -> usize {
    let mut depth = 0i32;
    let limit = (start + BLOCK_SCAN_LIMIT).min(lines.len());
    for (i, line) in lines.iter().enumerate().take(limit).skip(start) {
        let stripped = line.trim();
        if BLOCK_KEYWORD_RE.is_match(line) || stripped.ends_with(" do") {
            depth += 1;
        }
        if stripped == "end" || stripped.starts_with("end ") || stripped.starts_with("end;") {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    (start + 10).min(lines.len().saturating_sub(1))
}

pub struct RubyExtractor;

impl LanguageExtractor for RubyExtractor {
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
                let kind = caps[1].to_string();
                let name = caps[2].to_string();
                let end = find_ruby_end(&lines, i);
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &name, i as u32 + 1),
                    name,
                    kind,
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility: Visibility::Public,
                    docstring: doc_before(&lines, i),
                });
                continue;
            }

            if let Some(caps) = DEF_RE.captures(line) {
                let name = if caps.get(1).is_some() {
                    format!("self.{}", &caps[2])
                } else {
                    caps[2].to_string()
                };
                let end = find_ruby_end(&lines, i);
                let visibility = if name.starts_with('_') {
                    Visibility::Private
                } else {
                    Visibility::Public
                };
                symbols.push(Symbol {
                    id: Symbol::make_id(file_path, &name, i as u32 + 1),
                    name,
                    kind: "function".to_string(),
                    file: file_path.to_string(),
                    line: i as u32 + 1,
                    end_line: end as u32 + 1,
                    code_preview: code_preview(&lines, i, preview_lines),
                    visibility,
                    docstring: doc_before(&lines, i),
                });
            }
        }
        symbols
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        let mut imports: Vec<String> = REQUIRE_RE
            .captures_iter(content)
            .chain(REQUIRE_RELATIVE_RE.captures_iter(content))
            .filter_map(|c| c[1].split('/').next().map(|s| s.to_string()))
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    fn detect_framework(&self, content: &str) -> Option<&'static str> {
        if content.contains("Rails")
            || content.contains("ActiveRecord")
            || content.contains("ActionController")
        {
            Some("Rails")
        } else if content.contains("Sinatra") {
            Some("Sinatra")
        } else if content.contains("Grape::API") {
            Some("Grape")
        } else if content.contains("Hanami") {
            Some("Hanami")
        } else {
            None
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"require 'sinatra/base'
require_relative 'lib/store'

# Serves the order API.
class OrderApi < Sinatra::Base
  get '/orders' do
    store.all.to_json
  end

  def self.boot
    run!
  end
end

module Billing
  def charge!
  end
end
"#;

    #[test]
    fn test_ruby_symbols() {
        let symbols = RubyExtractor.extract_symbols(SAMPLE, "app.rb", 5);

        let api = symbols.iter().find(|s| s.name == "OrderApi").unwrap();
        assert_eq!(api.kind, "class");
        assert_eq!(api.docstring.as_deref(), Some("Serves the order API."));

        let boot = symbols.iter().find(|s| s.name == "self.boot").unwrap();
        assert_eq!(boot.kind, "function");

        let charge = symbols.iter().find(|s| s.name == "charge!").unwrap();
        assert_eq!(charge.visibility, Visibility::Public);

        let billing = symbols.iter().find(|s| s.name == "Billing").unwrap();
        assert_eq!(billing.kind, "module");
    }

    #[test]
    fn test_ruby_block_end() {
        let lines = split_lines("class A\n  def b\n    1\n  end\nend\n");
        assert_eq!(find_ruby_end(&lines, 0), 4);
        assert_eq!(find_ruby_end(&lines, 1), 3);
    }

    #[test]
    fn test_ruby_imports() {
        assert_eq!(RubyExtractor.extract_imports(SAMPLE), vec!["lib", "sinatra"]);
    }

    #[test]
    fn test_ruby_framework_and_endpoints() {
        assert_eq!(RubyExtractor.detect_framework(SAMPLE), Some("Sinatra"));
        let endpoints = RubyExtractor.detect_api_endpoints(SAMPLE);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].method, "GET");
        assert_eq!(endpoints[0].path, "/orders");
    }
}
