//! Language-specific symbol and import extraction.
//!
//! One [`LanguageExtractor`] per supported language, all regex-driven. The
//! extractors are heuristic by design: they read declarations line by line
//! and bound every block-end search, so a pathological file can never stall
//! a scan. Languages without an extractor still get counted (lines, size)
//! but contribute no symbols.

mod go;
mod python;
mod ruby;
mod rust;
mod swift;
mod typescript;

use atlas_model::{ApiEndpoint, Symbol};
use regex::Regex;
use std::sync::LazyLock;

/// Block-end searches give up after this many lines.
const BLOCK_SCAN_LIMIT: usize = 500;

/// Ports outside this range are noise (version numbers, years).
const PORT_MIN: u32 = 80;
const PORT_MAX: u32 = 65535;

static ENV_GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:environ|getenv|env)\[?\(?\s*["'](\w+)["']"#).unwrap()
});
static ENV_PROCESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"process\.env\.(\w+)").unwrap());
static ENV_RUST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"env::var\(\s*"(\w+)""#).unwrap());

static PORT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:port|PORT)\s*[=:]\s*(\d{2,5})",
        r"localhost:(\d{2,5})",
        r"127\.0\.0\.1:(\d{2,5})",
        r"0\.0\.0\.0:(\d{2,5})",
        r"listen\w*\(.*?(\d{4,5})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Per-language extraction heuristics.
///
/// Default methods cover the concerns most languages share (env vars, port
/// references); implementors override what their ecosystem does differently.
pub trait LanguageExtractor: Sync {
    /// Scan declarations out of `content`. `preview_lines` bounds the
    /// `code_preview` stored on each symbol.
    fn extract_symbols(&self, content: &str, file_path: &str, preview_lines: usize)
    -> Vec<Symbol>;

    /// Raw import tokens in language-native form.
    fn extract_imports(&self, content: &str) -> Vec<String>;

    /// Framework hint from import/require lines, if any.
    fn detect_framework(&self, _content: &str) -> Option<&'static str> {
        None
    }

    /// File-level documentation (module docstring, header comment).
    fn extract_file_doc(&self, _content: &str) -> Option<String> {
        None
    }

    /// Environment variable names referenced by the file, sorted.
    fn extract_env_vars(&self, content: &str) -> Vec<String> {
        let mut vars: Vec<String> = ENV_GENERIC_RE
            .captures_iter(content)
            .chain(ENV_PROCESS_RE.captures_iter(content))
            .chain(ENV_RUST_RE.captures_iter(content))
            .map(|c| c[1].to_string())
            .collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Port numbers referenced by the file, sorted.
    ///
    /// These loose patterns feed component port detection only; the
    /// relationship phase re-matches with stricter patterns before it
    /// draws any edge.
    fn detect_ports(&self, content: &str) -> Vec<u16> {
        let mut ports: Vec<u16> = PORT_RES
            .iter()
            .flat_map(|re| re.captures_iter(content))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .filter(|p| (PORT_MIN..=PORT_MAX).contains(p))
            .map(|p| p as u16)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// API route definitions, if the language has a recognizable style.
    fn detect_api_endpoints(&self, _content: &str) -> Vec<ApiEndpoint> {
        Vec::new()
    }
}

static SWIFT: swift::SwiftExtractor = swift::SwiftExtractor;
static PYTHON: python::PythonExtractor = python::PythonExtractor;
static RUST: rust::RustExtractor = rust::RustExtractor;
static TYPESCRIPT: typescript::TypeScriptExtractor = typescript::TypeScriptExtractor;
static GO: go::GoExtractor = go::GoExtractor;
static RUBY: ruby::RubyExtractor = ruby::RubyExtractor;

/// Look up the extractor for a language tag. JavaScript shares the
/// TypeScript extractor.
pub fn extractor_for(language: &str) -> Option<&'static dyn LanguageExtractor> {
    match language {
        "swift" => Some(&SWIFT),
        "python" => Some(&PYTHON),
        "rust" => Some(&RUST),
        "typescript" | "javascript" => Some(&TYPESCRIPT),
        "go" => Some(&GO),
        "ruby" => Some(&RUBY),
        _ => None,
    }
}

/// First `max_lines` lines of a declaration starting at `start` (0-based),
/// with a trailing ellipsis marker when truncated mid-block.
pub(crate) fn code_preview(lines: &[String], start: usize, max_lines: usize) -> String {
    let end = (start + max_lines).min(lines.len());
    let mut preview = lines[start..end].join("\n");
    if end < lines.len() && !preview.trim_end().ends_with('}') {
        preview.push_str("\n    ...");
    }
    preview
}

/// Line index of the brace that closes the block opened at `start`, counting
/// `{`/`}` per character. Falls back to `start + 10` when unbalanced within
/// the scan limit.
pub(crate) fn find_closing_brace(lines: &[String], start: usize) -> usize {
    let mut depth = 0i32;
    let limit = (start + BLOCK_SCAN_LIMIT).min(lines.len());
    for (i, line) in lines.iter().enumerate().take(limit).skip(start) {
        for ch in line.chars() {
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
    }
    (start + 10).min(lines.len().saturating_sub(1))
}

/// Documentation comment immediately above `line_idx`: a `/** */` block,
/// a run of `///` lines, or a run of `#` comment lines.
pub(crate) fn doc_before(lines: &[String], line_idx: usize) -> Option<String> {
    if line_idx == 0 {
        return None;
    }
    let mut i = line_idx as isize - 1;

    // `/** ... */` block ending on the previous line.
    if lines[i as usize].trim().ends_with("*/") {
        let end = i as usize;
        while i >= 0 && !lines[i as usize].contains("/*") {
            i -= 1;
        }
        if i >= 0 {
            let cleaned: Vec<String> = lines[i as usize..=end]
                .iter()
                .map(|l| {
                    let l = l.trim();
                    let l = l.strip_prefix("/**").or_else(|| l.strip_prefix("/*")).unwrap_or(l);
                    let l = l.strip_suffix("*/").unwrap_or(l);
                    let l = l.trim();
                    let l = l.strip_prefix("* ").or_else(|| l.strip_prefix('*')).unwrap_or(l);
                    l.trim().to_string()
                })
                .filter(|l| !l.is_empty())
                .collect();
            if !cleaned.is_empty() {
                return Some(cleaned.join("\n"));
            }
        }
        return None;
    }

    // A run of `///` lines.
    let mut doc_lines: Vec<String> = Vec::new();
    while i >= 0 && lines[i as usize].trim().starts_with("///") {
        doc_lines.insert(
            0,
            lines[i as usize].trim().trim_start_matches('/').trim().to_string(),
        );
        i -= 1;
    }
    if !doc_lines.is_empty() {
        return Some(doc_lines.join("\n"));
    }

    // A run of `#` comments (but not shebangs).
    while i >= 0 {
        let t = lines[i as usize].trim();
        if t.starts_with('#') && !t.starts_with("#!") {
            doc_lines.insert(0, t.trim_start_matches('#').trim().to_string());
            i -= 1;
        } else {
            break;
        }
    }
    if !doc_lines.is_empty() {
        return Some(doc_lines.join("\n"));
    }
    None
}

/// Triple-quoted docstring on the first non-empty line at or after `from`.
/// Callers pass the line after a `def`/`class`, or line 0 for module docs.
pub(crate) fn python_docstring(lines: &[String], from: usize) -> Option<String> {
    let upper = (from + 4).min(lines.len());
    for i in from..upper {
        let stripped = lines[i].trim();
        if stripped.is_empty() {
            continue;
        }
        let quote = if stripped.starts_with("\"\"\"") {
            "\"\"\""
        } else if stripped.starts_with("'''") {
            "'''"
        } else {
            return None;
        };
        // Single-line docstring.
        if stripped.len() > 6 && stripped.ends_with(quote) && stripped.matches(quote).count() >= 2 {
            return Some(stripped[3..stripped.len() - 3].trim().to_string());
        }
        // Multi-line: collect until the closing quote, bounded.
        let mut doc_lines = vec![stripped[3..].to_string()];
        let inner_upper = (i + 30).min(lines.len());
        for line in lines.iter().take(inner_upper).skip(i + 1) {
            if line.contains(quote) {
                doc_lines.push(line.trim().replace(quote, ""));
                break;
            }
            doc_lines.push(line.trim().to_string());
        }
        let joined: Vec<String> = doc_lines
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        return Some(joined.join("\n"));
    }
    None
}

pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(|l| l.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Plain;
    impl LanguageExtractor for Plain {
        fn extract_symbols(&self, _: &str, _: &str, _: usize) -> Vec<Symbol> {
            Vec::new()
        }
        fn extract_imports(&self, _: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_default_env_vars() {
        let content = r#"
            let key = std::env::var("API_KEY")?;
            const url = process.env.DATABASE_URL;
            token = os.environ["GITHUB_TOKEN"]
        "#;
        assert_eq!(
            Plain.extract_env_vars(content),
            vec!["API_KEY", "DATABASE_URL", "GITHUB_TOKEN"]
        );
    }

    #[test]
    fn test_default_ports_in_range() {
        let content = "app.listen(8080); // also PORT=3000 and localhost:99999 and port: 42";
        let ports = Plain.detect_ports(content);
        assert!(ports.contains(&8080));
        assert!(ports.contains(&3000));
        // 99999 is out of range, 42 is below the floor.
        assert!(!ports.contains(&42));
        assert_eq!(ports.iter().filter(|p| **p > 9000).count(), 0);
    }

    #[test]
    fn test_code_preview_truncation() {
        let lines = split_lines("fn demo() {\n    let a = 1;\n    let b = 2;\n    a + b\n}");
        assert_eq!(code_preview(&lines, 0, 2), "fn demo() {\n    let a = 1;\n    ...");
        assert_eq!(code_preview(&lines, 0, 10), "fn demo() {\n    let a = 1;\n    let b = 2;\n    a + b\n}");
    }

    #[test]
    fn test_find_closing_brace() {
        let lines = split_lines("struct A {\n    x: u8,\n}\nstruct B;");
        assert_eq!(find_closing_brace(&lines, 0), 2);
    }

    #[test]
    fn test_doc_before_triple_slash() {
        let lines = split_lines("/// Adds numbers.\n/// Carefully.\nfn add() {}");
        assert_eq!(doc_before(&lines, 2), Some("Adds numbers.\nCarefully.".to_string()));
    }

    #[test]
    fn test_doc_before_block_comment() {
        let lines = split_lines("/**\n * A widget.\n */\nclass Widget {}");
        assert_eq!(doc_before(&lines, 3), Some("A widget.".to_string()));
    }

    #[test]
    fn test_python_docstring_single_line() {
        let lines = split_lines("def f():\n    \"\"\"Does things.\"\"\"\n    pass");
        assert_eq!(python_docstring(&lines, 1), Some("Does things.".to_string()));
    }

    #[test]
    fn test_python_docstring_multi_line() {
        let lines = split_lines("class C:\n    \"\"\"First.\n\n    Second.\n    \"\"\"\n    pass");
        assert_eq!(python_docstring(&lines, 1), Some("First.\nSecond.".to_string()));
    }

    #[test]
    fn test_python_docstring_module_level() {
        let lines = split_lines("\"\"\"Top of file.\"\"\"\nimport os");
        assert_eq!(python_docstring(&lines, 0), Some("Top of file.".to_string()));
    }

    #[test]
    fn test_extractor_registry() {
        assert!(extractor_for("swift").is_some());
        assert!(extractor_for("javascript").is_some());
        assert!(extractor_for("cobol").is_none());
    }
}
