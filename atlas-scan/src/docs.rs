//! Per-component documentation extraction: doc files, architecture notes,
//! purpose, env vars, endpoints, patterns, and tech stack.

use crate::extract::extractor_for;
use crate::filters::{extension_of, language_for_extension};
use crate::util::{read_lossy, slash_basename, truncate_chars};
use atlas_model::{Component, ComponentDoc, ComponentType};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Doc files larger than this are cut off in the output.
const DOC_TRUNCATE_BYTES: usize = 8_000;

/// At most this many notes from a docs/ directory.
const MAX_ARCHITECTURE_NOTES: usize = 20;

/// At most this many files scanned per component for env vars and endpoints.
const DOC_SCAN_FILE_LIMIT: usize = 100;

/// At most this many files probed per component for tooling configs.
const TECH_SCAN_FILE_LIMIT: usize = 50;

static TOML_DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"description\s*=\s*"([^"]+)""#).unwrap());

const README_CANDIDATES: &[&str] = &["README.md", "README.rst", "README.txt", "README"];
const CLAUDE_CANDIDATES: &[&str] = &["CLAUDE.md"];
const CHANGELOG_CANDIDATES: &[&str] = &["CHANGELOG.md", "CHANGES.md", "HISTORY.md"];

/// Fill in `docs` for every component.
pub(crate) fn extract_component_docs(
    root: &Path,
    components: &mut BTreeMap<String, Component>,
) {
    for (rel_path, comp) in components.iter_mut() {
        let comp_dir = if rel_path.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel_path)
        };
        if !comp_dir.is_dir() {
            continue;
        }

        let mut doc = ComponentDoc::default();
        doc.readme = read_doc_file(&comp_dir, README_CANDIDATES);
        doc.claude_md = read_doc_file(&comp_dir, CLAUDE_CANDIDATES);
        doc.changelog = read_doc_file(&comp_dir, CHANGELOG_CANDIDATES);
        doc.architecture_notes = architecture_notes(&comp_dir);
        doc.purpose = component_purpose(root, comp);
        collect_from_files(root, comp, &mut doc);
        doc.patterns = detect_patterns(comp);
        doc.tech_stack = tech_stack(comp);

        comp.docs = doc;
    }
}

/// First existing candidate, truncated when large.
fn read_doc_file(comp_dir: &Path, candidates: &[&str]) -> Option<String> {
    for name in candidates {
        let path = comp_dir.join(name);
        if !path.exists() {
            continue;
        }
        return match read_lossy(&path) {
            Ok(content) if content.len() > DOC_TRUNCATE_BYTES => Some(format!(
                "{}\n\n... (truncated)",
                truncate_chars(&content, DOC_TRUNCATE_BYTES)
            )),
            Ok(content) => Some(content),
            Err(_) => None,
        };
    }
    None
}

/// Summarize the files in a `docs/` (or `doc/`) directory: first heading and
/// the first paragraph after it.
fn architecture_notes(comp_dir: &Path) -> Option<String> {
    let mut docs_dir = comp_dir.join("docs");
    if !docs_dir.is_dir() {
        docs_dir = comp_dir.join("doc");
    }
    if !docs_dir.is_dir() {
        return None;
    }

    let mut names: Vec<String> = std::fs::read_dir(&docs_dir)
        .ok()?
        .flatten()
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".md") || n.ends_with(".txt") || n.ends_with(".rst"))
        .collect();
    names.sort();

    let mut notes = Vec::new();
    for name in names {
        let Ok(content) = read_lossy(&docs_dir.join(&name)) else {
            continue;
        };
        let mut heading = String::new();
        let mut summary: Vec<&str> = Vec::new();
        for line in content.lines() {
            let stripped = line.trim();
            if stripped.starts_with('#') && heading.is_empty() {
                heading = stripped.trim_start_matches('#').trim().to_string();
            } else if !heading.is_empty() && !stripped.is_empty() {
                summary.push(stripped);
                if summary.len() >= 3 {
                    break;
                }
            } else if !heading.is_empty() && stripped.is_empty() && !summary.is_empty() {
                break;
            }
        }
        if !heading.is_empty() {
            notes.push(format!("**{heading}** ({name}): {}", summary.join(" ")));
        }
        if notes.len() >= MAX_ARCHITECTURE_NOTES {
            break;
        }
    }

    if notes.is_empty() {
        None
    } else {
        Some(notes.join("\n\n"))
    }
}

/// Pull a one-line purpose from the component's package metadata. Later
/// config files win when several carry a description.
fn component_purpose(root: &Path, comp: &Component) -> Option<String> {
    let mut purpose = None;
    for cfg in &comp.config_files {
        let full_path = root.join(&cfg.path);
        let Ok(content) = read_lossy(&full_path) else {
            continue;
        };
        match slash_basename(&cfg.path) {
            "package.json" => {
                if let Ok(data) = serde_json::from_str::<serde_json::Value>(&content) {
                    if let Some(desc) = data.get("description").and_then(|d| d.as_str()) {
                        if !desc.is_empty() {
                            purpose = Some(desc.to_string());
                        }
                    }
                }
            }
            "Cargo.toml" | "pyproject.toml" | "setup.cfg" => {
                if let Some(caps) = TOML_DESCRIPTION_RE.captures(&content) {
                    purpose = Some(caps[1].to_string());
                }
            }
            _ => {}
        }
    }
    purpose
}

/// Env vars and API endpoints from the component's own files, order
/// preserved, capped to keep large components cheap.
fn collect_from_files(root: &Path, comp: &Component, doc: &mut ComponentDoc) {
    for file_path in comp.files.iter().take(DOC_SCAN_FILE_LIMIT) {
        let Some(ext) = extension_of(file_path) else {
            continue;
        };
        let Some(language) = language_for_extension(&ext) else {
            continue;
        };
        let Some(extractor) = extractor_for(language) else {
            continue;
        };
        let Ok(content) = read_lossy(&root.join(file_path)) else {
            continue;
        };

        for var in extractor.extract_env_vars(&content) {
            if !doc.env_vars.contains(&var) {
                doc.env_vars.push(var);
            }
        }
        for ep in extractor.detect_api_endpoints(&content) {
            if !doc.api_endpoints.contains(&ep) {
                doc.api_endpoints.push(ep);
            }
        }
    }
}

/// Architectural patterns inferred from file naming conventions.
fn detect_patterns(comp: &Component) -> Vec<String> {
    let names: Vec<String> = comp
        .files
        .iter()
        .map(|f| slash_basename(f).to_lowercase())
        .collect();
    let any = |needle: &str| names.iter().any(|n| n.contains(needle));

    let mut patterns = Vec::new();

    let has_view = any("view");
    let has_model = any("model");
    if has_view && has_model && (any("viewmodel") || any("view_model")) {
        patterns.push("MVVM".to_string());
    } else if has_view && has_model && any("controller") {
        patterns.push("MVC".to_string());
    } else if has_view && has_model && any("presenter") {
        patterns.push("MVP".to_string());
    }

    if any("repository") || any("repo") {
        patterns.push("Repository Pattern".to_string());
    }
    if any("service") && comp.component_type != ComponentType::Service {
        patterns.push("Service Layer".to_string());
    }
    if any("observer") || any("subscriber") || any("publisher") {
        patterns.push("Observer/Pub-Sub".to_string());
    }
    if any("store") || any("reducer") || any("slice") {
        patterns.push("State Management".to_string());
    }
    if any("middleware") {
        patterns.push("Middleware".to_string());
    }
    if any("plugin") || any("extension") {
        patterns.push("Plugin Architecture".to_string());
    }
    if any("factory") {
        patterns.push("Factory Pattern".to_string());
    }
    if any("container") || any("injector") || any("provider") {
        patterns.push("Dependency Injection".to_string());
    }
    if any("api") || any("endpoint") || any("route") {
        patterns.push("API Layer".to_string());
    }

    let test_count = names
        .iter()
        .filter(|n| n.contains("test") || n.contains("spec"))
        .count();
    if test_count > 0 {
        let ratio = test_count as f64 / names.len().max(1) as f64;
        if ratio > 0.3 {
            patterns.push("Well-Tested".to_string());
        }
        patterns.push(format!("Tests ({test_count} files)"));
    }

    patterns
}

/// Framework, language, and tooling configs found among the component's
/// files, sorted and deduplicated.
fn tech_stack(comp: &Component) -> Vec<String> {
    let mut tech = Vec::new();
    if let Some(framework) = &comp.framework {
        tech.push(framework.clone());
    }
    if let Some(language) = &comp.language {
        tech.push(capitalize(language));
    }
    for file_path in comp.files.iter().take(TECH_SCAN_FILE_LIMIT) {
        let tool = match slash_basename(file_path).to_lowercase().as_str() {
            "tailwind.config.js" | "tailwind.config.ts" => "TailwindCSS",
            "tsconfig.json" => "TypeScript",
            ".eslintrc" | "eslint.config.js" => "ESLint",
            "jest.config.js" | "jest.config.ts" => "Jest",
            "vitest.config.ts" => "Vitest",
            "webpack.config.js" => "Webpack",
            "vite.config.ts" | "vite.config.js" => "Vite",
            _ => continue,
        };
        tech.push(tool.to_string());
    }
    tech.sort();
    tech.dedup();
    tech
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
