//! The single-repository scan pipeline.
//!
//! A [`Scanner`] walks one repository root and runs the fixed phase order:
//! component discovery, file scanning, role promotion, name improvement,
//! relationship detection, metrics, project info, doc extraction, and final
//! assembly into an [`Architecture`] document. The scanner owns all
//! intermediate state; the produced document is never mutated afterward.

use crate::classify;
use crate::docs;
use crate::extract::extractor_for;
use crate::filters::{
    extension_of, is_code_language, is_skipped_dir, is_skipped_extension, language_for_extension,
};
use crate::manifest;
use crate::relationships;
use crate::util::{read_lossy, slash_parent, to_slash, truncate_chars};
use atlas_model::{
    Architecture, Component, ComponentType, ConfigFile, FileInfo, ScanStats, Symbol, Visibility,
};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Marker files that open a component boundary, checked in order; the first
/// match in a directory wins.
const COMPONENT_MARKERS: &[(&str, Option<&str>, ComponentType)] = &[
    ("Package.swift", Some("swift"), ComponentType::Package),
    ("Cargo.toml", Some("rust"), ComponentType::Package),
    ("package.json", Some("typescript"), ComponentType::Package),
    ("pyproject.toml", Some("python"), ComponentType::Package),
    ("setup.py", Some("python"), ComponentType::Package),
    ("setup.cfg", Some("python"), ComponentType::Package),
    ("go.mod", Some("go"), ComponentType::Module),
    ("Gemfile", Some("ruby"), ComponentType::Package),
    ("build.gradle", Some("java"), ComponentType::Package),
    ("build.gradle.kts", Some("kotlin"), ComponentType::Package),
    ("pom.xml", Some("java"), ComponentType::Package),
    ("pubspec.yaml", Some("dart"), ComponentType::Package),
    ("Makefile", None, ComponentType::Module),
    ("Dockerfile", None, ComponentType::Service),
    ("docker-compose.yml", None, ComponentType::Infrastructure),
    ("docker-compose.yaml", None, ComponentType::Infrastructure),
    // AWS SAM
    ("template.yaml", None, ComponentType::Infrastructure),
    ("template.yml", None, ComponentType::Infrastructure),
    // Serverless Framework
    ("serverless.yml", None, ComponentType::Infrastructure),
    ("serverless.yaml", None, ComponentType::Infrastructure),
    ("Info.plist", Some("swift"), ComponentType::Application),
];

/// Module components are only synthesized this deep.
const MODULE_SYNTHESIS_MAX_DEPTH: usize = 4;

/// Minimum recognized files for module synthesis.
const MODULE_SYNTHESIS_MIN_FILES: usize = 2;

/// Description lines taken from a README are clamped to this length.
const DESCRIPTION_MAX_CHARS: usize = 200;

static GIT_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"url\s*=\s*(.+)").unwrap());

/// Tunables for one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Files larger than this many bytes are not read.
    pub max_file_size: u64,
    /// Cap on emitted symbols; 0 means unlimited.
    pub max_symbols: usize,
    /// Max lines kept in each symbol's code preview.
    pub preview_lines: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_file_size: 500_000,
            max_symbols: 5000,
            preview_lines: 5,
        }
    }
}

/// Errors that abort a scan before it starts. Per-file problems during the
/// scan are logged and skipped, never fatal.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One-shot scanner for a single repository root.
pub struct Scanner {
    root: PathBuf,
    options: ScanOptions,
    components: BTreeMap<String, Component>,
    files: Vec<FileInfo>,
    symbols: Vec<Symbol>,
    language_lines: BTreeMap<String, u64>,
    total_lines: u64,
    total_size: u64,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Result<Self, ScanError> {
        let root = root.into();
        let root = root.canonicalize().map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root));
        }
        Ok(Self {
            root,
            options,
            components: BTreeMap::new(),
            files: Vec::new(),
            symbols: Vec::new(),
            language_lines: BTreeMap::new(),
            total_lines: 0,
            total_size: 0,
        })
    }

    /// Run the full pipeline and assemble the result document.
    pub fn scan(mut self) -> Result<Architecture, ScanError> {
        info!(root = %self.root.display(), "scanning repository");

        let dir_files = self.walk_directories();

        self.discover_components(&dir_files);
        debug!(components = self.components.len(), "discovery complete");

        self.scan_files(&dir_files);
        debug!(
            files = self.files.len(),
            symbols = self.symbols.len(),
            "file scan complete"
        );

        self.promote_component_types();
        self.improve_component_names();

        let relationships = relationships::detect(&self.root, &self.components, &self.files);
        debug!(relationships = relationships.len(), "relationships detected");

        self.compute_metrics();

        let (description, repository) = self.detect_project_info();

        docs::extract_component_docs(&self.root, &mut self.components);

        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());

        let mut arch = Architecture::new(root_name, self.root.to_string_lossy().to_string());
        arch.description = description.unwrap_or_default();
        arch.repository = repository;
        arch.components = self.build_component_tree();
        arch.stats = ScanStats {
            total_files: self.files.len(),
            total_lines: self.total_lines,
            total_size_bytes: self.total_size,
            languages: self.language_lines.clone(),
            // Pre-cap count: the emitted list below may be shorter.
            total_symbols: self.symbols.len(),
            total_components: self.components.len(),
            total_relationships: relationships.len(),
        };
        arch.relationships = relationships;
        arch.files = std::mem::take(&mut self.files);
        arch.symbols = cap_symbols(std::mem::take(&mut self.symbols), self.options.max_symbols);

        info!(
            components = arch.stats.total_components,
            files = arch.stats.total_files,
            symbols = arch.stats.total_symbols,
            relationships = arch.stats.total_relationships,
            "scan complete"
        );
        Ok(arch)
    }

    /// Walk the tree once, returning each directory's (sorted) filenames,
    /// keyed by root-relative slash path. Hidden and ignored directories are
    /// pruned before descent.
    fn walk_directories(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !name.starts_with('.') && !is_skipped_dir(&name)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(%err, "walk error");
                    continue;
                }
            };
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map(to_slash)
                .unwrap_or_default();
            if entry.file_type().is_dir() {
                map.entry(rel).or_default();
            } else {
                let name = entry.file_name().to_string_lossy().to_string();
                map.entry(slash_parent(&rel).to_string()).or_default().push(name);
            }
        }
        map
    }

    /// Phase 1: identify component boundaries from marker files, then
    /// synthesize module components for densely-coded directories.
    fn discover_components(&mut self, dir_files: &BTreeMap<String, Vec<String>>) {
        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        self.components.insert(
            String::new(),
            Component::new(make_component_id(""), root_name, ComponentType::Project, ""),
        );

        for (rel, files) in dir_files {
            for (marker, lang, comp_type) in COMPONENT_MARKERS {
                if !files.iter().any(|f| f == marker) {
                    continue;
                }
                // The root is pre-inserted; a root-level marker still supplies
                // its type, language, and manifest metadata.
                let mut comp = self.components.remove(rel).unwrap_or_else(|| {
                    Component::new(
                        make_component_id(rel),
                        crate::util::slash_basename(rel),
                        *comp_type,
                        rel.clone(),
                    )
                });
                comp.component_type = *comp_type;
                comp.language = lang.map(|l| l.to_string());
                self.apply_marker_metadata(&mut comp, marker, rel);
                self.components.insert(rel.clone(), comp);
                break;
            }
        }

        // Module synthesis: directories with enough recognized files become
        // module components so the tree has no large flat gaps.
        for (rel, files) in dir_files {
            if rel.is_empty() || self.components.contains_key(rel) {
                continue;
            }
            let depth = rel.matches('/').count();
            if depth > MODULE_SYNTHESIS_MAX_DEPTH {
                continue;
            }
            let recognized = files
                .iter()
                .filter(|f| {
                    extension_of(f)
                        .as_deref()
                        .is_some_and(|ext| language_for_extension(ext).is_some())
                })
                .count();
            if recognized >= MODULE_SYNTHESIS_MIN_FILES {
                self.components.insert(
                    rel.clone(),
                    Component::new(
                        make_component_id(rel),
                        crate::util::slash_basename(rel),
                        ComponentType::Module,
                        rel.clone(),
                    ),
                );
            }
        }
    }

    /// Pull name/description/config metadata out of the marker file that
    /// opened this component.
    fn apply_marker_metadata(&self, comp: &mut Component, marker: &str, rel: &str) {
        let marker_path = self.root.join(rel).join(marker);
        let config_rel = if rel.is_empty() {
            marker.to_string()
        } else {
            format!("{rel}/{marker}")
        };

        match marker {
            "package.json" => {
                if let Some(info) = manifest::parse_package_json(&marker_path) {
                    if !info.name.is_empty() {
                        comp.name = info.name.clone();
                    }
                    if !info.description.is_empty() {
                        comp.description = Some(info.description.clone());
                    }
                }
                comp.config_files.push(ConfigFile::new("package.json", config_rel));
            }
            "Cargo.toml" => {
                if let Some(info) = manifest::parse_cargo_toml(&marker_path) {
                    if !info.name.is_empty() {
                        comp.name = info.name.clone();
                    }
                }
                comp.config_files.push(ConfigFile::new("Cargo.toml", config_rel));
            }
            "pyproject.toml" => {
                if let Some(info) = manifest::parse_pyproject_toml(&marker_path) {
                    if !info.name.is_empty() {
                        comp.name = info.name.clone();
                    }
                }
                comp.config_files.push(ConfigFile::new("pyproject.toml", config_rel));
            }
            "docker-compose.yml" | "docker-compose.yaml" => {
                let mut cfg = ConfigFile::new("docker-compose", config_rel);
                if let Some(info) = manifest::parse_docker_compose(&marker_path) {
                    if !info.services.is_empty() {
                        comp.description = Some(format!("Services: {}", info.services.join(", ")));
                    }
                    cfg.details = details_of(&info);
                }
                comp.config_files.push(cfg);
            }
            "Info.plist" => {
                if let Some(info) = manifest::parse_info_plist(&marker_path) {
                    if !info.name.is_empty() {
                        comp.name = info.name.clone();
                    }
                }
                comp.config_files.push(ConfigFile::new("Info.plist", config_rel));
            }
            "Gemfile" => {
                if let Some(info) = manifest::parse_gemfile(&marker_path) {
                    if !info.name.is_empty() {
                        comp.name = info.name.clone();
                    }
                }
                comp.config_files.push(ConfigFile::new("Gemfile", config_rel));
            }
            "template.yaml" | "template.yml" => {
                let mut cfg = ConfigFile::new("sam-template", config_rel);
                if let Some(info) = manifest::parse_sam_template(&marker_path) {
                    if !info.functions.is_empty() {
                        comp.component_type = ComponentType::ApiServer;
                        let names: Vec<&str> =
                            info.functions.iter().map(|f| f.name.as_str()).collect();
                        comp.description = Some(format!("AWS SAM: {}", names.join(", ")));
                        if names.len() == 1 {
                            comp.name = names[0].to_string();
                        }
                    }
                    cfg.details = details_of(&info);
                }
                comp.config_files.push(cfg);
            }
            "serverless.yml" | "serverless.yaml" => {
                let mut cfg = ConfigFile::new("serverless", config_rel);
                if let Some(info) = manifest::parse_serverless_yml(&marker_path) {
                    if !info.functions.is_empty() {
                        comp.component_type = ComponentType::ApiServer;
                        comp.description =
                            Some(format!("Serverless: {}", info.functions.join(", ")));
                    }
                    cfg.details = details_of(&info);
                }
                comp.config_files.push(cfg);
            }
            _ => {}
        }
    }

    /// Phase 2: read every recognized file, extract symbols and imports, and
    /// attach files to their owning components.
    fn scan_files(&mut self, dir_files: &BTreeMap<String, Vec<String>>) {
        for (dir, files) in dir_files {
            for fname in files {
                if is_skipped_dir(fname) {
                    continue;
                }
                let Some(ext) = extension_of(fname) else {
                    continue;
                };
                if is_skipped_extension(&ext) {
                    continue;
                }
                let Some(lang) = language_for_extension(&ext) else {
                    continue;
                };

                let rel = if dir.is_empty() {
                    fname.clone()
                } else {
                    format!("{dir}/{fname}")
                };
                let full = self.root.join(&rel);
                let size = match full.metadata() {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        debug!(path = %rel, %err, "stat failed");
                        continue;
                    }
                };
                if size == 0 || size > self.options.max_file_size {
                    continue;
                }
                let content = match read_lossy(&full) {
                    Ok(content) => content,
                    Err(err) => {
                        debug!(path = %rel, %err, "read failed");
                        continue;
                    }
                };

                let lines = content.matches('\n').count() as u64 + 1;
                self.total_lines += lines;
                self.total_size += size;
                *self.language_lines.entry(lang.to_string()).or_insert(0) += lines;

                let mut symbols = Vec::new();
                let mut imports = Vec::new();
                let mut module_doc = None;
                if let Some(extractor) = extractor_for(lang) {
                    symbols = extractor.extract_symbols(&content, &rel, self.options.preview_lines);
                    imports = extractor.extract_imports(&content);
                    module_doc = extractor.extract_file_doc(&content);

                    if let Some(framework) = extractor.detect_framework(&content) {
                        if let Some(comp) = self.component_for_file_mut(&rel) {
                            comp.framework.get_or_insert_with(|| framework.to_string());
                        }
                    }

                    // Only code files may claim a component's port; markup and
                    // config files are full of port-like numbers.
                    if is_code_language(lang) {
                        let ports = extractor.detect_ports(&content);
                        if let Some(first) = ports.first() {
                            if let Some(comp) = self.component_for_file_mut(&rel) {
                                if comp.port.is_none() {
                                    comp.port = Some(*first);
                                }
                            }
                        }
                    }
                }

                let file_info = FileInfo {
                    path: rel.clone(),
                    language: lang.to_string(),
                    lines,
                    size_bytes: size,
                    symbols: symbols.iter().map(|s| s.id.clone()).collect(),
                    imports,
                    module_doc,
                };
                self.files.push(file_info);
                self.symbols.extend(symbols);

                if let Some(comp) = self.component_for_file_mut(&rel) {
                    comp.files.push(rel);
                }
            }
        }
    }

    /// Phase 2.5: promote generic component types to architectural roles.
    /// Content detection runs first and is final; the root skips content
    /// detection but may still be promoted.
    fn promote_component_types(&mut self) {
        let decisions: Vec<(String, ComponentType)> = self
            .components
            .iter()
            .filter_map(|(rel, comp)| {
                if !rel.is_empty() && classify::is_content_only(comp, rel) {
                    return Some((rel.clone(), ComponentType::Content));
                }
                classify::architectural_role(&self.root, comp, rel).map(|t| (rel.clone(), t))
            })
            .collect();
        for (rel, new_type) in decisions {
            if let Some(comp) = self.components.get_mut(&rel) {
                debug!(component = %comp.id, from = %comp.component_type, to = %new_type, "promoted");
                comp.component_type = new_type;
            }
        }
    }

    /// Phase 2.6: components still carrying their generic folder name get a
    /// second chance at a real name now that their role is known.
    fn improve_component_names(&mut self) {
        let updates: Vec<(String, String)> = self
            .components
            .iter()
            .filter_map(|(rel, comp)| {
                if rel.is_empty() {
                    return None;
                }
                let folder_name = crate::util::slash_basename(rel);
                if comp.name != folder_name {
                    return None;
                }
                classify::improved_name(&self.root, comp, rel).map(|n| (rel.clone(), n))
            })
            .collect();
        for (rel, name) in updates {
            if let Some(comp) = self.components.get_mut(&rel) {
                comp.name = name;
            }
        }
    }

    /// Phase 4: per-component aggregate metrics, plus a dominant-language
    /// fill for components that never declared one.
    fn compute_metrics(&mut self) {
        let by_path: BTreeMap<&str, &FileInfo> =
            self.files.iter().map(|f| (f.path.as_str(), f)).collect();

        for comp in self.components.values_mut() {
            let mut metrics = atlas_model::ComponentMetrics {
                files: comp.files.len(),
                ..Default::default()
            };
            for fpath in &comp.files {
                if let Some(info) = by_path.get(fpath.as_str()) {
                    metrics.lines += info.lines;
                    metrics.size_bytes += info.size_bytes;
                    metrics.symbols += info.symbols.len();
                    *metrics.languages.entry(info.language.clone()).or_insert(0) += info.lines;
                }
            }
            if comp.language.is_none() {
                comp.language = metrics
                    .languages
                    .iter()
                    .max_by_key(|(_, lines)| **lines)
                    .map(|(lang, _)| lang.clone());
            }
            comp.metrics = metrics;
        }
    }

    /// Phase 5: root README description and git remote URL.
    fn detect_project_info(&self) -> (Option<String>, Option<String>) {
        let mut description = None;
        for name in ["README.md", "README.rst", "README.txt", "README"] {
            let readme = self.root.join(name);
            if !readme.exists() {
                continue;
            }
            if let Ok(content) = read_lossy(&readme) {
                description = content
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('='))
                    .map(|l| truncate_chars(l, DESCRIPTION_MAX_CHARS).to_string());
            }
            break;
        }

        let mut repository = None;
        let git_config = self.root.join(".git").join("config");
        if git_config.exists() {
            if let Ok(content) = read_lossy(&git_config) {
                if let Some(caps) = GIT_URL_RE.captures(&content) {
                    let url = caps[1].trim();
                    let url = url.replace("git@github.com:", "https://github.com/");
                    let url = url.strip_suffix(".git").unwrap_or(&url).to_string();
                    repository = Some(url);
                }
            }
        }

        (description, repository)
    }

    /// Nest components under their nearest ancestor component, children
    /// sorted by path.
    fn build_component_tree(&self) -> Vec<Component> {
        let mut children_map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut roots: Vec<&str> = Vec::new();

        for path in self.components.keys() {
            match self.find_parent_component(path) {
                Some(parent) => children_map.entry(parent).or_default().push(path),
                None => roots.push(path),
            }
        }

        fn build(
            path: &str,
            components: &BTreeMap<String, Component>,
            children_map: &BTreeMap<&str, Vec<&str>>,
        ) -> Component {
            let mut comp = components[path].clone();
            comp.children = children_map
                .get(path)
                .map(|children| {
                    children
                        .iter()
                        .map(|child| build(child, components, children_map))
                        .collect()
                })
                .unwrap_or_default();
            comp
        }

        roots
            .iter()
            .map(|path| build(path, &self.components, &children_map))
            .collect()
    }

    /// The nearest strict-ancestor component path, if any.
    fn find_parent_component(&self, rel_path: &str) -> Option<&str> {
        if rel_path.is_empty() {
            return None;
        }
        let mut current = slash_parent(rel_path);
        loop {
            if let Some((key, _)) = self.components.get_key_value(current) {
                return Some(key);
            }
            if current.is_empty() {
                return None;
            }
            current = slash_parent(current);
        }
    }

    /// Map key of the deepest component whose directory contains this file.
    fn component_key_for_file(&self, file_path: &str) -> Option<String> {
        let mut current = slash_parent(file_path);
        loop {
            if self.components.contains_key(current) {
                return Some(current.to_string());
            }
            if current.is_empty() {
                return None;
            }
            current = slash_parent(current);
        }
    }

    fn component_for_file_mut(&mut self, file_path: &str) -> Option<&mut Component> {
        let key = self.component_key_for_file(file_path)?;
        self.components.get_mut(&key)
    }
}

/// Stable component id from a root-relative path.
pub(crate) fn make_component_id(rel_path: &str) -> String {
    if rel_path.is_empty() {
        return "root".to_string();
    }
    rel_path.replace(' ', "-").to_lowercase()
}

/// Serialize parser output into a flattened details map.
fn details_of<T: Serialize>(value: &T) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

/// Symbol-kind retention priority: types first, then aliases/components,
/// impl blocks, functions, everything else.
fn symbol_priority(kind: &str) -> u8 {
    match kind {
        "class" | "struct" | "enum" | "protocol" | "trait" | "interface" | "actor" => 0,
        "type" | "component" => 1,
        "impl" | "extension" => 2,
        "function" => 3,
        _ => 5,
    }
}

/// Apply the symbol cap, keeping public types over private helpers. A cap of
/// zero means unlimited.
fn cap_symbols(mut symbols: Vec<Symbol>, max_symbols: usize) -> Vec<Symbol> {
    if max_symbols == 0 || symbols.len() <= max_symbols {
        return symbols;
    }
    symbols.sort_by(|a, b| {
        let key = |s: &Symbol| {
            (
                symbol_priority(&s.kind),
                if s.visibility == Visibility::Public { 0u8 } else { 1 },
            )
        };
        key(a).cmp(&key(b)).then_with(|| a.file.cmp(&b.file))
    });
    symbols.truncate(max_symbols);
    symbols
}
