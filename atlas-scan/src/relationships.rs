//! Cross-component edge detection: import resolution, port references, and
//! watch/iOS companion pairing.

use crate::filters::is_code_language;
use crate::util::{read_lossy, slash_basename, slash_parent};
use atlas_model::{Component, ComponentType, FileInfo, Relationship, RelationshipType};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Detect relationships between the discovered components.
///
/// Content components never participate, and edges are deduplicated on
/// `(source, target, type)` with the first occurrence winning so labels stay
/// stable across runs.
pub(crate) fn detect(
    root: &Path,
    components: &BTreeMap<String, Component>,
    files: &[FileInfo],
) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut seen: HashSet<(String, String, RelationshipType)> = HashSet::new();

    let content_ids: HashSet<&str> = components
        .values()
        .filter(|c| c.component_type == ComponentType::Content)
        .map(|c| c.id.as_str())
        .collect();

    // Import edges.
    for file in files {
        let Some(source) = component_for_path(components, &file.path) else {
            continue;
        };
        if content_ids.contains(source.id.as_str()) {
            continue;
        }

        for import in &file.imports {
            let Some(target) = resolve_import(components, import, &file.path) else {
                continue;
            };
            if target.id == source.id || content_ids.contains(target.id.as_str()) {
                continue;
            }
            let key = (source.id.clone(), target.id.clone(), RelationshipType::Import);
            if seen.insert(key) {
                let mut rel =
                    Relationship::new(&source.id, &target.id, RelationshipType::Import);
                rel.label = Some(import.clone());
                relationships.push(rel);
            }
        }
    }

    // Port edges: a code file in one component referencing another
    // component's port becomes an HTTP edge.
    let port_map: BTreeMap<u16, &Component> = components
        .values()
        .filter(|c| !content_ids.contains(c.id.as_str()))
        .filter_map(|c| c.port.map(|p| (p, c)))
        .collect();

    if !port_map.is_empty() {
        for file in files {
            if !is_code_language(&file.language) {
                continue;
            }
            let Some(source) = component_for_path(components, &file.path) else {
                continue;
            };
            if content_ids.contains(source.id.as_str()) {
                continue;
            }
            let Ok(content) = read_lossy(&root.join(&file.path)) else {
                continue;
            };

            for (port, target) in &port_map {
                if target.id == source.id || !content.contains(&port.to_string()) {
                    continue;
                }
                if references_port(&content, *port) {
                    let key = (source.id.clone(), target.id.clone(), RelationshipType::Http);
                    if seen.insert(key) {
                        let mut rel =
                            Relationship::new(&source.id, &target.id, RelationshipType::Http);
                        rel.port = Some(*port);
                        rel.protocol = Some("REST".to_string());
                        rel.label = Some(format!("port {port}"));
                        relationships.push(rel);
                    }
                }
            }
        }
    }

    // Watch apps pair with their iOS companion.
    let watch_apps: Vec<&Component> = components
        .values()
        .filter(|c| c.component_type == ComponentType::WatchApp)
        .collect();
    let ios_clients: Vec<&Component> = components
        .values()
        .filter(|c| c.component_type == ComponentType::IosClient)
        .collect();
    if !watch_apps.is_empty() && !ios_clients.is_empty() {
        for watch in &watch_apps {
            let mut best = ios_clients[0];
            let watch_parent = slash_parent(&watch.path);
            let stem = watch
                .name
                .to_lowercase()
                .replace(" watch", "")
                .replace("watch", "")
                .trim()
                .to_string();
            for ios in &ios_clients {
                if slash_parent(&ios.path) == watch_parent
                    || ios.name.to_lowercase().contains(&stem)
                {
                    best = ios;
                    break;
                }
            }
            let key = (watch.id.clone(), best.id.clone(), RelationshipType::Import);
            if seen.insert(key) {
                let mut rel = Relationship::new(&watch.id, &best.id, RelationshipType::Import);
                rel.label = Some("companion app".to_string());
                relationships.push(rel);
            }
        }
    }

    debug!(edges = relationships.len(), "relationship detection complete");
    relationships
}

/// The deepest component whose directory contains this path, falling back to
/// the root component.
fn component_for_path<'a>(
    components: &'a BTreeMap<String, Component>,
    path: &str,
) -> Option<&'a Component> {
    let mut current = slash_parent(path);
    loop {
        if let Some(comp) = components.get(current) {
            return Some(comp);
        }
        if current.is_empty() {
            return components.get("");
        }
        current = slash_parent(current);
    }
}

/// Resolve an import token to the component that owns it.
///
/// Relative imports walk the `.`/`..` segments from the source file's
/// directory; bare imports match component names (ignoring `-`/`_`) or a
/// component's directory basename.
fn resolve_import<'a>(
    components: &'a BTreeMap<String, Component>,
    import: &str,
    source_file: &str,
) -> Option<&'a Component> {
    if import.starts_with('.') {
        let mut current = slash_parent(source_file).to_string();
        for part in import.split('/') {
            match part {
                "." | "" => {}
                ".." => current = slash_parent(&current).to_string(),
                _ => {
                    if !current.is_empty() {
                        current.push('/');
                    }
                    current.push_str(part);
                }
            }
        }
        return component_for_path(components, &current);
    }

    let import_lower = import.to_lowercase();
    let import_flat = import_lower.replace(['-', '_'], "");
    for (path, comp) in components {
        let comp_flat = comp.name.to_lowercase().replace(['-', '_'], "");
        if import_flat == comp_flat {
            return Some(comp);
        }
        if !path.is_empty() && slash_basename(path).to_lowercase() == import_lower {
            return Some(comp);
        }
    }
    None
}

/// True when the content references the port in a network context rather
/// than as an arbitrary number.
fn references_port(content: &str, port: u16) -> bool {
    let patterns = [
        format!(r"localhost:{port}\b"),
        format!(r"127\.0\.0\.1:{port}\b"),
        format!(r"0\.0\.0\.0:{port}\b"),
        format!(r#"["']https?://[^"']*:{port}\b"#),
        format!(r"(?:PORT|port)\s*[=:]\s*{port}\b"),
    ];
    patterns.iter().any(|pat| {
        Regex::new(pat).map(|re| re.is_match(content)).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn component(path: &str, comp_type: ComponentType) -> Component {
        let id = if path.is_empty() { "root" } else { path };
        Component::new(id, slash_basename(path), comp_type, path)
    }

    fn file(path: &str, language: &str, imports: &[&str]) -> FileInfo {
        FileInfo {
            path: path.to_string(),
            language: language.to_string(),
            lines: 1,
            size_bytes: 10,
            symbols: Vec::new(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            module_doc: None,
        }
    }

    fn base_components() -> BTreeMap<String, Component> {
        let mut map = BTreeMap::new();
        map.insert(String::new(), component("", ComponentType::Project));
        map.insert("api".to_string(), component("api", ComponentType::ApiServer));
        map.insert("web".to_string(), component("web", ComponentType::WebClient));
        map
    }

    #[test]
    fn test_import_edge_by_name_match() {
        let components = base_components();
        let files = vec![file("web/src/client.ts", "typescript", &["api"])];
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &files);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source, "web");
        assert_eq!(rels[0].target, "api");
        assert_eq!(rels[0].relationship_type, RelationshipType::Import);
        assert_eq!(rels[0].label.as_deref(), Some("api"));
    }

    #[test]
    fn test_relative_import_resolves_across_components() {
        let mut components = base_components();
        components.insert("web/lib".to_string(), component("web/lib", ComponentType::Module));
        let files = vec![file("web/src/app.ts", "typescript", &["../lib/store"])];
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &files);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source, "web");
        assert_eq!(rels[0].target, "web/lib");
    }

    #[test]
    fn test_self_import_is_skipped() {
        let components = base_components();
        let files = vec![file("api/src/main.rs", "rust", &["api"])];
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &files);
        assert!(rels.is_empty());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let components = base_components();
        let files = vec![
            file("web/src/a.ts", "typescript", &["api"]),
            file("web/src/b.ts", "typescript", &["api"]),
        ];
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &files);
        assert_eq!(rels.len(), 1);
    }

    #[test]
    fn test_content_components_excluded() {
        let mut components = base_components();
        components.insert("docs".to_string(), component("docs", ComponentType::Content));
        let files = vec![file("web/src/a.ts", "typescript", &["docs"])];
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &files);
        assert!(rels.is_empty());
    }

    #[test]
    fn test_port_reference_creates_http_edge() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("web/src")).unwrap();
        fs::write(
            dir.path().join("web/src/client.ts"),
            "const API = \"http://localhost:8080/api\";\n",
        )
        .unwrap();

        let mut components = base_components();
        components.get_mut("api").unwrap().port = Some(8080);
        let files = vec![file("web/src/client.ts", "typescript", &[])];

        let rels = detect(dir.path(), &components, &files);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type, RelationshipType::Http);
        assert_eq!(rels[0].port, Some(8080));
        assert_eq!(rels[0].protocol.as_deref(), Some("REST"));
        assert_eq!(rels[0].label.as_deref(), Some("port 8080"));
    }

    #[test]
    fn test_bare_port_number_is_not_an_edge() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("web/src")).unwrap();
        fs::write(
            dir.path().join("web/src/math.ts"),
            "const total = 8080 + 1;\n",
        )
        .unwrap();

        let mut components = base_components();
        components.get_mut("api").unwrap().port = Some(8080);
        let files = vec![file("web/src/math.ts", "typescript", &[])];

        let rels = detect(dir.path(), &components, &files);
        assert!(rels.is_empty());
    }

    #[test]
    fn test_watch_app_pairs_with_companion() {
        let mut components = BTreeMap::new();
        components.insert(String::new(), component("", ComponentType::Project));
        let mut watch = component("TrailWatch Watch App", ComponentType::WatchApp);
        watch.id = "trailwatch-watch-app".to_string();
        watch.name = "TrailWatch Watch App".to_string();
        components.insert("TrailWatch Watch App".to_string(), watch);
        let mut ios = component("TrailApp", ComponentType::IosClient);
        ios.name = "Trail".to_string();
        components.insert("TrailApp".to_string(), ios);
        let dir = TempDir::new().unwrap();

        let rels = detect(dir.path(), &components, &[]);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source, "trailwatch-watch-app");
        assert_eq!(rels[0].target, "TrailApp");
        assert_eq!(rels[0].label.as_deref(), Some("companion app"));
    }

    #[test]
    fn test_references_port_patterns() {
        assert!(references_port("fetch('http://localhost:3000/x')", 3000));
        assert!(references_port("PORT = 3000", 3000));
        assert!(references_port("addr = \"0.0.0.0:3000\"", 3000));
        assert!(!references_port("let x = 3000;", 3000));
    }
}
