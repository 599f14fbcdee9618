//! Component types and structures for the architecture graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error returned when parsing an unknown component type string.
#[derive(Debug, Error)]
#[error("Unknown component type: {0}")]
pub struct UnknownComponentType(pub String);

/// The classification of a component in the architecture graph.
///
/// Components start out with a generic type derived from their boundary
/// marker (`package`, `module`, `service`, ...) and may be promoted exactly
/// once to a specific architectural role (`api-server`, `ios-client`, ...)
/// by the role-promotion phase. `Content` is final: content components are
/// excluded from promotion and from relationship participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    /// The scan root itself.
    Project,
    /// A language package (Cargo.toml, package.json, Package.swift, ...).
    Package,
    /// A source module without a package manifest (go.mod, Makefile, or
    /// synthesized for densely-coded directories).
    Module,
    /// A deployable service (Dockerfile, or a standalone server script).
    Service,
    /// An application bundle (Info.plist).
    Application,
    /// Deployment infrastructure (compose files, SAM/Serverless templates).
    Infrastructure,
    /// Non-architectural content: docs, fixtures, samples.
    Content,
    /// A wrapper node for one repository in a multi-repo merge.
    Repository,

    // Promoted architectural roles.
    IosClient,
    AndroidClient,
    /// Cross-platform mobile app (React Native, Flutter).
    MobileClient,
    DesktopApp,
    ApiServer,
    WebClient,
    CliTool,
    WatchApp,
}

impl ComponentType {
    /// Get the kebab-case string representation used in serialized documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Project => "project",
            ComponentType::Package => "package",
            ComponentType::Module => "module",
            ComponentType::Service => "service",
            ComponentType::Application => "application",
            ComponentType::Infrastructure => "infrastructure",
            ComponentType::Content => "content",
            ComponentType::Repository => "repository",
            ComponentType::IosClient => "ios-client",
            ComponentType::AndroidClient => "android-client",
            ComponentType::MobileClient => "mobile-client",
            ComponentType::DesktopApp => "desktop-app",
            ComponentType::ApiServer => "api-server",
            ComponentType::WebClient => "web-client",
            ComponentType::CliTool => "cli-tool",
            ComponentType::WatchApp => "watch-app",
        }
    }

    /// True for the generic discovery-time types that role promotion may
    /// overwrite.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            ComponentType::Project
                | ComponentType::Package
                | ComponentType::Module
                | ComponentType::Service
                | ComponentType::Application
                | ComponentType::Infrastructure
        )
    }
}

impl std::str::FromStr for ComponentType {
    type Err = UnknownComponentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(ComponentType::Project),
            "package" => Ok(ComponentType::Package),
            "module" => Ok(ComponentType::Module),
            "service" => Ok(ComponentType::Service),
            "application" => Ok(ComponentType::Application),
            "infrastructure" => Ok(ComponentType::Infrastructure),
            "content" => Ok(ComponentType::Content),
            "repository" => Ok(ComponentType::Repository),
            "ios-client" => Ok(ComponentType::IosClient),
            "android-client" => Ok(ComponentType::AndroidClient),
            "mobile-client" => Ok(ComponentType::MobileClient),
            "desktop-app" => Ok(ComponentType::DesktopApp),
            "api-server" => Ok(ComponentType::ApiServer),
            "web-client" => Ok(ComponentType::WebClient),
            "cli-tool" => Ok(ComponentType::CliTool),
            "watch-app" => Ok(ComponentType::WatchApp),
            _ => Err(UnknownComponentType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A config file discovered inside a component, with parser-specific extras
/// (e.g. compose service names, SAM function descriptors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Config kind, e.g. "package.json", "docker-compose", "sam-template".
    #[serde(rename = "type")]
    pub kind: String,

    /// Root-relative path to the file.
    pub path: String,

    /// Parser-specific metadata, flattened into the record.
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ConfigFile {
    /// Create a config file record with no extra details.
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            details: serde_json::Map::new(),
        }
    }
}

/// A detected API route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// HTTP method, upper-cased (GET, POST, ...).
    pub method: String,
    /// Route path as written in source.
    pub path: String,
}

/// Aggregate size metrics for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetrics {
    /// Number of files attached to this component.
    pub files: usize,
    /// Total line count across attached files.
    pub lines: u64,
    /// Total byte count across attached files.
    pub size_bytes: u64,
    /// Total symbol count across attached files.
    pub symbols: usize,
    /// Line counts per language.
    pub languages: BTreeMap<String, u64>,
}

/// Rich documentation extracted for a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDoc {
    /// README content (markdown), truncated if very large.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    /// CLAUDE.md content (AI assistant instructions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_md: Option<String>,

    /// CHANGELOG content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,

    /// Summaries extracted from a docs/ directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture_notes: Option<String>,

    /// One-line purpose from package metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Architectural patterns detected from file-name vocabulary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,

    /// Technologies detected (framework, language, tool configs).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,

    /// Environment variable names referenced by the component's files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_vars: Vec<String>,

    /// API routes detected in the component's files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_endpoints: Vec<ApiEndpoint>,
}

/// A node in the architecture graph.
///
/// Exactly one component per scan has `path == ""` (the project root). Every
/// other component's path is a strict descendant of exactly one ancestor
/// component's path; the serialized hierarchy is a tree, not a DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier derived from the root-relative path.
    pub id: String,

    /// Human-readable name (directory basename, improved from manifests).
    pub name: String,

    /// Component classification.
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Root-relative path; empty string for the project root.
    pub path: String,

    /// Dominant or declared language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Detected framework (first detection wins).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Description from package metadata or manifest contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// First detected listening port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Child components, serialized depth-first in path order.
    #[serde(default)]
    pub children: Vec<Component>,

    /// Root-relative paths of files owned by this component.
    #[serde(default)]
    pub files: Vec<String>,

    /// Config files discovered in this component.
    #[serde(default)]
    pub config_files: Vec<ConfigFile>,

    /// Aggregate metrics, filled by the metrics phase.
    #[serde(default)]
    pub metrics: ComponentMetrics,

    /// Documentation bundle, filled by the doc-extraction phase.
    #[serde(default)]
    pub docs: ComponentDoc,
}

impl Component {
    /// Create a component with the given identity and no attached data.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        component_type: ComponentType,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            component_type,
            path: path.into(),
            language: None,
            framework: None,
            description: None,
            port: None,
            children: Vec::new(),
            files: Vec::new(),
            config_files: Vec::new(),
            metrics: ComponentMetrics::default(),
            docs: ComponentDoc::default(),
        }
    }

    /// True if this component is the project root.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_component_type_round_trips_through_str() {
        let all = [
            ComponentType::Project,
            ComponentType::Package,
            ComponentType::Module,
            ComponentType::Service,
            ComponentType::Application,
            ComponentType::Infrastructure,
            ComponentType::Content,
            ComponentType::Repository,
            ComponentType::IosClient,
            ComponentType::AndroidClient,
            ComponentType::MobileClient,
            ComponentType::DesktopApp,
            ComponentType::ApiServer,
            ComponentType::WebClient,
            ComponentType::CliTool,
            ComponentType::WatchApp,
        ];
        for ty in all {
            let parsed: ComponentType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_component_type_unknown() {
        let result = "mainframe".parse::<ComponentType>();
        assert!(result.is_err());
    }

    #[test]
    fn test_component_type_serde_kebab_case() {
        let json = serde_json::to_string(&ComponentType::ApiServer).unwrap();
        assert_eq!(json, "\"api-server\"");
        let back: ComponentType = serde_json::from_str("\"watch-app\"").unwrap();
        assert_eq!(back, ComponentType::WatchApp);
    }

    #[test]
    fn test_generic_types() {
        assert!(ComponentType::Package.is_generic());
        assert!(ComponentType::Module.is_generic());
        assert!(!ComponentType::Content.is_generic());
        assert!(!ComponentType::ApiServer.is_generic());
    }

    #[test]
    fn test_component_root() {
        let root = Component::new("root", "my-project", ComponentType::Project, "");
        assert!(root.is_root());

        let child = Component::new("src/api", "api", ComponentType::Module, "src/api");
        assert!(!child.is_root());
    }

    #[test]
    fn test_config_file_details_flatten() {
        let mut cfg = ConfigFile::new("docker-compose", "docker-compose.yml");
        cfg.details.insert(
            "services".to_string(),
            serde_json::json!(["api", "worker"]),
        );

        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["type"], "docker-compose");
        assert_eq!(value["services"][0], "api");

        let back: ConfigFile = serde_json::from_value(value).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_component_serialization_roundtrip() {
        let mut comp = Component::new("backend", "backend", ComponentType::ApiServer, "backend");
        comp.language = Some("python".to_string());
        comp.port = Some(8080);
        comp.files.push("backend/main.py".to_string());

        let json = serde_json::to_string(&comp).unwrap();
        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comp);
    }
}
