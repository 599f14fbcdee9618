//! Build-manifest and deployment-config parsers.
//!
//! Each parser reads one well-known file (package.json, Cargo.toml,
//! Gemfile, docker-compose.yml, ...) and reduces it to the handful of
//! fields the scanner cares about: a name, a description, dependency
//! names, declared services. Parse failures are never fatal; a manifest
//! that does not parse simply contributes nothing.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static GEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"gem\s+['"]([^'"]+)['"]"#).unwrap());
static RAILS_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"module\s+(\w+)").unwrap());
static RACK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"run\s+(\w+)::Application").unwrap());
static RAKE_TASKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)::Application\.load_tasks").unwrap());
static PORT_MAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+):(\d+)").unwrap());

fn read(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            debug!(path = %path.display(), %err, "manifest unreadable");
            None
        }
    }
}

/// package.json metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageJson {
    pub name: String,
    pub description: String,
    pub version: String,
    /// dependencies and devDependencies, merged and sorted.
    pub dependencies: Vec<String>,
    pub scripts: Vec<String>,
}

pub fn parse_package_json(path: &Path) -> Option<PackageJson> {
    let content = read(path)?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid package.json");
            return None;
        }
    };

    let fallback_name = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let keys_of = |field: &str| -> Vec<String> {
        value[field]
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    };

    let mut dependencies = keys_of("dependencies");
    dependencies.extend(keys_of("devDependencies"));
    dependencies.sort();
    dependencies.dedup();

    Some(PackageJson {
        name: value["name"].as_str().unwrap_or(&fallback_name).to_string(),
        description: value["description"].as_str().unwrap_or_default().to_string(),
        version: value["version"].as_str().unwrap_or_default().to_string(),
        dependencies,
        scripts: keys_of("scripts"),
    })
}

/// Cargo.toml metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CargoToml {
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
}

pub fn parse_cargo_toml(path: &Path) -> Option<CargoToml> {
    let content = read(path)?;
    let value: toml::Value = match content.parse() {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid Cargo.toml");
            return None;
        }
    };

    let package = value.get("package");
    let str_field = |field: &str| -> String {
        package
            .and_then(|p| p.get(field))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let mut dependencies = Vec::new();
    for table in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(deps) = value.get(table).and_then(|v| v.as_table()) {
            dependencies.extend(deps.keys().cloned());
        }
    }
    if let Some(deps) = value
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        dependencies.extend(deps.keys().cloned());
    }
    dependencies.sort();
    dependencies.dedup();

    Some(CargoToml {
        name: str_field("name"),
        description: str_field("description"),
        dependencies,
    })
}

/// pyproject.toml metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PyprojectToml {
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
}

/// Strip a PEP 508 requirement down to its distribution name.
fn requirement_name(spec: &str) -> String {
    spec.chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

pub fn parse_pyproject_toml(path: &Path) -> Option<PyprojectToml> {
    let content = read(path)?;
    let value: toml::Value = match content.parse() {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid pyproject.toml");
            return None;
        }
    };

    let project = value.get("project")?;
    let str_field = |field: &str| -> String {
        project
            .get(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let mut dependencies: Vec<String> = Vec::new();
    if let Some(deps) = project.get("dependencies").and_then(|v| v.as_array()) {
        dependencies.extend(
            deps.iter()
                .filter_map(|v| v.as_str())
                .map(requirement_name),
        );
    }
    if let Some(groups) = project
        .get("optional-dependencies")
        .and_then(|v| v.as_table())
    {
        for deps in groups.values() {
            if let Some(deps) = deps.as_array() {
                dependencies.extend(
                    deps.iter()
                        .filter_map(|v| v.as_str())
                        .map(requirement_name),
                );
            }
        }
    }
    dependencies.retain(|d| !d.is_empty() && d != "python");
    dependencies.sort();
    dependencies.dedup();

    Some(PyprojectToml {
        name: str_field("name"),
        description: str_field("description"),
        dependencies,
    })
}

/// Info.plist bundle metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoPlist {
    pub name: String,
    pub bundle_id: String,
}

/// Look up the `<string>` following a `<key>` in a plist dict.
fn plist_string(doc: &roxmltree::Document<'_>, key: &str) -> Option<String> {
    let mut nodes = doc
        .descendants()
        .filter(|n| n.is_element());
    while let Some(node) = nodes.next() {
        if node.has_tag_name("key") && node.text() == Some(key) {
            return nodes
                .next()
                .filter(|v| v.has_tag_name("string"))
                .and_then(|v| v.text())
                .map(|s| s.to_string());
        }
    }
    None
}

pub fn parse_info_plist(path: &Path) -> Option<InfoPlist> {
    let content = read(path)?;
    let doc = match roxmltree::Document::parse(&content) {
        Ok(d) => d,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid Info.plist");
            return None;
        }
    };

    let mut name = plist_string(&doc, "CFBundleDisplayName")
        .or_else(|| plist_string(&doc, "CFBundleName"))
        .unwrap_or_default();
    // Reject build-time placeholders like $(PRODUCT_NAME).
    if name.contains("$(") || name.contains("${") {
        name.clear();
    }

    Some(InfoPlist {
        name,
        bundle_id: plist_string(&doc, "CFBundleIdentifier").unwrap_or_default(),
    })
}

/// Insert spaces at lower-to-upper camel case boundaries
/// (`TrailBlazer` becomes `Trail Blazer`).
fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_ascii_lowercase();
        out.push(ch);
    }
    out
}

/// Recover a Rails/Rack application name from its conventional files.
pub(crate) fn ruby_app_name(base_dir: &Path) -> String {
    let probes: [(&str, &LazyLock<Regex>); 3] = [
        ("config/application.rb", &RAILS_MODULE_RE),
        ("config.ru", &RACK_RUN_RE),
        ("Rakefile", &RAKE_TASKS_RE),
    ];
    for (file, re) in probes {
        if let Some(content) = read(&base_dir.join(file)) {
            if let Some(caps) = re.captures(&content) {
                return split_camel_case(&caps[1]);
            }
        }
    }
    String::new()
}

/// Gemfile metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gemfile {
    /// App name recovered from Rails/Rack conventions, possibly empty.
    pub name: String,
    pub dependencies: Vec<String>,
}

pub fn parse_gemfile(path: &Path) -> Option<Gemfile> {
    let content = read(path)?;
    let mut dependencies: Vec<String> = GEM_RE
        .captures_iter(&content)
        .map(|c| c[1].to_string())
        .collect();
    dependencies.sort();
    dependencies.dedup();

    let name = path
        .parent()
        .map(ruby_app_name)
        .unwrap_or_default();

    Some(Gemfile { name, dependencies })
}

/// One published port mapping in a compose file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposePort {
    pub service: String,
    pub host: u16,
    pub container: u16,
}

/// docker-compose.yml services and port mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DockerCompose {
    pub services: Vec<String>,
    pub ports: Vec<ComposePort>,
}

pub fn parse_docker_compose(path: &Path) -> Option<DockerCompose> {
    let content = read(path)?;
    let value: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid compose file");
            return None;
        }
    };

    let mut out = DockerCompose::default();
    let Some(services) = value.get("services").and_then(|v| v.as_mapping()) else {
        return Some(out);
    };

    for (name, body) in services {
        let Some(name) = name.as_str() else { continue };
        out.services.push(name.to_string());

        let Some(ports) = body.get("ports").and_then(|v| v.as_sequence()) else {
            continue;
        };
        for entry in ports {
            let mapping = match entry {
                // Short syntax: "8080:80" or "127.0.0.1:8080:80".
                serde_yaml::Value::String(s) => PORT_MAP_RE.captures(s).and_then(|c| {
                    Some((c[1].parse::<u16>().ok()?, c[2].parse::<u16>().ok()?))
                }),
                // Long syntax: {published: 8080, target: 80}.
                serde_yaml::Value::Mapping(_) => {
                    let num = |field: &str| {
                        entry
                            .get(field)
                            .and_then(|v| v.as_u64())
                            .and_then(|v| u16::try_from(v).ok())
                    };
                    num("published").zip(num("target"))
                }
                _ => None,
            };
            if let Some((host, container)) = mapping {
                out.ports.push(ComposePort {
                    service: name.to_string(),
                    host,
                    container,
                });
            }
        }
    }
    Some(out)
}

/// One Lambda function in a SAM template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LambdaFunction {
    pub name: String,
    pub runtime: String,
    pub handler: String,
    pub code_uri: String,
}

/// AWS SAM template resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamTemplate {
    pub functions: Vec<LambdaFunction>,
    pub has_api_gateway: bool,
}

pub fn parse_sam_template(path: &Path) -> Option<SamTemplate> {
    let content = read(path)?;
    let value: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid SAM template");
            return None;
        }
    };

    let mut out = SamTemplate::default();
    let Some(resources) = value.get("Resources").and_then(|v| v.as_mapping()) else {
        return Some(out);
    };

    for (name, body) in resources {
        let Some(name) = name.as_str() else { continue };
        let kind = body.get("Type").and_then(|v| v.as_str()).unwrap_or_default();
        if kind.contains("ApiGateway") || kind == "AWS::Serverless::Api" {
            out.has_api_gateway = true;
        }
        if !kind.contains("Function") {
            continue;
        }
        let prop = |field: &str| -> String {
            body.get("Properties")
                .and_then(|p| p.get(field))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        out.functions.push(LambdaFunction {
            name: name.to_string(),
            runtime: prop("Runtime"),
            handler: prop("Handler"),
            code_uri: prop("CodeUri"),
        });
    }
    Some(out)
}

/// serverless.yml functions and provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerlessYml {
    pub functions: Vec<String>,
    pub provider: String,
}

pub fn parse_serverless_yml(path: &Path) -> Option<ServerlessYml> {
    let content = read(path)?;
    let value: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            debug!(path = %path.display(), %err, "invalid serverless.yml");
            return None;
        }
    };

    let functions = value
        .get("functions")
        .and_then(|v| v.as_mapping())
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str())
                .map(|k| k.to_string())
                .collect()
        })
        .unwrap_or_default();

    let provider = value
        .get("provider")
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Some(ServerlessYml { functions, provider })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_package_json() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "web/package.json",
            r#"{
                "name": "storefront",
                "description": "Shop UI",
                "version": "2.1.0",
                "dependencies": {"react": "^18", "next": "^14"},
                "devDependencies": {"vitest": "^1"},
                "scripts": {"build": "next build", "dev": "next dev"}
            }"#,
        );
        let pkg = parse_package_json(&path).unwrap();
        assert_eq!(pkg.name, "storefront");
        assert_eq!(pkg.description, "Shop UI");
        assert_eq!(pkg.dependencies, vec!["next", "react", "vitest"]);
        assert_eq!(pkg.scripts, vec!["build", "dev"]);
    }

    #[test]
    fn test_package_json_name_falls_back_to_dir() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "widgets/package.json", r#"{"private": true}"#);
        let pkg = parse_package_json(&path).unwrap();
        assert_eq!(pkg.name, "widgets");
    }

    #[test]
    fn test_package_json_invalid_is_none() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "package.json", "{not json");
        assert!(parse_package_json(&path).is_none());
    }

    #[test]
    fn test_cargo_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Cargo.toml",
            r#"
[package]
name = "gateway"
description = "Edge proxy"

[dependencies]
axum = "0.7"
serde = { version = "1", features = ["derive"] }

[dev-dependencies]
tempfile = "3"
"#,
        );
        let cargo = parse_cargo_toml(&path).unwrap();
        assert_eq!(cargo.name, "gateway");
        assert_eq!(cargo.description, "Edge proxy");
        assert_eq!(cargo.dependencies, vec!["axum", "serde", "tempfile"]);
    }

    #[test]
    fn test_pyproject_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "pyproject.toml",
            r#"
[project]
name = "ingest"
description = "Feed ingester"
dependencies = ["fastapi>=0.100", "pydantic==2.*"]

[project.optional-dependencies]
dev = ["pytest"]
"#,
        );
        let py = parse_pyproject_toml(&path).unwrap();
        assert_eq!(py.name, "ingest");
        assert_eq!(py.dependencies, vec!["fastapi", "pydantic", "pytest"]);
    }

    #[test]
    fn test_info_plist() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Info.plist",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Trail Tracker</string>
    <key>CFBundleIdentifier</key>
    <string>com.example.trails</string>
</dict>
</plist>"#,
        );
        let plist = parse_info_plist(&path).unwrap();
        assert_eq!(plist.name, "Trail Tracker");
        assert_eq!(plist.bundle_id, "com.example.trails");
    }

    #[test]
    fn test_info_plist_rejects_placeholders() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Info.plist",
            r#"<plist><dict>
                <key>CFBundleDisplayName</key><string>$(PRODUCT_NAME)</string>
            </dict></plist>"#,
        );
        let plist = parse_info_plist(&path).unwrap();
        assert_eq!(plist.name, "");
    }

    #[test]
    fn test_gemfile_with_rails_name() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "config/application.rb",
            "module TrailBlazer\n  class Application < Rails::Application\n  end\nend\n",
        );
        let path = write(&dir, "Gemfile", "gem 'rails'\ngem 'puma'\n");
        let gemfile = parse_gemfile(&path).unwrap();
        assert_eq!(gemfile.name, "Trail Blazer");
        assert_eq!(gemfile.dependencies, vec!["puma", "rails"]);
    }

    #[test]
    fn test_docker_compose() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "docker-compose.yml",
            r#"
services:
  api:
    build: ./api
    ports:
      - "8080:80"
  db:
    image: postgres
    ports:
      - published: 5433
        target: 5432
"#,
        );
        let compose = parse_docker_compose(&path).unwrap();
        assert_eq!(compose.services, vec!["api", "db"]);
        assert_eq!(
            compose.ports,
            vec![
                ComposePort { service: "api".to_string(), host: 8080, container: 80 },
                ComposePort { service: "db".to_string(), host: 5433, container: 5432 },
            ]
        );
    }

    #[test]
    fn test_sam_template() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "template.yaml",
            r#"
Resources:
  IngestFunction:
    Type: AWS::Serverless::Function
    Properties:
      Handler: app.handler
      Runtime: python3.12
      CodeUri: src/ingest/
  Api:
    Type: AWS::Serverless::Api
"#,
        );
        let sam = parse_sam_template(&path).unwrap();
        assert!(sam.has_api_gateway);
        assert_eq!(sam.functions.len(), 1);
        assert_eq!(sam.functions[0].name, "IngestFunction");
        assert_eq!(sam.functions[0].runtime, "python3.12");
        assert_eq!(sam.functions[0].code_uri, "src/ingest/");
    }

    #[test]
    fn test_serverless_yml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "serverless.yml",
            r#"
service: notifications
provider:
  name: aws
functions:
  sendEmail:
    handler: handler.send
  digest:
    handler: handler.digest
"#,
        );
        let sls = parse_serverless_yml(&path).unwrap();
        assert_eq!(sls.provider, "aws");
        assert_eq!(sls.functions, vec!["sendEmail", "digest"]);
    }

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_camel_case("TrailBlazer"), "Trail Blazer");
        assert_eq!(split_camel_case("API"), "API");
        assert_eq!(split_camel_case("plain"), "plain");
    }
}
