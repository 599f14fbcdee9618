//! Role promotion: content detection and the architectural-role ladder.
//!
//! Promotion runs once per component, after file scanning. Content detection
//! is checked first and is final. The role ladder is strictly ordered; the
//! first rule that matches decides the role, so more specific signals
//! (watch app, mobile clients) must stay above the broader server and web
//! checks.

use crate::filters::{
    extension_of, is_content_dir_name, is_content_extension, is_utility_dir_name,
    language_for_extension,
};
use crate::manifest;
use crate::util::{read_lossy, slash_basename};
use atlas_model::{Component, ComponentType};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// Below this code-file fraction, a content-named directory counts as
/// content.
const CONTENT_CODE_FRACTION: f64 = 0.2;

/// Above this content-file fraction, any directory counts as content.
const CONTENT_FILE_FRACTION: f64 = 0.8;

const SERVER_FRAMEWORKS: &[&str] = &[
    "axum", "actix", "rocket", "warp", "vapor", "express", "fastify", "hono", "koa", "nestjs",
    "flask", "django", "fastapi", "starlette", "aiohttp", "tornado", "gin", "echo", "fiber",
    "rails", "sinatra", "grape", "hanami",
];

const PURE_SERVER_JS_DEPS: &[&str] = &["express", "fastify", "hono", "koa", "@nestjs/core"];
const CLIENT_JS_DEPS: &[&str] = &["react", "vue", "svelte", "@angular/core"];
const WEB_CLIENT_FRAMEWORKS: &[&str] =
    &["react", "next.js", "vue", "nuxt", "svelte", "sveltekit", "angular"];
const WEB_CLIENT_JS_DEPS: &[&str] = &[
    "react", "vue", "svelte", "@angular/core", "next", "nuxt", "@sveltejs/kit",
];
const RUST_SERVER_DEPS: &[&str] = &["axum", "actix-web", "rocket", "warp"];
const RUBY_SERVER_GEMS: &[&str] = &["rails", "sinatra", "grape", "hanami", "roda"];
const SERVER_LANGUAGES: &[&str] = &["python", "rust", "go", "ruby", "typescript", "javascript"];

static SERVER_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|/)(?:.*server.*|.*gateway.*|.*daemon.*)\.py$").unwrap()
});

/// Python modules whose import marks a file as a standalone server script.
const PYTHON_SERVER_IMPORTS: &[&str] = &[
    "http.server",
    "aiohttp",
    "flask",
    "fastapi",
    "tornado",
    "uvicorn",
    "gunicorn",
    "starlette",
    "socketserver",
];

/// True when a directory holds content rather than architecture: either it
/// carries a content vocabulary name with almost no code in it, or content
/// files dominate outright.
pub(crate) fn is_content_only(comp: &Component, rel_path: &str) -> bool {
    let dir_name = slash_basename(rel_path).to_lowercase();

    if is_content_dir_name(&dir_name) {
        let code_files = comp
            .files
            .iter()
            .filter(|f| {
                extension_of(f).as_deref().is_some_and(|ext| {
                    language_for_extension(ext).is_some() && !is_content_extension(ext)
                })
            })
            .count();
        let total = comp.files.len();
        if total == 0 || (code_files as f64 / total as f64) < CONTENT_CODE_FRACTION {
            return true;
        }
    }

    if !comp.files.is_empty() {
        let content_count = comp
            .files
            .iter()
            .filter(|f| extension_of(f).as_deref().is_some_and(is_content_extension))
            .count();
        if content_count as f64 / comp.files.len() as f64 > CONTENT_FILE_FRACTION {
            return true;
        }
    }

    false
}

fn dir_has_extension(dir: &Path, ext: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|e| {
        e.path().is_dir() && e.path().extension().is_some_and(|x| x == ext)
    })
}

fn dep_set(deps: &[String]) -> HashSet<&str> {
    deps.iter().map(|d| d.as_str()).collect()
}

fn intersects(deps: &HashSet<&str>, wanted: &[&str]) -> bool {
    wanted.iter().any(|w| deps.contains(w))
}

/// Walk the role ladder for one component. `None` means the generic type
/// stands.
pub(crate) fn architectural_role(
    root: &Path,
    comp: &Component,
    rel_path: &str,
) -> Option<ComponentType> {
    let framework = comp.framework.as_deref().unwrap_or("").to_lowercase();
    let comp_dir = if rel_path.is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel_path)
    };
    let dir_name = slash_basename(rel_path).to_lowercase();
    let language = comp.language.as_deref().unwrap_or("");

    let has_info_plist = comp_dir.join("Info.plist").exists();
    let mut has_xcodeproj = dir_has_extension(&comp_dir, "xcodeproj");
    // Common iOS layout keeps the .xcodeproj beside the source root.
    if !has_xcodeproj && language == "swift" {
        has_xcodeproj = dir_has_extension(root, "xcodeproj");
    }
    let has_android_manifest = comp_dir.join("AndroidManifest.xml").exists()
        || comp_dir.join("src/main/AndroidManifest.xml").exists();
    let has_build_gradle =
        comp_dir.join("build.gradle").exists() || comp_dir.join("build.gradle.kts").exists();

    let pkg = manifest::parse_package_json(&comp_dir.join("package.json"));
    let pkg_deps = pkg.as_ref().map(|p| dep_set(&p.dependencies)).unwrap_or_default();
    let cargo = manifest::parse_cargo_toml(&comp_dir.join("Cargo.toml"));
    let cargo_deps = cargo.as_ref().map(|c| dep_set(&c.dependencies)).unwrap_or_default();

    // Watch app.
    if dir_name.contains("watch")
        && (language == "swift" || matches!(framework.as_str(), "swiftui" | "watchkit"))
    {
        return Some(ComponentType::WatchApp);
    }

    // iOS client.
    if matches!(framework.as_str(), "swiftui" | "uikit")
        && (has_info_plist || has_xcodeproj || comp.component_type == ComponentType::Application)
    {
        return Some(ComponentType::IosClient);
    }

    // Android client.
    if has_android_manifest {
        return Some(ComponentType::AndroidClient);
    }
    if has_build_gradle
        && matches!(language, "java" | "kotlin")
        && (has_android_manifest || dir_name.contains("android"))
    {
        return Some(ComponentType::AndroidClient);
    }

    // Cross-platform mobile: React Native, Flutter.
    if pkg_deps.contains("react-native") {
        return Some(ComponentType::MobileClient);
    }
    let pubspec = comp_dir.join("pubspec.yaml");
    if pubspec.exists() {
        if let Ok(content) = read_lossy(&pubspec) {
            if content.contains("flutter:") {
                return Some(ComponentType::MobileClient);
            }
        }
    }

    // Desktop app.
    if matches!(framework.as_str(), "appkit" | "electron") || pkg_deps.contains("electron") {
        return Some(ComponentType::DesktopApp);
    }

    // API server, by framework.
    if SERVER_FRAMEWORKS.contains(&framework.as_str()) {
        return Some(ComponentType::ApiServer);
    }

    // API server, by JS deps: a pure server stack with no client framework.
    if intersects(&pkg_deps, PURE_SERVER_JS_DEPS) && !intersects(&pkg_deps, CLIENT_JS_DEPS) {
        return Some(ComponentType::ApiServer);
    }

    // API server, by Rust deps.
    if intersects(&cargo_deps, RUST_SERVER_DEPS) {
        return Some(ComponentType::ApiServer);
    }

    // API server, by Ruby gems.
    if let Some(gemfile) = manifest::parse_gemfile(&comp_dir.join("Gemfile")) {
        if intersects(&dep_set(&gemfile.dependencies), RUBY_SERVER_GEMS) {
            return Some(ComponentType::ApiServer);
        }
    }

    // Standalone server scripts (log_server.py, gateway.py) count as a
    // service even inside directories the port heuristic below excludes.
    if language == "python" || (language.is_empty() && !comp.files.is_empty()) {
        for fpath in &comp.files {
            if !SERVER_SCRIPT_RE.is_match(fpath) {
                continue;
            }
            if let Ok(content) = read_lossy(&root.join(fpath)) {
                for module in PYTHON_SERVER_IMPORTS {
                    if content.contains(&format!("import {module}"))
                        || content.contains(&format!("from {module}"))
                    {
                        return Some(ComponentType::Service);
                    }
                }
            }
        }
    }

    // API server, weak port signal: server language, no client deps, and not
    // a utility directory. Mobile languages reference ports as clients.
    if comp.port.is_some()
        && SERVER_LANGUAGES.contains(&language)
        && !intersects(&pkg_deps, CLIENT_JS_DEPS)
        && !is_utility_dir_name(&dir_name)
    {
        return Some(ComponentType::ApiServer);
    }

    // Web client.
    if WEB_CLIENT_FRAMEWORKS.contains(&framework.as_str())
        || intersects(&pkg_deps, WEB_CLIENT_JS_DEPS)
    {
        return Some(ComponentType::WebClient);
    }

    // CLI tool.
    if language == "python" && matches!(framework.as_str(), "click" | "typer") {
        return Some(ComponentType::CliTool);
    }
    if cargo_deps.contains("clap") && !intersects(&cargo_deps, RUST_SERVER_DEPS) {
        return Some(ComponentType::CliTool);
    }

    None
}

/// A better name for a component still carrying its folder name, using
/// language conventions (Rails module names, pyproject metadata).
pub(crate) fn improved_name(root: &Path, comp: &Component, rel_path: &str) -> Option<String> {
    let comp_dir = root.join(rel_path);
    let framework = comp.framework.as_deref().unwrap_or("").to_lowercase();

    if comp.language.as_deref() == Some("ruby")
        || matches!(framework.as_str(), "rails" | "sinatra" | "grape")
    {
        let name = manifest::ruby_app_name(&comp_dir);
        if !name.is_empty() {
            return Some(name);
        }
    }

    if comp.language.as_deref() == Some("python") {
        if let Some(info) = manifest::parse_pyproject_toml(&comp_dir.join("pyproject.toml")) {
            if !info.name.is_empty() {
                return Some(info.name);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_model::ComponentType;
    use std::fs;
    use tempfile::TempDir;

    fn component(path: &str, comp_type: ComponentType) -> Component {
        Component::new(path, slash_basename(path), comp_type, path)
    }

    #[test]
    fn test_content_dir_with_no_code() {
        let mut comp = component("docs", ComponentType::Module);
        comp.files = vec![
            "docs/intro.md".to_string(),
            "docs/setup.md".to_string(),
            "docs/faq.md".to_string(),
        ];
        assert!(is_content_only(&comp, "docs"));
    }

    #[test]
    fn test_content_dir_with_real_code_survives() {
        let mut comp = component("examples", ComponentType::Module);
        comp.files = vec![
            "examples/demo.py".to_string(),
            "examples/demo2.py".to_string(),
            "examples/readme.md".to_string(),
        ];
        assert!(!is_content_only(&comp, "examples"));
    }

    #[test]
    fn test_mostly_content_files_anywhere() {
        let mut comp = component("notes", ComponentType::Module);
        comp.files = vec![
            "notes/a.md".to_string(),
            "notes/b.md".to_string(),
            "notes/c.md".to_string(),
            "notes/d.md".to_string(),
            "notes/e.md".to_string(),
            "notes/run.py".to_string(),
        ];
        assert!(is_content_only(&comp, "notes"));
    }

    #[test]
    fn test_server_framework_promotes_api_server() {
        let dir = TempDir::new().unwrap();
        let mut comp = component("backend", ComponentType::Package);
        comp.framework = Some("FastAPI".to_string());
        comp.language = Some("python".to_string());
        assert_eq!(
            architectural_role(dir.path(), &comp, "backend"),
            Some(ComponentType::ApiServer)
        );
    }

    #[test]
    fn test_react_deps_promote_web_client() {
        let dir = TempDir::new().unwrap();
        let web = dir.path().join("web");
        fs::create_dir_all(&web).unwrap();
        fs::write(
            web.join("package.json"),
            r#"{"name": "web", "dependencies": {"react": "^18"}}"#,
        )
        .unwrap();

        let mut comp = component("web", ComponentType::Package);
        comp.language = Some("typescript".to_string());
        assert_eq!(
            architectural_role(dir.path(), &comp, "web"),
            Some(ComponentType::WebClient)
        );
    }

    #[test]
    fn test_express_without_client_deps_is_api_server() {
        let dir = TempDir::new().unwrap();
        let api = dir.path().join("api");
        fs::create_dir_all(&api).unwrap();
        fs::write(
            api.join("package.json"),
            r#"{"name": "api", "dependencies": {"express": "^4"}}"#,
        )
        .unwrap();

        let comp = component("api", ComponentType::Package);
        assert_eq!(
            architectural_role(dir.path(), &comp, "api"),
            Some(ComponentType::ApiServer)
        );
    }

    #[test]
    fn test_clap_without_server_deps_is_cli_tool() {
        let dir = TempDir::new().unwrap();
        let cli = dir.path().join("cli");
        fs::create_dir_all(&cli).unwrap();
        fs::write(
            cli.join("Cargo.toml"),
            "[package]\nname = \"cli\"\n\n[dependencies]\nclap = \"4\"\n",
        )
        .unwrap();

        let mut comp = component("cli", ComponentType::Package);
        comp.language = Some("rust".to_string());
        assert_eq!(
            architectural_role(dir.path(), &comp, "cli"),
            Some(ComponentType::CliTool)
        );
    }

    #[test]
    fn test_axum_beats_clap() {
        let dir = TempDir::new().unwrap();
        let svc = dir.path().join("svc");
        fs::create_dir_all(&svc).unwrap();
        fs::write(
            svc.join("Cargo.toml"),
            "[package]\nname = \"svc\"\n\n[dependencies]\naxum = \"0.7\"\nclap = \"4\"\n",
        )
        .unwrap();

        let mut comp = component("svc", ComponentType::Package);
        comp.language = Some("rust".to_string());
        assert_eq!(
            architectural_role(dir.path(), &comp, "svc"),
            Some(ComponentType::ApiServer)
        );
    }

    #[test]
    fn test_port_in_utility_dir_is_not_a_server() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();

        let mut comp = component("scripts", ComponentType::Module);
        comp.language = Some("python".to_string());
        comp.port = Some(8080);
        assert_eq!(architectural_role(dir.path(), &comp, "scripts"), None);
    }

    #[test]
    fn test_standalone_server_script_promotes_service() {
        let dir = TempDir::new().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(
            scripts.join("log_server.py"),
            "import http.server\n\nserver = http.server.HTTPServer\n",
        )
        .unwrap();

        let mut comp = component("scripts", ComponentType::Module);
        comp.language = Some("python".to_string());
        comp.files = vec!["scripts/log_server.py".to_string()];
        assert_eq!(
            architectural_role(dir.path(), &comp, "scripts"),
            Some(ComponentType::Service)
        );
    }

    #[test]
    fn test_watch_dir_promotes_watch_app() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("TrailWatch Watch App")).unwrap();

        let mut comp = component("TrailWatch Watch App", ComponentType::Module);
        comp.language = Some("swift".to_string());
        assert_eq!(
            architectural_role(dir.path(), &comp, "TrailWatch Watch App"),
            Some(ComponentType::WatchApp)
        );
    }

    #[test]
    fn test_generic_module_stays_generic() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();

        let mut comp = component("core", ComponentType::Module);
        comp.language = Some("rust".to_string());
        assert_eq!(architectural_role(dir.path(), &comp, "core"), None);
    }
}
