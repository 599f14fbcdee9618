//! Walk filters and language classification tables.
//!
//! These tables drive every traversal in the scanner: which directories are
//! pruned before descent, which extensions are never read, and how file
//! extensions map to languages. They are fixed sets; there is no
//! configuration surface for them.

/// File extensions that are never read (binaries, media, archives, locks).
const SKIP_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "mp3", "mp4", "wav", "ogg", "webm",
    "mov", "zip", "tar", "gz", "bz2", "xz", "rar", "pdf", "doc", "docx", "xls", "xlsx", "woff",
    "woff2", "ttf", "eot", "otf", "lock", "sum", "resolved", "pyc", "pyo", "class", "o", "a", "so",
    "dylib", "bin", "dat", "db", "sqlite", "sqlite3", "gguf", "mlmodel", "mlmodelc", "mlpackage",
    "xcworkspace",
];

/// Extensions considered non-code content (docs, data, config markup).
const CONTENT_EXTENSIONS: &[&str] = &[
    "md", "mdx", "txt", "rst", "json", "yaml", "yml", "csv", "tsv", "xml",
];

/// Directory names that suggest content-only (non-architectural) directories.
const CONTENT_DIR_NAMES: &[&str] = &[
    "wiki",
    "wiki-content",
    "docs",
    "doc",
    "documentation",
    "curriculum",
    "prompts",
    "prompt-templates",
    "assets",
    "resources",
    "fixtures",
    "samples",
    "examples",
    "models",
    "data",
    "migrations",
];

/// Directory names that hold build/deploy scripts rather than services.
const UTILITY_DIR_NAMES: &[&str] = &[
    "scripts", "bin", "tools", "utils", "ci", "build", "devops", "deploy",
];

/// Checks if a directory should be pruned before descent.
///
/// Skips version control, dependency caches, build output, and editor
/// metadata. Hidden directories are skipped separately by the walkers.
pub fn is_skipped_dir(name: &str) -> bool {
    matches!(
        name,
        // Version control
        ".git"
            // JavaScript/Node.js
            | "node_modules"
            | "dist"
            | ".next"
            | ".nuxt"
            | ".output"
            | ".vercel"
            | ".turbo"
            | ".sass-cache"
            | "coverage"
            // Python
            | "__pycache__"
            | ".mypy_cache"
            | ".pytest_cache"
            | ".ruff_cache"
            | "venv"
            | ".venv"
            | "env"
            | ".tox"
            | "egg-info"
            | ".eggs"
            // Rust
            | "target"
            // Swift / Xcode
            | ".build"
            | "DerivedData"
            | "Pods"
            | ".swiftpm"
            // JVM
            | ".gradle"
            // General
            | "build"
            | "vendor"
            | ".idea"
            | ".vscode"
            | ".cache"
    )
}

/// True if this extension (lower-case, no dot) is in the binary/lock skip set.
pub fn is_skipped_extension(ext: &str) -> bool {
    SKIP_EXTENSIONS.contains(&ext)
}

/// True if this extension counts as content rather than code.
pub fn is_content_extension(ext: &str) -> bool {
    CONTENT_EXTENSIONS.contains(&ext)
}

/// True if this directory basename belongs to the content vocabulary.
pub fn is_content_dir_name(name: &str) -> bool {
    CONTENT_DIR_NAMES.contains(&name)
}

/// True if this directory basename belongs to the utility vocabulary
/// (scripts, bin, tools, ...), which the weak api-server heuristic excludes.
pub fn is_utility_dir_name(name: &str) -> bool {
    UTILITY_DIR_NAMES.contains(&name)
}

/// Map a file extension (lower-case, no dot) to its language tag.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        "swift" => "swift",
        "py" => "python",
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "rb" => "ruby",
        "cpp" | "hpp" => "cpp",
        "c" | "h" => "c",
        "cs" => "csharp",
        "dart" => "dart",
        "vue" => "vue",
        "svelte" => "svelte",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "shell",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "md" | "mdx" => "markdown",
        _ => return None,
    };
    Some(lang)
}

/// Languages considered actual code, for port detection and relationship
/// scanning. Markup/config/content languages can contain port-like numbers
/// and are excluded.
pub fn is_code_language(lang: &str) -> bool {
    matches!(
        lang,
        "swift"
            | "python"
            | "rust"
            | "typescript"
            | "javascript"
            | "go"
            | "java"
            | "kotlin"
            | "ruby"
            | "cpp"
            | "c"
            | "csharp"
            | "dart"
            | "vue"
            | "svelte"
            | "shell"
    )
}

/// Lower-case extension of a path-like string, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        // Dotfiles like ".gitignore" have no extension.
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
