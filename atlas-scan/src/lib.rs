//! Static architecture extraction for polyglot repositories.
//!
//! The pipeline walks a repository, finds component boundaries from marker
//! files, extracts symbols and imports per language with regex heuristics,
//! promotes components to architectural roles, detects cross-component
//! relationships, and assembles everything into a single
//! [`atlas_model::Architecture`] document. [`Scanner`] drives one
//! repository; [`Orchestrator`] merges several.

pub mod extract;
pub mod filters;
pub mod manifest;
pub mod orchestrator;
pub mod scanner;

mod classify;
mod docs;
mod relationships;
mod util;

pub use orchestrator::{Orchestrator, OrchestratorError, SolutionConfig};
pub use scanner::{ScanError, ScanOptions, Scanner};
