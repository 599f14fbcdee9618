//! Data model for Atlas architecture documents.
//!
//! This crate defines the entity records that the scanner populates and the
//! viewer consumes:
//!
//! - [`Component`]: a node in the architecture graph (package, service,
//!   module, application, or a promoted architectural role)
//! - [`FileInfo`]: one scanned source file with its imports and symbol ids
//! - [`Symbol`]: a heuristically detected declaration
//! - [`Relationship`]: a directed, typed edge between two components
//! - [`Architecture`]: the whole-scan result document
//!
//! Everything here is plain serde-serializable data. The scanner owns all
//! mutation; once an [`Architecture`] is assembled it is write-once.

pub mod architecture;
pub mod component;
pub mod file;
pub mod relationship;
pub mod symbol;

pub use architecture::{Architecture, RepositoryRef, ScanStats, ANALYZER_VERSION};
pub use component::{
    ApiEndpoint, Component, ComponentDoc, ComponentMetrics, ComponentType, ConfigFile,
};
pub use file::FileInfo;
pub use relationship::{Relationship, RelationshipType};
pub use symbol::{Symbol, Visibility};
