//! Storage Layer - SQLite-backed persistence of declaration graphs
//!
//! One graph snapshot is stored at a time, in tables:
//! - declarations(id, kind, name, accessibility, parent, project, built_in, attributes)
//! - class_modules(id, exposed, global, default_member)
//! - project_references(project, referenced, priority)
//! - supertype_names / supertype_edges / subtype_edges
//! - snapshot_meta(key, value)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SnapshotStatus, SqliteStore, StoreStats};
