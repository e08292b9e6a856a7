//! # vbabind - VBA member-access name resolution
//!
//! Binds dotted VBA expressions such as `Project.Module.Type` to the
//! declarations they name.
//!
//! vbabind provides:
//! - An arena-backed declaration graph with project references and class
//!   supertype/subtype links
//! - A declaration finder that answers the scoped lookups binding needs
//! - The member-access type binding with its ordered resolution cascade
//! - Snapshot files (JSON/TOML) and SQLite persistence for graphs

pub mod accessibility;
pub mod attributes;
pub mod binding;
pub mod class_module;
pub mod config;
pub mod declaration;
pub mod expression;
pub mod finder;
pub mod graph;
pub mod output;
pub mod qualified_name;
pub mod snapshot;
pub mod storage;
pub mod syntax;
pub mod ui;

// Re-exports for convenient access
pub use accessibility::AccessibilityChecker;
pub use attributes::Attributes;
pub use binding::{
    resolve_chain, BindingContext, ChainResolution, ChainStep, ExpressionBinding,
    MemberAccessTypeBinding, PreboundExpression, ResolutionResult, ResolutionStats, ResolutionStep,
    RootBinding,
};
pub use class_module::{ClassModule, ClassModuleOptions};
pub use declaration::{Accessibility, Declaration, DeclarationId, DeclarationType};
pub use expression::{BoundExpression, ExpressionClassification};
pub use finder::{DeclarationFinder, EnclosingScope, GraphFinder};
pub use graph::{DeclarationGraph, GraphStats, LinkStats};
pub use qualified_name::QualifiedName;
pub use snapshot::GraphSnapshot;
pub use storage::SqliteStore;
pub use syntax::{MemberAccessContext, Production, Selection, SyntaxNode};

/// Result type alias for vbabind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vbabind operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Attribute {name} has {count} values, expected exactly one")]
    MalformedAttribute { name: String, count: usize },

    /// The graph or a bound expression broke one of its own invariants.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Declaration not found: {0}")]
    DeclarationNotFound(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
