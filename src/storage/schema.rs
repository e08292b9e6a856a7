//! Database schema definitions

/// SQL to create the declarations table.
/// Rows are written in arena order, so parents precede children.
pub const CREATE_DECLARATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS declarations (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    accessibility TEXT NOT NULL,
    parent INTEGER,
    project INTEGER NOT NULL,
    built_in INTEGER NOT NULL DEFAULT 0,
    attributes TEXT NOT NULL DEFAULT '{}'
)
"#;

/// SQL to create the class_modules table
pub const CREATE_CLASS_MODULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS class_modules (
    id INTEGER PRIMARY KEY,
    exposed INTEGER NOT NULL DEFAULT 0,
    global INTEGER NOT NULL DEFAULT 0,
    default_member INTEGER
)
"#;

/// SQL to create the project_references table
pub const CREATE_PROJECT_REFERENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_references (
    project INTEGER NOT NULL,
    referenced INTEGER NOT NULL,
    priority INTEGER NOT NULL,
    PRIMARY KEY(project, referenced)
)
"#;

/// SQL to create the supertype_names table (`Implements` names as written)
pub const CREATE_SUPERTYPE_NAMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS supertype_names (
    class_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY(class_id, position)
)
"#;

/// SQL to create the supertype_edges table.
/// Each half of an edge is stored on its own, as it is kept in memory.
pub const CREATE_SUPERTYPE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS supertype_edges (
    class_id INTEGER NOT NULL,
    supertype_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY(class_id, supertype_id)
)
"#;

/// SQL to create the subtype_edges table
pub const CREATE_SUBTYPE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS subtype_edges (
    class_id INTEGER NOT NULL,
    subtype_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY(class_id, subtype_id)
)
"#;

/// SQL to create the snapshot_meta table
pub const CREATE_SNAPSHOT_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_declarations_name ON declarations(name COLLATE NOCASE)",
    "CREATE INDEX IF NOT EXISTS idx_declarations_parent ON declarations(parent)",
    "CREATE INDEX IF NOT EXISTS idx_declarations_kind ON declarations(kind)",
];

/// Tables holding graph data, cleared before a snapshot is replaced
pub const GRAPH_TABLES: &[&str] = &[
    "declarations",
    "class_modules",
    "project_references",
    "supertype_names",
    "supertype_edges",
    "subtype_edges",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_DECLARATIONS_TABLE,
        CREATE_CLASS_MODULES_TABLE,
        CREATE_PROJECT_REFERENCES_TABLE,
        CREATE_SUPERTYPE_NAMES_TABLE,
        CREATE_SUPERTYPE_EDGES_TABLE,
        CREATE_SUBTYPE_EDGES_TABLE,
        CREATE_SNAPSHOT_META_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
