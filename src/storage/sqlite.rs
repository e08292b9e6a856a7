//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use crate::{Error, Result};
use crate::attributes::Attributes;
use crate::class_module::ClassModuleOptions;
use crate::declaration::{Accessibility, DeclarationId, DeclarationType};
use crate::graph::DeclarationGraph;
use super::schema;

const FINGERPRINT_KEY: &str = "fingerprint";

/// Whether a saved graph differed from what was stored before
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    New,
    Modified,
    Unchanged,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::New => "new",
            SnapshotStatus::Modified => "modified",
            SnapshotStatus::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SQLite-backed storage for a declaration graph
pub struct SqliteStore {
    conn: Connection,
}

/// A `declarations` row joined with its class-module options
struct DeclarationRow {
    id: u32,
    kind: String,
    name: String,
    accessibility: String,
    parent: Option<u32>,
    built_in: bool,
    attributes: String,
    exposed: Option<bool>,
    global: Option<bool>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Fingerprint of the stored graph, if one is stored
    pub fn fingerprint(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM snapshot_meta WHERE key = ?1",
                [FINGERPRINT_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Save ==========

    /// Replace the stored graph with `graph`.
    ///
    /// Nothing is written if the stored graph has the same fingerprint.
    pub fn save_graph(&mut self, graph: &DeclarationGraph) -> Result<SnapshotStatus> {
        let fingerprint = fingerprint(graph)?;
        let previous = self.fingerprint()?;
        if previous.as_deref() == Some(fingerprint.as_str()) {
            info!("Graph unchanged ({})", &fingerprint[..12]);
            return Ok(SnapshotStatus::Unchanged);
        }

        let tx = self.conn.transaction()?;
        for table in schema::GRAPH_TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }

        {
            let mut insert_declaration = tx.prepare(
                r#"
                INSERT INTO declarations (id, kind, name, accessibility, parent, project, built_in, attributes)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            let mut insert_class = tx.prepare(
                "INSERT INTO class_modules (id, exposed, global, default_member) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_name = tx.prepare(
                "INSERT INTO supertype_names (class_id, position, name) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_supertype = tx.prepare(
                "INSERT INTO supertype_edges (class_id, supertype_id, position) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_subtype = tx.prepare(
                "INSERT INTO subtype_edges (class_id, subtype_id, position) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_reference = tx.prepare(
                "INSERT INTO project_references (project, referenced, priority) VALUES (?1, ?2, ?3)",
            )?;

            for declaration in graph.iter() {
                insert_declaration.execute(params![
                    declaration.id.0,
                    declaration.kind.as_str(),
                    declaration.name,
                    declaration.accessibility.as_str(),
                    declaration.parent.map(|parent| parent.0),
                    declaration.project.0,
                    declaration.is_built_in,
                    serde_json::to_string(&declaration.attributes)?,
                ])?;

                let Some(class_module) = declaration.as_class_module() else {
                    continue;
                };
                let options = class_module.options();
                insert_class.execute(params![
                    declaration.id.0,
                    options.exposed,
                    options.global,
                    class_module.default_member().map(|member| member.0),
                ])?;
                for (position, name) in class_module.supertype_names().iter().enumerate() {
                    insert_name.execute(params![declaration.id.0, position as i64, name])?;
                }
                for (position, supertype) in class_module.supertypes().iter().enumerate() {
                    insert_supertype.execute(params![declaration.id.0, supertype.0, position as i64])?;
                }
                for (position, subtype) in class_module.subtypes().iter().enumerate() {
                    insert_subtype.execute(params![declaration.id.0, subtype.0, position as i64])?;
                }
            }

            for project in graph.projects() {
                for (priority, referenced) in graph.referenced_projects(project.id).iter().enumerate() {
                    insert_reference.execute(params![project.id.0, referenced.0, priority as i64])?;
                }
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO snapshot_meta (key, value) VALUES (?1, ?2)",
            params![FINGERPRINT_KEY, fingerprint],
        )?;
        tx.commit()?;

        let status = if previous.is_some() { SnapshotStatus::Modified } else { SnapshotStatus::New };
        info!("Saved graph with {} declarations ({})", graph.len(), status);
        Ok(status)
    }

    // ========== Load ==========

    /// Rebuild the stored graph, or `None` if nothing was saved yet
    pub fn load_graph(&self) -> Result<Option<DeclarationGraph>> {
        if self.fingerprint()?.is_none() {
            return Ok(None);
        }

        let mut graph = DeclarationGraph::new();
        for row in self.declaration_rows()? {
            let expected = row.id;
            let id = self.add_row(&mut graph, row)?;
            if id.0 != expected {
                return Err(Error::Integrity(format!(
                    "stored declaration #{} was rebuilt as {}",
                    expected, id
                )));
            }
        }

        for (project, referenced) in self.id_pairs("SELECT project, referenced FROM project_references ORDER BY project, priority")? {
            graph.add_project_reference(project, referenced)?;
        }

        let mut stmt = self.conn.prepare("SELECT class_id, name FROM supertype_names ORDER BY class_id, position")?;
        let names = stmt
            .query_map([], |row| Ok((DeclarationId(row.get(0)?), row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (class_id, name) in names {
            graph.class_module_mut(class_id)?.add_supertype_name(name);
        }

        for (class_id, supertype) in self.id_pairs("SELECT class_id, supertype_id FROM supertype_edges ORDER BY class_id, position")? {
            graph.class_module_mut(class_id)?.add_supertype(supertype);
        }
        for (class_id, subtype) in self.id_pairs("SELECT class_id, subtype_id FROM subtype_edges ORDER BY class_id, position")? {
            graph.class_module_mut(class_id)?.add_subtype(subtype);
        }
        for (class_id, member) in self.id_pairs("SELECT id, default_member FROM class_modules WHERE default_member IS NOT NULL")? {
            graph.class_module_mut(class_id)?.set_default_member(Some(member));
        }

        debug!("Loaded graph with {} declarations", graph.len());
        Ok(Some(graph))
    }

    fn declaration_rows(&self) -> Result<Vec<DeclarationRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT d.id, d.kind, d.name, d.accessibility, d.parent, d.built_in, d.attributes, c.exposed, c.global
            FROM declarations d LEFT JOIN class_modules c ON c.id = d.id
            ORDER BY d.id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DeclarationRow {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    name: row.get(2)?,
                    accessibility: row.get(3)?,
                    parent: row.get(4)?,
                    built_in: row.get(5)?,
                    attributes: row.get(6)?,
                    exposed: row.get(7)?,
                    global: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn add_row(&self, graph: &mut DeclarationGraph, row: DeclarationRow) -> Result<DeclarationId> {
        let kind: DeclarationType = row.kind.parse()?;
        let accessibility: Accessibility = row.accessibility.parse()?;
        let attributes: Attributes = serde_json::from_str(&row.attributes)?;

        let Some(parent) = row.parent.map(DeclarationId) else {
            if kind != DeclarationType::Project {
                return Err(Error::Integrity(format!("stored {} '{}' has no parent", kind, row.name)));
            }
            return Ok(graph.add_project(row.name, row.built_in));
        };

        match kind {
            DeclarationType::ProceduralModule => {
                graph.add_procedural_module(parent, row.name, accessibility, attributes)
            }
            DeclarationType::ClassModule => {
                let options = ClassModuleOptions {
                    exposed: row.exposed.unwrap_or(false),
                    global: row.global.unwrap_or(false),
                };
                graph.add_class_module(parent, row.name, attributes, options)
            }
            _ => graph.add_member(parent, row.name, kind, accessibility, attributes),
        }
    }

    fn id_pairs(&self, sql: &str) -> Result<Vec<(DeclarationId, DeclarationId)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let pairs = stmt
            .query_map([], |row| Ok((DeclarationId(row.get(0)?), DeclarationId(row.get(1)?))))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pairs)
    }

    // ========== Maintenance ==========

    /// Remove the stored graph
    pub fn clear_all(&self) -> Result<()> {
        for table in schema::GRAPH_TABLES {
            self.conn.execute(&format!("DELETE FROM {}", table), [])?;
        }
        self.conn.execute("DELETE FROM snapshot_meta", [])?;
        Ok(())
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            declarations: self.count("declarations")?,
            class_modules: self.count("class_modules")?,
            project_references: self.count("project_references")?,
            supertype_edges: self.count("supertype_edges")?,
            fingerprint: self.fingerprint()?,
        })
    }
}

/// Content hash of a graph: its snapshot plus the resolved class relations
fn fingerprint(graph: &DeclarationGraph) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(graph.to_snapshot().to_canonical_json()?.as_bytes());
    for declaration in graph.iter() {
        let Some(class_module) = declaration.as_class_module() else {
            continue;
        };
        hasher.update(&declaration.id.0.to_le_bytes());
        for related in [class_module.supertypes(), class_module.subtypes()] {
            hasher.update(&(related.len() as u32).to_le_bytes());
            for id in related {
                hasher.update(&id.0.to_le_bytes());
            }
        }
        let default_member = class_module.default_member().map_or(u32::MAX, |member| member.0);
        hasher.update(&default_member.to_le_bytes());
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub declarations: usize,
    pub class_modules: usize,
    pub project_references: usize,
    pub supertype_edges: usize,
    pub fingerprint: Option<String>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Declarations: {}", self.declarations)?;
        writeln!(f, "  Class modules: {}", self.class_modules)?;
        writeln!(f, "  Project references: {}", self.project_references)?;
        writeln!(f, "  Supertype edges: {}", self.supertype_edges)?;
        match &self.fingerprint {
            Some(fingerprint) => writeln!(f, "  Fingerprint: {}", fingerprint),
            None => writeln!(f, "  Fingerprint: (empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::VB_EXPOSED;
    use tempfile::TempDir;

    fn sample_graph() -> DeclarationGraph {
        let mut graph = DeclarationGraph::new();
        let project = graph.add_project("VBAProject", false);
        let library = graph.add_project("Lib", true);
        graph.add_project_reference(project, library).unwrap();
        let module = graph
            .add_procedural_module(project, "Module1", Accessibility::Private, Attributes::new())
            .unwrap();
        graph
            .add_member(module, "Point", DeclarationType::UserDefinedType, Accessibility::Public, Attributes::new())
            .unwrap();
        let shape = graph
            .add_class_module(library, "IShape", Attributes::new().with(VB_EXPOSED, "True"), ClassModuleOptions::default())
            .unwrap();
        let circle = graph
            .add_class_module(project, "Circle", Attributes::new(), ClassModuleOptions { exposed: false, global: true })
            .unwrap();
        graph.class_module_mut(circle).unwrap().add_supertype_name("IShape");
        graph.link_supertypes();
        graph
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_graph().unwrap().is_none());

        let graph = sample_graph();
        assert_eq!(store.save_graph(&graph).unwrap(), SnapshotStatus::New);

        let loaded = store.load_graph().unwrap().unwrap();
        assert_eq!(loaded.to_snapshot(), graph.to_snapshot());
        assert_eq!(loaded.len(), graph.len());

        let project = loaded.project_by_name("VBAProject").unwrap();
        let circle = loaded.modules(project.id).find(|m| m.is_named("Circle")).unwrap();
        let class_module = circle.as_class_module().unwrap();
        assert!(class_module.is_global_class_module());
        assert_eq!(class_module.supertypes().len(), 1);
        assert_eq!(loaded.class_module(class_module.supertypes()[0]).unwrap().subtypes(), &[circle.id]);
    }

    #[test]
    fn test_one_sided_edges_survive() {
        let mut graph = sample_graph();
        let project = graph.project_by_name("VBAProject").unwrap().id;
        let a = graph
            .add_class_module(project, "A", Attributes::new(), ClassModuleOptions::default())
            .unwrap();
        let b = graph
            .add_class_module(project, "B", Attributes::new(), ClassModuleOptions::default())
            .unwrap();
        graph.class_module_mut(a).unwrap().add_supertype(b);

        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_graph(&graph).unwrap();
        let loaded = store.load_graph().unwrap().unwrap();

        assert_eq!(loaded.class_module(a).unwrap().supertypes(), &[b]);
        assert!(loaded.class_module(b).unwrap().subtypes().is_empty());
    }

    #[test]
    fn test_snapshot_status() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut graph = sample_graph();

        assert_eq!(store.save_graph(&graph).unwrap(), SnapshotStatus::New);
        assert_eq!(store.save_graph(&graph).unwrap(), SnapshotStatus::Unchanged);

        let project = graph.project_by_name("VBAProject").unwrap().id;
        graph
            .add_procedural_module(project, "Module2", Accessibility::Public, Attributes::new())
            .unwrap();
        assert_eq!(store.save_graph(&graph).unwrap(), SnapshotStatus::Modified);
        assert_eq!(store.stats().unwrap().declarations, graph.len());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vbabind.db");
        let graph = sample_graph();

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_graph(&graph).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.declarations, graph.len());
        assert_eq!(stats.class_modules, 2);
        assert_eq!(stats.project_references, 1);
        assert_eq!(stats.supertype_edges, 1);
        assert!(stats.fingerprint.is_some());

        store.clear_all().unwrap();
        assert!(store.load_graph().unwrap().is_none());
    }
}
