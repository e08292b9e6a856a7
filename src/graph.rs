//! Declaration Graph - the symbol table the binder resolves against
//!
//! All declarations live in one arena and refer to each other through
//! `DeclarationId` handles: containment (project → module → member),
//! project references, and the supertype/subtype relation between class
//! modules. The graph is filled by a construction phase and treated as
//! frozen while binding runs; a re-parse builds a new graph.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::attributes::Attributes;
use crate::class_module::{ClassModule, ClassModuleOptions};
use crate::declaration::{Accessibility, Declaration, DeclarationId, DeclarationType};
use crate::qualified_name::QualifiedName;
use crate::{Error, Result};

/// Arena of declarations plus lookup indexes.
#[derive(Debug, Default, Clone)]
pub struct DeclarationGraph {
    /// All declarations, indexed by `DeclarationId`
    declarations: Vec<Declaration>,
    /// Direct children of each declaration, in insertion order
    children: Vec<Vec<DeclarationId>>,
    /// Declarations indexed by lowercase identifier
    by_name: HashMap<String, Vec<DeclarationId>>,
    /// Project declarations in insertion order
    projects: Vec<DeclarationId>,
    /// Project → referenced projects, in reference priority order
    references: HashMap<DeclarationId, Vec<DeclarationId>>,
}

impl DeclarationGraph {
    /// Create a new empty declaration graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project (or type library) declaration
    pub fn add_project(&mut self, name: impl Into<String>, is_built_in: bool) -> DeclarationId {
        let name = name.into();
        let id = self.next_id();
        let declaration = Declaration {
            id,
            kind: DeclarationType::Project,
            qualified_name: QualifiedName::project(name.clone()),
            name,
            accessibility: Accessibility::Public,
            parent: None,
            project: id,
            module: None,
            attributes: Attributes::new(),
            is_built_in,
            class_module: None,
        };
        self.projects.push(id);
        self.insert(declaration)
    }

    /// Make `referenced` visible from `project`.
    ///
    /// References are kept in the order they are added, which is the
    /// priority order used when several referenced projects could match.
    pub fn add_project_reference(
        &mut self,
        project: DeclarationId,
        referenced: DeclarationId,
    ) -> Result<()> {
        self.expect_kind(project, DeclarationType::Project)?;
        self.expect_kind(referenced, DeclarationType::Project)?;
        if project == referenced {
            return Err(Error::Integrity(format!(
                "project {} cannot reference itself",
                self.declarations[project.index()].name
            )));
        }

        let references = self.references.entry(project).or_default();
        if !references.contains(&referenced) {
            references.push(referenced);
        }
        Ok(())
    }

    /// Add a procedural (standard) module to a project.
    ///
    /// `Accessibility::Private` models `Option Private Module`.
    pub fn add_procedural_module(
        &mut self,
        project: DeclarationId,
        name: impl Into<String>,
        accessibility: Accessibility,
        attributes: Attributes,
    ) -> Result<DeclarationId> {
        self.add_child(
            project,
            name.into(),
            DeclarationType::ProceduralModule,
            accessibility,
            attributes,
            None,
        )
    }

    /// Add a class module to a project.
    ///
    /// The class-module facts are computed here, so malformed
    /// `VB_Exposed` / `VB_GlobalNamespace` / `VB_PredeclaredId` attributes
    /// reject the declaration.
    pub fn add_class_module(
        &mut self,
        project: DeclarationId,
        name: impl Into<String>,
        attributes: Attributes,
        options: ClassModuleOptions,
    ) -> Result<DeclarationId> {
        let class_module = ClassModule::new(&attributes, options)?;
        self.add_child(
            project,
            name.into(),
            DeclarationType::ClassModule,
            Accessibility::Public,
            attributes,
            Some(class_module),
        )
    }

    /// Add a declaration below a module, type or member
    pub fn add_member(
        &mut self,
        parent: DeclarationId,
        name: impl Into<String>,
        kind: DeclarationType,
        accessibility: Accessibility,
        attributes: Attributes,
    ) -> Result<DeclarationId> {
        if kind == DeclarationType::Project || kind.is_module() {
            return Err(Error::Integrity(format!(
                "{} declarations are not members",
                kind
            )));
        }
        self.add_child(parent, name.into(), kind, accessibility, attributes, None)
    }

    fn add_child(
        &mut self,
        parent: DeclarationId,
        name: String,
        kind: DeclarationType,
        accessibility: Accessibility,
        attributes: Attributes,
        class_module: Option<ClassModule>,
    ) -> Result<DeclarationId> {
        let parent_declaration = self.get(parent).ok_or_else(|| {
            Error::Integrity(format!("parent {} of '{}' does not exist", parent, name))
        })?;
        if !kind.can_be_child_of(parent_declaration.kind) {
            return Err(Error::Integrity(format!(
                "{} '{}' cannot be declared in {} {}",
                kind, name, parent_declaration.kind, parent_declaration.qualified_name
            )));
        }

        let id = self.next_id();
        let declaration = Declaration {
            id,
            kind,
            qualified_name: parent_declaration.qualified_name.child(name.clone()),
            name,
            accessibility,
            parent: Some(parent),
            project: parent_declaration.project,
            module: if kind.is_module() { Some(id) } else { parent_declaration.module },
            attributes,
            is_built_in: parent_declaration.is_built_in,
            class_module,
        };
        self.children[parent.index()].push(id);
        Ok(self.insert(declaration))
    }

    fn next_id(&self) -> DeclarationId {
        DeclarationId(self.declarations.len() as u32)
    }

    fn insert(&mut self, declaration: Declaration) -> DeclarationId {
        let id = declaration.id;
        self.by_name
            .entry(declaration.name.to_ascii_lowercase())
            .or_default()
            .push(id);
        self.declarations.push(declaration);
        self.children.push(Vec::new());
        id
    }

    fn expect_kind(&self, id: DeclarationId, kind: DeclarationType) -> Result<&Declaration> {
        let declaration = self.declaration(id)?;
        if declaration.kind != kind {
            return Err(Error::Integrity(format!(
                "{} is a {}, expected a {}",
                declaration.qualified_name, declaration.kind, kind
            )));
        }
        Ok(declaration)
    }

    /// Get a declaration by handle
    pub fn get(&self, id: DeclarationId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    /// Get a declaration by handle, failing on a dangling handle
    pub fn declaration(&self, id: DeclarationId) -> Result<&Declaration> {
        self.get(id)
            .ok_or_else(|| Error::DeclarationNotFound(id.to_string()))
    }

    /// Direct children of a declaration
    pub fn children(&self, id: DeclarationId) -> impl Iterator<Item = &Declaration> {
        self.children
            .get(id.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// All declarations with a given identifier (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Vec<&Declaration> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Find a declaration by its full qualified name
    pub fn find_by_qualified_name(&self, name: &QualifiedName) -> Option<&Declaration> {
        let mut current = self.project_by_name(&name.project)?;
        let path = name.module.iter().chain(name.members.iter());
        for segment in path {
            current = self.children(current.id).find(|child| child.is_named(segment))?;
        }
        Some(current)
    }

    /// All projects
    pub fn projects(&self) -> impl Iterator<Item = &Declaration> {
        self.projects.iter().filter_map(|id| self.get(*id))
    }

    /// Find a project by name
    pub fn project_by_name(&self, name: &str) -> Option<&Declaration> {
        self.projects().find(|project| project.is_named(name))
    }

    /// All modules of a project
    pub fn modules(&self, project: DeclarationId) -> impl Iterator<Item = &Declaration> {
        self.children(project).filter(|child| child.kind.is_module())
    }

    /// Projects referenced by `project`, in priority order
    pub fn referenced_projects(&self, project: DeclarationId) -> &[DeclarationId] {
        self.references
            .get(&project)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `project` references `other`
    pub fn references(&self, project: DeclarationId, other: DeclarationId) -> bool {
        self.referenced_projects(project).contains(&other)
    }

    /// Class-module data of a declaration, if it is a class module
    pub fn class_module(&self, id: DeclarationId) -> Option<&ClassModule> {
        self.get(id).and_then(Declaration::as_class_module)
    }

    /// Mutable class-module data, for supertype bookkeeping
    pub fn class_module_mut(&mut self, id: DeclarationId) -> Result<&mut ClassModule> {
        let declaration = self
            .declarations
            .get_mut(id.index())
            .ok_or_else(|| Error::DeclarationNotFound(id.to_string()))?;
        let qualified_name = &declaration.qualified_name;
        let kind = declaration.kind;
        match declaration.class_module.as_mut() {
            Some(class_module) => Ok(class_module),
            None => Err(Error::Integrity(format!(
                "{} is a {}, not a class module",
                qualified_name, kind
            ))),
        }
    }

    /// Resolve every class module's `Implements` names into supertype edges.
    ///
    /// Names resolve to class modules of the same project first, then to
    /// exposed class modules of referenced projects in priority order. A
    /// name may be qualified with the project (`Lib.IShape`). Both halves of
    /// each edge are inserted; edges that already exist are left alone.
    pub fn link_supertypes(&mut self) -> LinkStats {
        let mut stats = LinkStats::default();
        let mut edges = Vec::new();

        for declaration in &self.declarations {
            let Some(class_module) = declaration.as_class_module() else {
                continue;
            };
            for name in class_module.supertype_names() {
                match self.resolve_supertype_name(declaration, name) {
                    Some(supertype) => edges.push((declaration.id, supertype)),
                    None => {
                        tracing::warn!(
                            "Cannot resolve interface {} implemented by {}",
                            name,
                            declaration.qualified_name
                        );
                        stats.unresolved.push(format!("{} ({})", name, declaration.qualified_name));
                    }
                }
            }
        }

        for (subtype, supertype) in edges {
            let mut added = false;
            if let Ok(class_module) = self.class_module_mut(subtype) {
                added |= class_module.add_supertype(supertype);
            }
            if let Ok(class_module) = self.class_module_mut(supertype) {
                added |= class_module.add_subtype(subtype);
            }
            if added {
                stats.linked += 1;
            } else {
                stats.already_linked += 1;
            }
        }

        tracing::debug!(
            "Linked {} supertype edges ({} unresolved)",
            stats.linked,
            stats.unresolved.len()
        );
        stats
    }

    fn resolve_supertype_name(&self, class: &Declaration, name: &str) -> Option<DeclarationId> {
        let is_class = |d: &&Declaration| d.kind == DeclarationType::ClassModule;

        if let Some((project_name, class_name)) = name.split_once('.') {
            let project = self.project_by_name(project_name)?;
            let visible = project.id == class.project || self.references(class.project, project.id);
            if !visible {
                return None;
            }
            return self
                .modules(project.id)
                .filter(is_class)
                .find(|m| m.is_named(class_name))
                .filter(|m| m.project == class.project || m.as_class_module().is_some_and(ClassModule::is_exposed))
                .map(|m| m.id);
        }

        if let Some(local) = self
            .modules(class.project)
            .filter(is_class)
            .find(|m| m.is_named(name))
        {
            return Some(local.id);
        }

        self.referenced_projects(class.project)
            .iter()
            .flat_map(|project| self.modules(*project))
            .filter(is_class)
            .filter(|m| m.as_class_module().is_some_and(ClassModule::is_exposed))
            .find(|m| m.is_named(name))
            .map(|m| m.id)
    }

    /// Transitive supertypes of a class module, nearest first.
    ///
    /// The relation may contain cycles; each class is reported once and
    /// never includes `id` itself.
    pub fn all_supertypes(&self, id: DeclarationId) -> Vec<DeclarationId> {
        self.walk(id, ClassModule::supertypes)
    }

    /// Transitive subtypes of a class module, nearest first.
    pub fn all_subtypes(&self, id: DeclarationId) -> Vec<DeclarationId> {
        self.walk(id, ClassModule::subtypes)
    }

    fn walk(&self, start: DeclarationId, next: fn(&ClassModule) -> &[DeclarationId]) -> Vec<DeclarationId> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(class_module) = self.class_module(current) else {
                continue;
            };
            for related in next(class_module) {
                if visited.insert(*related) {
                    found.push(*related);
                    queue.push_back(*related);
                }
            }
        }

        found
    }

    /// Iterate over all declarations in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut by_kind = BTreeMap::new();
        for declaration in &self.declarations {
            *by_kind.entry(declaration.kind).or_insert(0) += 1;
        }
        let project_references = self.references.values().map(Vec::len).sum();
        let supertype_edges = self
            .declarations
            .iter()
            .filter_map(Declaration::as_class_module)
            .map(|c| c.supertypes().len())
            .sum();

        GraphStats {
            total_declarations: self.declarations.len(),
            by_kind,
            project_references,
            supertype_edges,
        }
    }
}

/// Outcome of [`DeclarationGraph::link_supertypes`]
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    pub linked: usize,
    pub already_linked: usize,
    /// `Implements` names that matched no visible class module
    pub unresolved: Vec<String>,
}

/// Statistics about a declaration graph
#[derive(Debug, Clone)]
pub struct GraphStats {
    pub total_declarations: usize,
    pub by_kind: BTreeMap<DeclarationType, usize>,
    pub project_references: usize,
    pub supertype_edges: usize,
}

impl GraphStats {
    pub fn count(&self, kind: DeclarationType) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Declaration Graph Statistics:")?;
        writeln!(f, "  Declarations: {}", self.total_declarations)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        writeln!(f, "  Project references: {}", self.project_references)?;
        writeln!(f, "  Supertype edges: {}", self.supertype_edges)
    }
}
