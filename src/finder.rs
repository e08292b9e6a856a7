//! Declaration Finder - scoped, read-only queries over the declaration graph
//!
//! The binder only talks to the graph through [`DeclarationFinder`], so an
//! index-backed or database-backed finder can replace [`GraphFinder`]
//! without changing binding behavior. Every query respects accessibility
//! and project-reference visibility, and a query that matches more than one
//! declaration answers `None`: ambiguity is a failed lookup, never an
//! arbitrary pick.

use crate::accessibility::AccessibilityChecker;
use crate::declaration::{Declaration, DeclarationId, DeclarationType};
use crate::graph::DeclarationGraph;
use crate::{Error, Result};

/// Where the expression being resolved lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnclosingScope {
    /// Enclosing project
    pub project: DeclarationId,
    /// Enclosing module
    pub module: DeclarationId,
    /// Innermost enclosing declaration (the module itself or a member)
    pub parent: DeclarationId,
}

impl EnclosingScope {
    pub fn new(project: DeclarationId, module: DeclarationId, parent: DeclarationId) -> Self {
        Self { project, module, parent }
    }

    /// Scope for code directly inside `parent` (a module or one of its members)
    pub fn enclosing(graph: &DeclarationGraph, parent: DeclarationId) -> Result<Self> {
        let declaration = graph.declaration(parent)?;
        let module = declaration.module.ok_or_else(|| {
            Error::Integrity(format!(
                "{} is not inside a module",
                declaration.qualified_name
            ))
        })?;
        Ok(Self::new(declaration.project, module, parent))
    }
}

/// The queries the member-access binder depends on.
pub trait DeclarationFinder {
    /// Look up a declaration by handle
    fn declaration(&self, id: DeclarationId) -> Option<&Declaration>;

    /// A project directly referenced by `enclosing_project`, matched by name
    fn find_referenced_project(&self, enclosing_project: DeclarationId, name: &str) -> Option<DeclarationId>;

    /// A module of `kind` in the enclosing project, other than the module
    /// the expression is resolved from
    fn find_module_without_enclosing(
        &self,
        scope: EnclosingScope,
        name: &str,
        kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A module of `kind` in a project referenced by the enclosing project,
    /// subject to that project's exposure rules
    fn find_module_in_referenced_project(
        &self,
        scope: EnclosingScope,
        referenced_project: DeclarationId,
        name: &str,
        kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A UDT or enum declared directly in the enclosing module
    fn find_member_in_enclosing_module(
        &self,
        scope: EnclosingScope,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A UDT or enum declared in exactly one other procedural module of the
    /// enclosing project
    fn find_member_without_enclosing_module(
        &self,
        scope: EnclosingScope,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A UDT or enum declared in exactly one procedural module of a
    /// referenced project
    fn find_member_in_referenced_project(
        &self,
        scope: EnclosingScope,
        referenced_project: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A UDT or enum declared in `lookup_module` of the enclosing project
    fn find_member_in_module(
        &self,
        scope: EnclosingScope,
        lookup_module: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId>;

    /// A UDT or enum declared in `lookup_module` of a referenced project
    fn find_member_in_referenced_project_module(
        &self,
        scope: EnclosingScope,
        lookup_module: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId>;
}

/// [`DeclarationFinder`] over an in-memory [`DeclarationGraph`], by linear scan
/// of the relevant modules.
pub struct GraphFinder<'a> {
    graph: &'a DeclarationGraph,
}

impl<'a> GraphFinder<'a> {
    pub fn new(graph: &'a DeclarationGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'a DeclarationGraph {
        self.graph
    }

    /// Visible declarations of `kind` named `name`, directly inside `module`
    fn visible_members_of(
        &self,
        checker: &AccessibilityChecker<'_>,
        module: DeclarationId,
        name: &str,
        kind: DeclarationType,
    ) -> Vec<&'a Declaration> {
        self.graph
            .children(module)
            .filter(|child| child.kind == kind && child.is_named(name))
            .filter(|child| checker.is_member_visible(child))
            .collect()
    }
}

/// The single item of an iterator, or `None` if it yields zero or several.
fn unique<'g>(mut candidates: impl Iterator<Item = &'g Declaration>) -> Option<DeclarationId> {
    let first = candidates.next()?;
    if let Some(second) = candidates.next() {
        tracing::trace!(
            "Ambiguous lookup: {} and {} both match",
            first.qualified_name,
            second.qualified_name
        );
        return None;
    }
    Some(first.id)
}

impl DeclarationFinder for GraphFinder<'_> {
    fn declaration(&self, id: DeclarationId) -> Option<&Declaration> {
        self.graph.get(id)
    }

    fn find_referenced_project(&self, enclosing_project: DeclarationId, name: &str) -> Option<DeclarationId> {
        unique(
            self.graph
                .referenced_projects(enclosing_project)
                .iter()
                .filter_map(|id| self.graph.get(*id))
                .filter(|project| project.is_named(name)),
        )
    }

    fn find_module_without_enclosing(
        &self,
        scope: EnclosingScope,
        name: &str,
        kind: DeclarationType,
    ) -> Option<DeclarationId> {
        unique(
            self.graph
                .modules(scope.project)
                .filter(|module| module.id != scope.module)
                .filter(|module| module.kind == kind && module.is_named(name)),
        )
    }

    fn find_module_in_referenced_project(
        &self,
        scope: EnclosingScope,
        referenced_project: DeclarationId,
        name: &str,
        kind: DeclarationType,
    ) -> Option<DeclarationId> {
        if !self.graph.references(scope.project, referenced_project) {
            return None;
        }
        let checker = AccessibilityChecker::new(self.graph, scope);
        unique(
            self.graph
                .modules(referenced_project)
                .filter(|module| module.kind == kind && module.is_named(name))
                .filter(|module| checker.is_module_visible(module)),
        )
    }

    fn find_member_in_enclosing_module(
        &self,
        scope: EnclosingScope,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId> {
        unique(
            self.graph
                .children(scope.module)
                .filter(|child| child.kind == member_kind && child.is_named(name)),
        )
    }

    fn find_member_without_enclosing_module(
        &self,
        scope: EnclosingScope,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId> {
        let checker = AccessibilityChecker::new(self.graph, scope);
        unique(
            self.graph
                .modules(scope.project)
                .filter(|module| module.id != scope.module)
                .filter(|module| module.kind == DeclarationType::ProceduralModule)
                .flat_map(|module| self.visible_members_of(&checker, module.id, name, member_kind)),
        )
    }

    fn find_member_in_referenced_project(
        &self,
        scope: EnclosingScope,
        referenced_project: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId> {
        if !self.graph.references(scope.project, referenced_project) {
            return None;
        }
        let checker = AccessibilityChecker::new(self.graph, scope);
        unique(
            self.graph
                .modules(referenced_project)
                .filter(|module| module.kind == DeclarationType::ProceduralModule)
                .filter(|module| checker.is_module_visible(module))
                .flat_map(|module| self.visible_members_of(&checker, module.id, name, member_kind)),
        )
    }

    fn find_member_in_module(
        &self,
        scope: EnclosingScope,
        lookup_module: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId> {
        let module = self.graph.get(lookup_module)?;
        if !module.kind.is_module() || module.project != scope.project {
            return None;
        }
        let checker = AccessibilityChecker::new(self.graph, scope);
        unique(self.visible_members_of(&checker, module.id, name, member_kind).into_iter())
    }

    fn find_member_in_referenced_project_module(
        &self,
        scope: EnclosingScope,
        lookup_module: DeclarationId,
        name: &str,
        member_kind: DeclarationType,
    ) -> Option<DeclarationId> {
        let module = self.graph.get(lookup_module)?;
        if !module.kind.is_module() || module.project == scope.project {
            return None;
        }
        let checker = AccessibilityChecker::new(self.graph, scope);
        if !checker.is_module_visible(module) {
            return None;
        }
        unique(self.visible_members_of(&checker, module.id, name, member_kind).into_iter())
    }
}
