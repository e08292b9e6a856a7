//! Accessibility checks between declarations
//!
//! `AccessibilityChecker` is bound to the enclosing scope of the expression
//! being resolved and answers whether modules and module-level members are
//! visible from there, taking project references and class exposure into
//! account.

use crate::declaration::{Declaration, DeclarationId, DeclarationType};
use crate::finder::EnclosingScope;
use crate::graph::DeclarationGraph;

pub struct AccessibilityChecker<'a> {
    graph: &'a DeclarationGraph,
    scope: EnclosingScope,
}

impl<'a> AccessibilityChecker<'a> {
    pub fn new(graph: &'a DeclarationGraph, scope: EnclosingScope) -> Self {
        Self { graph, scope }
    }

    /// Whether `project` is the enclosing project or one it references
    pub fn is_project_visible(&self, project: DeclarationId) -> bool {
        project == self.scope.project || self.graph.references(self.scope.project, project)
    }

    /// Check if a module is visible from the enclosing scope.
    ///
    /// Modules of the enclosing project are always visible. From a
    /// referencing project, procedural modules must not be
    /// `Option Private Module` and class modules must be exposed.
    pub fn is_module_visible(&self, module: &Declaration) -> bool {
        if module.project == self.scope.project {
            return true;
        }
        if !self.graph.references(self.scope.project, module.project) {
            return false;
        }
        match module.kind {
            DeclarationType::ProceduralModule => module.accessibility.is_visible_outside_module(),
            DeclarationType::ClassModule => module
                .as_class_module()
                .is_some_and(|class_module| class_module.is_exposed()),
            _ => false,
        }
    }

    /// Check if a module-level declaration is visible from the enclosing scope
    pub fn is_member_visible(&self, member: &Declaration) -> bool {
        let Some(module) = member.module.and_then(|id| self.graph.get(id)) else {
            return false;
        };

        if module.id == self.scope.module {
            return true;
        }
        if module.project == self.scope.project {
            return member.accessibility.is_visible_outside_module();
        }
        member.accessibility.is_visible_outside_project() && self.is_module_visible(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attributes, VB_EXPOSED};
    use crate::class_module::ClassModuleOptions;
    use crate::declaration::Accessibility;

    struct Fixture {
        graph: DeclarationGraph,
        scope: EnclosingScope,
        library: DeclarationId,
    }

    fn fixture() -> Fixture {
        let mut graph = DeclarationGraph::new();
        let project = graph.add_project("VBAProject", false);
        let library = graph.add_project("Lib", false);
        graph.add_project_reference(project, library).unwrap();
        let module = graph
            .add_procedural_module(project, "Module1", Accessibility::Public, Attributes::new())
            .unwrap();
        Fixture {
            graph,
            scope: EnclosingScope::new(project, module, module),
            library,
        }
    }

    #[test]
    fn test_private_module_hidden_from_other_projects() {
        let mut f = fixture();
        let open = f.graph
            .add_procedural_module(f.library, "Helpers", Accessibility::Public, Attributes::new())
            .unwrap();
        let private = f.graph
            .add_procedural_module(f.library, "Internals", Accessibility::Private, Attributes::new())
            .unwrap();

        let checker = AccessibilityChecker::new(&f.graph, f.scope);
        assert!(checker.is_module_visible(f.graph.get(open).unwrap()));
        assert!(!checker.is_module_visible(f.graph.get(private).unwrap()));
    }

    #[test]
    fn test_class_visibility_requires_exposure() {
        let mut f = fixture();
        let hidden = f.graph
            .add_class_module(f.library, "Hidden", Attributes::new(), ClassModuleOptions::default())
            .unwrap();
        let exposed = f.graph
            .add_class_module(f.library, "Exposed", Attributes::new().with(VB_EXPOSED, "True"), ClassModuleOptions::default())
            .unwrap();

        let checker = AccessibilityChecker::new(&f.graph, f.scope);
        assert!(!checker.is_module_visible(f.graph.get(hidden).unwrap()));
        assert!(checker.is_module_visible(f.graph.get(exposed).unwrap()));
    }

    #[test]
    fn test_member_accessibility_levels() {
        let mut f = fixture();
        let other = f.graph
            .add_procedural_module(f.scope.project, "Module2", Accessibility::Public, Attributes::new())
            .unwrap();
        let remote = f.graph
            .add_procedural_module(f.library, "Remote", Accessibility::Public, Attributes::new())
            .unwrap();

        let add = |graph: &mut DeclarationGraph, parent: DeclarationId, name: &str, accessibility: Accessibility| {
            graph
                .add_member(parent, name, DeclarationType::Enumeration, accessibility, Attributes::new())
                .unwrap()
        };
        let own_private = add(&mut f.graph, f.scope.module, "A", Accessibility::Private);
        let other_private = add(&mut f.graph, other, "B", Accessibility::Private);
        let other_friend = add(&mut f.graph, other, "C", Accessibility::Friend);
        let remote_friend = add(&mut f.graph, remote, "D", Accessibility::Friend);
        let remote_public = add(&mut f.graph, remote, "E", Accessibility::Public);

        let checker = AccessibilityChecker::new(&f.graph, f.scope);
        let visible = |id: DeclarationId| checker.is_member_visible(f.graph.get(id).unwrap());
        assert!(visible(own_private));
        assert!(!visible(other_private));
        assert!(visible(other_friend));
        assert!(!visible(remote_friend));
        assert!(visible(remote_public));
    }

    #[test]
    fn test_unreferenced_project_is_invisible() {
        let mut f = fixture();
        let stranger = f.graph.add_project("Stranger", false);
        let module = f.graph
            .add_procedural_module(stranger, "Anything", Accessibility::Public, Attributes::new())
            .unwrap();

        let checker = AccessibilityChecker::new(&f.graph, f.scope);
        assert!(!checker.is_project_visible(stranger));
        assert!(checker.is_project_visible(f.library));
        assert!(!checker.is_module_visible(f.graph.get(module).unwrap()));
    }
}
