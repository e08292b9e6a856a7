//! Member access in a type position (`Project.Module`, `Module.Udt`)
//!
//! Lookup order when the l-expression is a project:
//!
//! 1. a project: the enclosing project's own name, or a referenced project
//! 2. a procedural module of the l-expression's project
//! 3. a class module of that project (classified as a type)
//! 4. a UDT declared in a procedural module of that project
//! 5. an enumeration, the same way
//!
//! and when it is a procedural module or type:
//!
//! 1. a UDT declared in that module
//! 2. an enumeration declared in that module
//!
//! The first match wins. Nothing else is tried once the list for the
//! l-expression's classification is exhausted.

use super::{BindingContext, ExpressionBinding, ResolutionResult, ResolutionStep};
use crate::declaration::{Declaration, DeclarationId, DeclarationType};
use crate::expression::{BoundExpression, ExpressionClassification};
use crate::syntax::MemberAccessContext;
use crate::{Error, Result};
use tracing::{debug, trace};

const PROJECT_CASCADE: [ResolutionStep; 5] = [
    ResolutionStep::Project,
    ResolutionStep::ProceduralModule,
    ResolutionStep::ClassModule,
    ResolutionStep::UserDefinedType,
    ResolutionStep::Enumeration,
];

const MODULE_CASCADE: [ResolutionStep; 2] = [
    ResolutionStep::ModuleUserDefinedType,
    ResolutionStep::ModuleEnumeration,
];

/// What the l-expression resolved to, with the declarations the
/// project-scoped lookups compare against.
struct ProjectTarget<'f> {
    enclosing_project: &'f Declaration,
    enclosing_module: &'f Declaration,
    referenced_project: DeclarationId,
    is_enclosing_project: bool,
}

pub struct MemberAccessTypeBinding<'a> {
    context: BindingContext<'a>,
    access: MemberAccessContext,
    l_expression_binding: Box<dyn ExpressionBinding + 'a>,
}

impl<'a> MemberAccessTypeBinding<'a> {
    pub fn new(
        context: BindingContext<'a>,
        access: MemberAccessContext,
        l_expression_binding: Box<dyn ExpressionBinding + 'a>,
    ) -> Self {
        Self {
            context,
            access,
            l_expression_binding,
        }
    }

    pub fn unrestricted_name(&self) -> &str {
        self.access.unrestricted_name()
    }

    fn required(&self, id: DeclarationId) -> Result<&'a Declaration> {
        self.context
            .finder
            .declaration(id)
            .ok_or_else(|| Error::Integrity(format!("declaration {} is missing from the graph", id)))
    }

    fn resolve_l_expression_is_project(&self, l_expression: &BoundExpression) -> Result<Option<(ResolutionStep, DeclarationId)>> {
        let scope = self.context.scope;
        let target = ProjectTarget {
            enclosing_project: self.required(scope.project)?,
            enclosing_module: self.required(scope.module)?,
            referenced_project: l_expression.declaration(),
            is_enclosing_project: l_expression.declaration() == scope.project,
        };
        let name = self.unrestricted_name();

        for step in PROJECT_CASCADE {
            trace!("Trying {} for '{}'", step, name);
            let found = match step {
                ResolutionStep::Project => self.resolve_project(&target, name),
                ResolutionStep::ProceduralModule
                | ResolutionStep::ClassModule
                | ResolutionStep::UserDefinedType
                | ResolutionStep::Enumeration => step
                    .declaration_kind()
                    .and_then(|kind| self.resolve_in_project(&target, name, kind)),
                _ => None,
            };
            if let Some(id) = found {
                return Ok(Some((step, id)));
            }
        }
        Ok(None)
    }

    /// The enclosing project's own name, or a project it references
    fn resolve_project(&self, target: &ProjectTarget<'_>, name: &str) -> Option<DeclarationId> {
        if target.enclosing_project.is_named(name) {
            return Some(target.enclosing_project.id);
        }
        self.context
            .finder
            .find_referenced_project(self.context.scope.project, name)
    }

    fn resolve_in_project(&self, target: &ProjectTarget<'_>, name: &str, kind: DeclarationType) -> Option<DeclarationId> {
        if kind.is_module() {
            self.resolve_module(target, name, kind)
        } else {
            self.resolve_module_type(target, name, kind)
        }
    }

    fn resolve_module(&self, target: &ProjectTarget<'_>, name: &str, kind: DeclarationType) -> Option<DeclarationId> {
        let finder = self.context.finder;
        let scope = self.context.scope;
        if !target.is_enclosing_project {
            return finder.find_module_in_referenced_project(scope, target.referenced_project, name, kind);
        }
        let module = target.enclosing_module;
        if module.kind == kind && module.is_named(name) {
            return Some(module.id);
        }
        finder.find_module_without_enclosing(scope, name, kind)
    }

    fn resolve_module_type(&self, target: &ProjectTarget<'_>, name: &str, kind: DeclarationType) -> Option<DeclarationId> {
        let finder = self.context.finder;
        let scope = self.context.scope;
        if !target.is_enclosing_project {
            return finder.find_member_in_referenced_project(scope, target.referenced_project, name, kind);
        }
        finder
            .find_member_in_enclosing_module(scope, name, kind)
            .or_else(|| finder.find_member_without_enclosing_module(scope, name, kind))
    }

    fn resolve_l_expression_is_module(&self, l_expression: &BoundExpression) -> Option<(ResolutionStep, DeclarationId)> {
        let name = self.unrestricted_name();
        let module = l_expression.declaration();

        MODULE_CASCADE.into_iter().find_map(|step| {
            trace!("Trying {} for '{}'", step, name);
            let kind = step.declaration_kind()?;
            self.resolve_member_in_module(module, name, kind)
                .map(|id| (step, id))
        })
    }

    fn resolve_member_in_module(&self, module: DeclarationId, name: &str, kind: DeclarationType) -> Option<DeclarationId> {
        let finder = self.context.finder;
        let scope = self.context.scope;
        finder
            .find_member_in_module(scope, module, name, kind)
            .or_else(|| finder.find_member_in_referenced_project_module(scope, module, name, kind))
    }

    fn bind(&self, step: ResolutionStep, id: DeclarationId, l_expression: BoundExpression) -> Result<ResolutionResult> {
        let declaration = self.required(id)?;
        let classification = step.classification().ok_or_else(|| {
            Error::Integrity(format!("{} is not a member-access step", step))
        })?;
        debug!(
            "Resolved '{}' as {} via {}",
            self.unrestricted_name(),
            declaration.short_description(),
            step
        );
        let expression = BoundExpression::new(
            classification,
            declaration,
            self.access.node().clone(),
            Some(l_expression),
        )?;
        Ok(ResolutionResult::Resolved { expression, step })
    }

    fn unresolved(&self) -> ResolutionResult {
        debug!("Unresolved member access '{}'", self.unrestricted_name());
        ResolutionResult::Unresolved {
            name: self.unrestricted_name().to_string(),
        }
    }
}

impl ExpressionBinding for MemberAccessTypeBinding<'_> {
    fn resolve(&self) -> Result<ResolutionResult> {
        let l_expression = match self.l_expression_binding.resolve()? {
            ResolutionResult::Resolved { expression, .. } => expression,
            unresolved => return Ok(unresolved),
        };

        let found = match l_expression.classification() {
            ExpressionClassification::Project => self.resolve_l_expression_is_project(&l_expression)?,
            ExpressionClassification::ProceduralModule | ExpressionClassification::Type => {
                self.resolve_l_expression_is_module(&l_expression)
            }
            _ => None,
        };

        match found {
            Some((step, id)) => self.bind(step, id, l_expression),
            None => Ok(self.unresolved()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attributes, VB_EXPOSED, VB_PREDECLARED_ID};
    use crate::binding::PreboundExpression;
    use crate::class_module::ClassModuleOptions;
    use crate::declaration::Accessibility;
    use crate::finder::{DeclarationFinder, EnclosingScope, GraphFinder};
    use crate::graph::DeclarationGraph;
    use crate::syntax::{Production, Selection, SyntaxNode};

    struct Fixture {
        graph: DeclarationGraph,
        project: DeclarationId,
        module: DeclarationId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut graph = DeclarationGraph::new();
            let project = graph.add_project("VBAProject", false);
            let module = graph
                .add_procedural_module(project, "Module1", Accessibility::Public, Attributes::new())
                .unwrap();
            Self { graph, project, module }
        }

        fn module(&mut self, project: DeclarationId, name: &str) -> DeclarationId {
            self.graph
                .add_procedural_module(project, name, Accessibility::Public, Attributes::new())
                .unwrap()
        }

        fn class(&mut self, project: DeclarationId, name: &str, attributes: Attributes) -> DeclarationId {
            self.graph
                .add_class_module(project, name, attributes, ClassModuleOptions::default())
                .unwrap()
        }

        fn member(&mut self, parent: DeclarationId, name: &str, kind: DeclarationType) -> DeclarationId {
            self.graph
                .add_member(parent, name, kind, Accessibility::Public, Attributes::new())
                .unwrap()
        }

        fn scope(&self) -> EnclosingScope {
            EnclosingScope::new(self.project, self.module, self.module)
        }

        /// Resolve `name` with the l-expression already bound to `target`
        fn resolve(&self, target: DeclarationId, name: &str) -> ResolutionResult {
            self.resolve_in(self.scope(), target, name)
        }

        fn resolve_in(&self, scope: EnclosingScope, target: DeclarationId, name: &str) -> ResolutionResult {
            let finder = GraphFinder::new(&self.graph);
            let context = BindingContext::new(&finder, scope);
            let declaration = self.graph.get(target).unwrap();
            let classification = match declaration.kind {
                DeclarationType::Project => ExpressionClassification::Project,
                DeclarationType::ProceduralModule => ExpressionClassification::ProceduralModule,
                _ => ExpressionClassification::Type,
            };
            let node = SyntaxNode::simple_name(&declaration.name, Selection::default()).unwrap();
            let l_expression = BoundExpression::new(classification, declaration, node, None).unwrap();
            let access = MemberAccessContext::expression(name, Selection::on_line(1, 1, 2)).unwrap();
            let binding = MemberAccessTypeBinding::new(
                context,
                access,
                Box::new(PreboundExpression::new(l_expression, ResolutionStep::EnclosingProject)),
            );
            binding.resolve().unwrap()
        }
    }

    fn resolved(result: &ResolutionResult) -> (ResolutionStep, ExpressionClassification, DeclarationId) {
        let expression = result.expression().expect("expected a resolved expression");
        (result.step().unwrap(), expression.classification(), expression.declaration())
    }

    #[test]
    fn test_resolves_enclosing_project_by_name() {
        let f = Fixture::new();
        let result = f.resolve(f.project, "vbaproject");
        assert_eq!(resolved(&result), (ResolutionStep::Project, ExpressionClassification::Project, f.project));
    }

    #[test]
    fn test_resolves_referenced_project() {
        let mut f = Fixture::new();
        let excel = f.graph.add_project("Excel", true);
        f.graph.add_project_reference(f.project, excel).unwrap();
        let result = f.resolve(f.project, "Excel");
        assert_eq!(resolved(&result), (ResolutionStep::Project, ExpressionClassification::Project, excel));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        f.member(module2, "Point", DeclarationType::UserDefinedType);

        let first = f.resolve(f.project, "Point");
        let second = f.resolve(f.project, "Point");
        assert_eq!(first, second);
        assert!(first.is_resolved());
    }

    #[test]
    fn test_classification_agrees_with_kind() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        f.class(f.project, "Class1", Attributes::new());
        f.member(module2, "Point", DeclarationType::UserDefinedType);
        f.member(module2, "Color", DeclarationType::Enumeration);

        for name in ["VBAProject", "Module2", "Class1", "Point", "Color"] {
            let result = f.resolve(f.project, name);
            let expression = result.expression().unwrap();
            let declaration = f.graph.get(expression.declaration()).unwrap();
            assert!(expression.classification().accepts(declaration.kind), "{}", name);
        }
    }

    #[test]
    fn test_procedural_module_precedes_udt() {
        let mut f = Fixture::new();
        let foo = f.module(f.project, "Foo");
        let module3 = f.module(f.project, "Module3");
        f.member(module3, "Foo", DeclarationType::UserDefinedType);

        let result = f.resolve(f.project, "Foo");
        assert_eq!(
            resolved(&result),
            (ResolutionStep::ProceduralModule, ExpressionClassification::ProceduralModule, foo)
        );
    }

    #[test]
    fn test_class_module_classifies_as_type() {
        let mut f = Fixture::new();
        let class = f.class(f.project, "Class1", Attributes::new());
        let result = f.resolve(f.project, "Class1");
        assert_eq!(resolved(&result), (ResolutionStep::ClassModule, ExpressionClassification::Type, class));
    }

    #[test]
    fn test_enclosing_module_shortcut() {
        let mut f = Fixture::new();
        let foo = f.module(f.project, "Foo");
        let scope = EnclosingScope::new(f.project, foo, foo);

        // Another project-level search would find nothing: Foo is excluded from it
        let finder = GraphFinder::new(&f.graph);
        assert_eq!(finder.find_module_without_enclosing(scope, "Foo", DeclarationType::ProceduralModule), None);

        let result = f.resolve_in(scope, f.project, "Foo");
        assert_eq!(
            resolved(&result),
            (ResolutionStep::ProceduralModule, ExpressionClassification::ProceduralModule, foo)
        );
    }

    #[test]
    fn test_enclosing_class_module_shortcut() {
        let mut f = Fixture::new();
        let class = f.class(f.project, "Class1", Attributes::new());
        let scope = EnclosingScope::new(f.project, class, class);

        let result = f.resolve_in(scope, f.project, "Class1");
        assert_eq!(resolved(&result), (ResolutionStep::ClassModule, ExpressionClassification::Type, class));
    }

    #[test]
    fn test_ambiguous_udt_is_unresolved() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let module3 = f.module(f.project, "Module3");
        f.member(module2, "Bar", DeclarationType::UserDefinedType);
        f.member(module3, "Bar", DeclarationType::UserDefinedType);

        let result = f.resolve(f.project, "Bar");
        assert_eq!(result, ResolutionResult::Unresolved { name: "Bar".to_string() });
    }

    #[test]
    fn test_udt_in_enclosing_module_wins_over_ambiguity() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let own = f.member(f.module, "Bar", DeclarationType::UserDefinedType);
        f.member(module2, "Bar", DeclarationType::UserDefinedType);

        let result = f.resolve(f.project, "Bar");
        assert_eq!(resolved(&result), (ResolutionStep::UserDefinedType, ExpressionClassification::Type, own));
    }

    #[test]
    fn test_udt_precedes_enumeration() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let module3 = f.module(f.project, "Module3");
        let udt = f.member(module2, "Shape", DeclarationType::UserDefinedType);
        f.member(module3, "Shape", DeclarationType::Enumeration);

        let result = f.resolve(f.project, "Shape");
        assert_eq!(resolved(&result), (ResolutionStep::UserDefinedType, ExpressionClassification::Type, udt));
    }

    #[test]
    fn test_enumeration_in_other_module() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let color = f.member(module2, "Color", DeclarationType::Enumeration);

        let result = f.resolve(f.project, "color");
        assert_eq!(resolved(&result), (ResolutionStep::Enumeration, ExpressionClassification::Type, color));
    }

    #[test]
    fn test_exposed_class_in_referenced_project() {
        let mut f = Fixture::new();
        let p2 = f.graph.add_project("P2", false);
        f.graph.add_project_reference(f.project, p2).unwrap();
        let c = f.class(p2, "C", Attributes::new().with(VB_EXPOSED, "True"));

        let result = f.resolve(p2, "C");
        assert_eq!(resolved(&result), (ResolutionStep::ClassModule, ExpressionClassification::Type, c));
    }

    #[test]
    fn test_unexposed_class_in_referenced_project_is_unresolved() {
        let mut f = Fixture::new();
        let p2 = f.graph.add_project("P2", false);
        f.graph.add_project_reference(f.project, p2).unwrap();
        f.class(p2, "C", Attributes::new());

        let result = f.resolve(p2, "C");
        assert!(!result.is_resolved());
    }

    #[test]
    fn test_private_module_in_referenced_project_is_unresolved() {
        let mut f = Fixture::new();
        let p2 = f.graph.add_project("P2", false);
        f.graph.add_project_reference(f.project, p2).unwrap();
        let hidden = f
            .graph
            .add_procedural_module(p2, "Hidden", Accessibility::Private, Attributes::new())
            .unwrap();
        f.member(hidden, "Point", DeclarationType::UserDefinedType);
        let open = f.module(p2, "Open");

        assert!(!f.resolve(p2, "Hidden").is_resolved());
        assert!(!f.resolve(p2, "Point").is_resolved());
        assert_eq!(
            resolved(&f.resolve(p2, "Open")),
            (ResolutionStep::ProceduralModule, ExpressionClassification::ProceduralModule, open)
        );
    }

    #[test]
    fn test_referenced_project_does_not_search_enclosing_project() {
        let mut f = Fixture::new();
        let p2 = f.graph.add_project("P2", false);
        f.graph.add_project_reference(f.project, p2).unwrap();
        f.module(f.project, "LocalOnly");

        assert!(!f.resolve(p2, "LocalOnly").is_resolved());
    }

    #[test]
    fn test_udt_inside_module_l_expression() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let point = f.member(module2, "Point", DeclarationType::UserDefinedType);
        let color = f.member(module2, "Color", DeclarationType::Enumeration);

        let result = f.resolve(module2, "Point");
        assert_eq!(resolved(&result), (ResolutionStep::ModuleUserDefinedType, ExpressionClassification::Type, point));
        let result = f.resolve(module2, "Color");
        assert_eq!(resolved(&result), (ResolutionStep::ModuleEnumeration, ExpressionClassification::Type, color));
    }

    #[test]
    fn test_udt_inside_class_of_referenced_project() {
        let mut f = Fixture::new();
        let p2 = f.graph.add_project("P2", false);
        f.graph.add_project_reference(f.project, p2).unwrap();
        let exposed = f.class(p2, "Shapes", Attributes::new().with(VB_EXPOSED, "True"));
        let hidden = f.class(p2, "Secrets", Attributes::new());
        let kind = f.member(exposed, "ShapeKind", DeclarationType::Enumeration);
        f.member(hidden, "SecretKind", DeclarationType::Enumeration);

        let result = f.resolve(exposed, "ShapeKind");
        assert_eq!(resolved(&result), (ResolutionStep::ModuleEnumeration, ExpressionClassification::Type, kind));
        assert!(!f.resolve(hidden, "SecretKind").is_resolved());
    }

    #[test]
    fn test_private_udt_of_other_module_is_unresolved() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        f.graph
            .add_member(module2, "Hidden", DeclarationType::UserDefinedType, Accessibility::Private, Attributes::new())
            .unwrap();

        assert!(!f.resolve(module2, "Hidden").is_resolved());
    }

    #[test]
    fn test_project_l_expression_fails_closed() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        f.member(module2, "DoWork", DeclarationType::Procedure);

        let result = f.resolve(f.project, "DoWork");
        assert_eq!(result, ResolutionResult::Unresolved { name: "DoWork".to_string() });
    }

    #[test]
    fn test_unresolved_l_expression_propagates() {
        struct Failing;
        impl ExpressionBinding for Failing {
            fn resolve(&self) -> Result<ResolutionResult> {
                Ok(ResolutionResult::Unresolved { name: "Nope".to_string() })
            }
        }

        let f = Fixture::new();
        let finder = GraphFinder::new(&f.graph);
        let context = BindingContext::new(&finder, f.scope());
        let access = MemberAccessContext::expression("Module1", Selection::default()).unwrap();
        let binding = MemberAccessTypeBinding::new(context, access, Box::new(Failing));

        assert_eq!(binding.resolve().unwrap(), ResolutionResult::Unresolved { name: "Nope".to_string() });
    }

    #[test]
    fn test_nested_bindings_resolve_left_to_right() {
        let mut f = Fixture::new();
        let module2 = f.module(f.project, "Module2");
        let point = f.member(module2, "Point", DeclarationType::UserDefinedType);

        let finder = GraphFinder::new(&f.graph);
        let context = BindingContext::new(&finder, f.scope());
        let project = f.graph.get(f.project).unwrap();
        let root = BoundExpression::new(
            ExpressionClassification::Project,
            project,
            SyntaxNode::simple_name("VBAProject", Selection::default()).unwrap(),
            None,
        )
        .unwrap();
        let module_access = MemberAccessTypeBinding::new(
            context,
            MemberAccessContext::expression("Module2", Selection::default()).unwrap(),
            Box::new(PreboundExpression::new(root, ResolutionStep::EnclosingProject)),
        );
        let node = SyntaxNode::new(Production::MemberAccessExpr, "Point", Selection::default()).unwrap();
        let point_access = MemberAccessTypeBinding::new(
            context,
            MemberAccessContext::new(node).unwrap(),
            Box::new(module_access),
        );

        let result = point_access.resolve().unwrap();
        let expression = result.expression().unwrap();
        assert_eq!(expression.declaration(), point);
        let chain: Vec<DeclarationId> = expression.chain().iter().map(|e| e.declaration()).collect();
        assert_eq!(chain, vec![f.project, module2, point]);
    }

    #[test]
    fn test_predeclared_class_resolves_as_class_module() {
        let mut f = Fixture::new();
        let form = f.class(f.project, "UserForm1", Attributes::new().with(VB_PREDECLARED_ID, "True"));
        let result = f.resolve(f.project, "UserForm1");
        assert_eq!(resolved(&result), (ResolutionStep::ClassModule, ExpressionClassification::Type, form));
    }

    #[test]
    fn test_missing_enclosing_module_is_integrity_error() {
        let f = Fixture::new();
        let finder = GraphFinder::new(&f.graph);
        let scope = EnclosingScope::new(f.project, DeclarationId(99), DeclarationId(99));
        let context = BindingContext::new(&finder, scope);
        let project = f.graph.get(f.project).unwrap();
        let root = BoundExpression::new(
            ExpressionClassification::Project,
            project,
            SyntaxNode::simple_name("VBAProject", Selection::default()).unwrap(),
            None,
        )
        .unwrap();
        let binding = MemberAccessTypeBinding::new(
            context,
            MemberAccessContext::expression("Anything", Selection::default()).unwrap(),
            Box::new(PreboundExpression::new(root, ResolutionStep::EnclosingProject)),
        );

        assert!(matches!(binding.resolve(), Err(Error::Integrity(_))));
    }
}
