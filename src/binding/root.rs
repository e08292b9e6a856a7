//! Seed binding for the first segment of a chain
//!
//! Only the names a member-access chain can start from are considered: the
//! enclosing project, a referenced project, the enclosing module, or
//! another module of the enclosing project. Variables, procedures and
//! everything else a simple name can denote are left to other binders.

use super::{BindingContext, ExpressionBinding, ResolutionResult, ResolutionStep};
use crate::declaration::{DeclarationId, DeclarationType};
use crate::expression::{BoundExpression, ExpressionClassification};
use crate::syntax::SyntaxNode;
use crate::{Error, Result};
use tracing::debug;

pub struct RootBinding<'a> {
    context: BindingContext<'a>,
    node: SyntaxNode,
}

impl<'a> RootBinding<'a> {
    pub fn new(context: BindingContext<'a>, node: SyntaxNode) -> Self {
        Self { context, node }
    }

    fn find(&self) -> Result<Option<(ResolutionStep, DeclarationId)>> {
        let finder = self.context.finder;
        let scope = self.context.scope;
        let name = self.node.name.as_str();

        let project = finder
            .declaration(scope.project)
            .ok_or_else(|| Error::Integrity(format!("enclosing project {} is missing", scope.project)))?;
        if project.is_named(name) {
            return Ok(Some((ResolutionStep::EnclosingProject, project.id)));
        }
        if let Some(referenced) = finder.find_referenced_project(scope.project, name) {
            return Ok(Some((ResolutionStep::ReferencedProject, referenced)));
        }

        let module = finder
            .declaration(scope.module)
            .ok_or_else(|| Error::Integrity(format!("enclosing module {} is missing", scope.module)))?;
        if module.is_named(name) {
            return Ok(Some((ResolutionStep::EnclosingModule, module.id)));
        }

        let other_module = [DeclarationType::ProceduralModule, DeclarationType::ClassModule]
            .into_iter()
            .find_map(|kind| finder.find_module_without_enclosing(scope, name, kind));
        Ok(other_module.map(|id| (ResolutionStep::ProjectModule, id)))
    }
}

/// Classification of a declaration reached by name alone
fn classify(kind: DeclarationType) -> ExpressionClassification {
    match kind {
        DeclarationType::Project => ExpressionClassification::Project,
        DeclarationType::ProceduralModule => ExpressionClassification::ProceduralModule,
        _ => ExpressionClassification::Type,
    }
}

impl ExpressionBinding for RootBinding<'_> {
    fn resolve(&self) -> Result<ResolutionResult> {
        let Some((step, id)) = self.find()? else {
            debug!("Unresolved chain root '{}'", self.node.name);
            return Ok(ResolutionResult::Unresolved {
                name: self.node.name.clone(),
            });
        };

        let declaration = self
            .context
            .finder
            .declaration(id)
            .ok_or_else(|| Error::DeclarationNotFound(id.to_string()))?;
        let classification = step
            .classification()
            .unwrap_or_else(|| classify(declaration.kind));
        debug!("Chain root '{}' is {}", self.node.name, declaration.short_description());

        let expression = BoundExpression::new(classification, declaration, self.node.clone(), None)?;
        Ok(ResolutionResult::Resolved { expression, step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::class_module::ClassModuleOptions;
    use crate::declaration::Accessibility;
    use crate::finder::{EnclosingScope, GraphFinder};
    use crate::graph::DeclarationGraph;
    use crate::syntax::Selection;

    fn resolve(graph: &DeclarationGraph, scope: EnclosingScope, name: &str) -> ResolutionResult {
        let finder = GraphFinder::new(graph);
        let node = SyntaxNode::simple_name(name, Selection::default()).unwrap();
        RootBinding::new(BindingContext::new(&finder, scope), node)
            .resolve()
            .unwrap()
    }

    #[test]
    fn test_root_candidates() {
        let mut graph = DeclarationGraph::new();
        let project = graph.add_project("VBAProject", false);
        let excel = graph.add_project("Excel", true);
        graph.add_project_reference(project, excel).unwrap();
        let module1 = graph
            .add_procedural_module(project, "Module1", Accessibility::Public, Attributes::new())
            .unwrap();
        let class = graph
            .add_class_module(project, "Class1", Attributes::new(), ClassModuleOptions::default())
            .unwrap();
        let scope = EnclosingScope::new(project, module1, module1);

        let cases = [
            ("VBAProject", ResolutionStep::EnclosingProject, ExpressionClassification::Project, project),
            ("EXCEL", ResolutionStep::ReferencedProject, ExpressionClassification::Project, excel),
            ("Module1", ResolutionStep::EnclosingModule, ExpressionClassification::ProceduralModule, module1),
            ("Class1", ResolutionStep::ProjectModule, ExpressionClassification::Type, class),
        ];
        for (name, step, classification, id) in cases {
            let result = resolve(&graph, scope, name);
            let expression = result.expression().unwrap();
            assert_eq!(result.step(), Some(step), "{}", name);
            assert_eq!(expression.classification(), classification, "{}", name);
            assert_eq!(expression.declaration(), id, "{}", name);
        }
    }

    #[test]
    fn test_unknown_root_is_unresolved() {
        let mut graph = DeclarationGraph::new();
        let project = graph.add_project("VBAProject", false);
        let module1 = graph
            .add_procedural_module(project, "Module1", Accessibility::Public, Attributes::new())
            .unwrap();
        let scope = EnclosingScope::new(project, module1, module1);

        let result = resolve(&graph, scope, "Nothing");
        assert_eq!(result, ResolutionResult::Unresolved { name: "Nothing".to_string() });
    }
}
