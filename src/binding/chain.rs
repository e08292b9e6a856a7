//! Left-to-right resolution of a dotted chain (`VBAProject.Module1.Point`)

use super::{
    BindingContext, ExpressionBinding, MemberAccessTypeBinding, PreboundExpression, ResolutionResult,
    ResolutionStep, RootBinding,
};
use crate::declaration::DeclarationId;
use crate::expression::{BoundExpression, ExpressionClassification};
use crate::{Error, Result};
use crate::syntax::{MemberAccessContext, Production, Selection, SyntaxNode, split_member_access};
use serde::Serialize;

/// One segment that bound successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStep {
    pub name: String,
    pub selection: Selection,
    pub step: ResolutionStep,
    pub classification: ExpressionClassification,
    pub declaration: DeclarationId,
}

impl ChainStep {
    fn new(step: ResolutionStep, expression: &BoundExpression) -> Self {
        Self {
            name: expression.node().name.clone(),
            selection: expression.node().selection,
            step,
            classification: expression.classification(),
            declaration: expression.declaration(),
        }
    }
}

/// Every segment bound so far and the final outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainResolution {
    pub text: String,
    pub steps: Vec<ChainStep>,
    pub outcome: ResolutionResult,
}

impl ChainResolution {
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_resolved()
    }

    /// Declaration of the last segment, if the whole chain resolved
    pub fn declaration(&self) -> Option<DeclarationId> {
        self.outcome.declaration()
    }
}

/// Resolve `text` segment by segment, stopping at the first segment that
/// does not bind.
pub fn resolve_chain(context: BindingContext<'_>, text: &str) -> Result<ChainResolution> {
    let mut segments = split_member_access(text)?.into_iter();
    let (first, selection) = segments
        .next()
        .ok_or_else(|| Error::InvalidName(format!("Empty member access: '{}'", text)))?;

    let root = RootBinding::new(context, SyntaxNode::simple_name(&first, selection)?);
    let mut outcome = root.resolve()?;
    let mut steps = Vec::new();

    for (raw, selection) in segments {
        let ResolutionResult::Resolved { expression, step } = &outcome else {
            break;
        };
        steps.push(ChainStep::new(*step, expression));

        let access = MemberAccessContext::new(SyntaxNode::new(Production::MemberAccessExpression, &raw, selection)?)?;
        let binding = MemberAccessTypeBinding::new(
            context,
            access,
            Box::new(PreboundExpression::new(expression.clone(), *step)),
        );
        outcome = binding.resolve()?;
    }

    if let ResolutionResult::Resolved { expression, step } = &outcome {
        steps.push(ChainStep::new(*step, expression));
    }

    tracing::debug!(
        "Chain '{}': {} segments bound, {}",
        text,
        steps.len(),
        if outcome.is_resolved() { "resolved" } else { "unresolved" }
    );
    Ok(ChainResolution {
        text: text.to_string(),
        steps,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attributes, VB_EXPOSED};
    use crate::class_module::ClassModuleOptions;
    use crate::declaration::{Accessibility, DeclarationType};
    use crate::finder::{EnclosingScope, GraphFinder};
    use crate::graph::DeclarationGraph;

    struct Fixture {
        graph: DeclarationGraph,
        scope: EnclosingScope,
        point: DeclarationId,
        shape: DeclarationId,
    }

    fn fixture() -> Fixture {
        let mut graph = DeclarationGraph::new();
        let project = graph.add_project("VBAProject", false);
        let library = graph.add_project("Lib", false);
        graph.add_project_reference(project, library).unwrap();
        let module1 = graph
            .add_procedural_module(project, "Module1", Accessibility::Public, Attributes::new())
            .unwrap();
        let geometry = graph
            .add_procedural_module(project, "Geometry", Accessibility::Public, Attributes::new())
            .unwrap();
        let point = graph
            .add_member(geometry, "Point", DeclarationType::UserDefinedType, Accessibility::Public, Attributes::new())
            .unwrap();
        let shape = graph
            .add_class_module(library, "Shape", Attributes::new().with(VB_EXPOSED, "True"), ClassModuleOptions::default())
            .unwrap();
        Fixture {
            graph,
            scope: EnclosingScope::new(project, module1, module1),
            point,
            shape,
        }
    }

    fn resolve(f: &Fixture, text: &str) -> ChainResolution {
        let finder = GraphFinder::new(&f.graph);
        resolve_chain(BindingContext::new(&finder, f.scope), text).unwrap()
    }

    #[test]
    fn test_full_chain() {
        let f = fixture();
        let resolution = resolve(&f, "VBAProject.Geometry.Point");

        assert!(resolution.is_resolved());
        assert_eq!(resolution.declaration(), Some(f.point));
        let steps: Vec<ResolutionStep> = resolution.steps.iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec![
                ResolutionStep::EnclosingProject,
                ResolutionStep::ProceduralModule,
                ResolutionStep::ModuleUserDefinedType
            ]
        );
        let chain_length = resolution.outcome.expression().unwrap().chain().len();
        assert_eq!(chain_length, 3);
    }

    #[test]
    fn test_chain_from_module() {
        let f = fixture();
        let resolution = resolve(&f, "geometry.[Point]");
        assert_eq!(resolution.declaration(), Some(f.point));
        assert_eq!(resolution.steps[0].step, ResolutionStep::ProjectModule);
        assert_eq!(resolution.steps[1].name, "Point");
    }

    #[test]
    fn test_chain_into_referenced_project() {
        let f = fixture();
        let resolution = resolve(&f, "Lib.Shape");
        assert_eq!(resolution.declaration(), Some(f.shape));
        assert_eq!(resolution.steps[1].classification, ExpressionClassification::Type);
    }

    #[test]
    fn test_partial_progress_is_reported() {
        let f = fixture();
        let resolution = resolve(&f, "VBAProject.Geometry.Missing.Point");

        assert!(!resolution.is_resolved());
        assert_eq!(resolution.steps.len(), 2);
        assert_eq!(resolution.outcome, ResolutionResult::Unresolved { name: "Missing".to_string() });
    }

    #[test]
    fn test_unresolved_root() {
        let f = fixture();
        let resolution = resolve(&f, "Nowhere.Point");
        assert!(resolution.steps.is_empty());
        assert_eq!(resolution.outcome, ResolutionResult::Unresolved { name: "Nowhere".to_string() });
    }

    #[test]
    fn test_malformed_chain_is_an_error() {
        let f = fixture();
        let finder = GraphFinder::new(&f.graph);
        assert!(resolve_chain(BindingContext::new(&finder, f.scope), "VBAProject..Point").is_err());
    }
}
