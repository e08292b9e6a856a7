//! Expression Binding - classify member-access chains against the graph
//!
//! Binding is a pure read over a frozen declaration graph. Each binding
//! resolves its left-hand side first, then runs an ordered cascade of
//! lookups and stops at the first one that matches:
//!
//! 1. l-expression is a project: project, procedural module, class module,
//!    UDT, enumeration
//! 2. l-expression is a procedural module or type: UDT, then enumeration
//!    declared in that module
//!
//! A lookup that finds several candidates counts as no match. When the
//! cascade is exhausted the outcome is `ResolutionResult::Unresolved`;
//! `Err` is reserved for graph integrity failures.

pub mod chain;
pub mod member_access_type;
pub mod root;

pub use chain::{ChainResolution, ChainStep, resolve_chain};
pub use member_access_type::MemberAccessTypeBinding;
pub use root::RootBinding;

use crate::Result;
use crate::declaration::{DeclarationId, DeclarationType};
use crate::expression::{BoundExpression, ExpressionClassification};
use crate::finder::{DeclarationFinder, EnclosingScope};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Everything a binding needs besides its syntax: the finder to query and
/// the scope the expression is written in.
#[derive(Clone, Copy)]
pub struct BindingContext<'a> {
    pub finder: &'a dyn DeclarationFinder,
    pub scope: EnclosingScope,
}

impl<'a> BindingContext<'a> {
    pub fn new(finder: &'a dyn DeclarationFinder, scope: EnclosingScope) -> Self {
        Self { finder, scope }
    }
}

/// A binder for one syntax node.
pub trait ExpressionBinding {
    /// Resolve the expression. Deterministic for a given graph.
    fn resolve(&self) -> Result<ResolutionResult>;
}

/// Which lookup produced a bound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStep {
    /// First segment named the enclosing project
    EnclosingProject,
    /// First segment named a referenced project
    ReferencedProject,
    /// First segment named the enclosing module
    EnclosingModule,
    /// First segment named another module of the enclosing project
    ProjectModule,
    /// `Project.Name` naming a project
    Project,
    /// `Project.Name` naming a procedural module
    ProceduralModule,
    /// `Project.Name` naming a class module
    ClassModule,
    /// `Project.Name` naming a UDT
    UserDefinedType,
    /// `Project.Name` naming an enumeration
    Enumeration,
    /// `Module.Name` naming a UDT of that module
    ModuleUserDefinedType,
    /// `Module.Name` naming an enumeration of that module
    ModuleEnumeration,
}

impl ResolutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStep::EnclosingProject => "enclosing_project",
            ResolutionStep::ReferencedProject => "referenced_project",
            ResolutionStep::EnclosingModule => "enclosing_module",
            ResolutionStep::ProjectModule => "project_module",
            ResolutionStep::Project => "project",
            ResolutionStep::ProceduralModule => "procedural_module",
            ResolutionStep::ClassModule => "class_module",
            ResolutionStep::UserDefinedType => "user_defined_type",
            ResolutionStep::Enumeration => "enumeration",
            ResolutionStep::ModuleUserDefinedType => "module_user_defined_type",
            ResolutionStep::ModuleEnumeration => "module_enumeration",
        }
    }

    /// Classification a match of this step carries.
    ///
    /// `None` for the module seeds, which classify by the module's kind.
    pub fn classification(&self) -> Option<ExpressionClassification> {
        match self {
            ResolutionStep::EnclosingProject
            | ResolutionStep::ReferencedProject
            | ResolutionStep::Project => Some(ExpressionClassification::Project),
            ResolutionStep::ProceduralModule => Some(ExpressionClassification::ProceduralModule),
            ResolutionStep::ClassModule
            | ResolutionStep::UserDefinedType
            | ResolutionStep::Enumeration
            | ResolutionStep::ModuleUserDefinedType
            | ResolutionStep::ModuleEnumeration => Some(ExpressionClassification::Type),
            ResolutionStep::EnclosingModule | ResolutionStep::ProjectModule => None,
        }
    }

    /// Declaration kind this step looks for, where it looks for one kind
    pub fn declaration_kind(&self) -> Option<DeclarationType> {
        match self {
            ResolutionStep::EnclosingProject
            | ResolutionStep::ReferencedProject
            | ResolutionStep::Project => Some(DeclarationType::Project),
            ResolutionStep::ProceduralModule => Some(DeclarationType::ProceduralModule),
            ResolutionStep::ClassModule => Some(DeclarationType::ClassModule),
            ResolutionStep::UserDefinedType | ResolutionStep::ModuleUserDefinedType => {
                Some(DeclarationType::UserDefinedType)
            }
            ResolutionStep::Enumeration | ResolutionStep::ModuleEnumeration => {
                Some(DeclarationType::Enumeration)
            }
            ResolutionStep::EnclosingModule | ResolutionStep::ProjectModule => None,
        }
    }
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    Resolved {
        expression: BoundExpression,
        step: ResolutionStep,
    },
    /// No lookup matched `name`, or every match was ambiguous
    Unresolved { name: String },
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved { .. })
    }

    pub fn expression(&self) -> Option<&BoundExpression> {
        match self {
            ResolutionResult::Resolved { expression, .. } => Some(expression),
            ResolutionResult::Unresolved { .. } => None,
        }
    }

    pub fn step(&self) -> Option<ResolutionStep> {
        match self {
            ResolutionResult::Resolved { step, .. } => Some(*step),
            ResolutionResult::Unresolved { .. } => None,
        }
    }

    /// Resolved declaration, if any
    pub fn declaration(&self) -> Option<DeclarationId> {
        self.expression().map(BoundExpression::declaration)
    }
}

/// An already-bound expression used as the left-hand side of another binding.
pub struct PreboundExpression {
    expression: BoundExpression,
    step: ResolutionStep,
}

impl PreboundExpression {
    pub fn new(expression: BoundExpression, step: ResolutionStep) -> Self {
        Self { expression, step }
    }
}

impl ExpressionBinding for PreboundExpression {
    fn resolve(&self) -> Result<ResolutionResult> {
        Ok(ResolutionResult::Resolved {
            expression: self.expression.clone(),
            step: self.step,
        })
    }
}

/// Tally of binding outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionStats {
    pub resolved: usize,
    pub unresolved: usize,
    pub by_step: BTreeMap<ResolutionStep, usize>,
}

impl ResolutionStats {
    pub fn record(&mut self, result: &ResolutionResult) {
        match result.step() {
            Some(step) => {
                self.resolved += 1;
                *self.by_step.entry(step).or_insert(0) += 1;
            }
            None => self.unresolved += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.resolved + self.unresolved
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution Stats:")?;
        writeln!(f, "  Total: {}", self.total())?;
        writeln!(f, "  ✅ Resolved: {}", self.resolved)?;
        for (step, count) in &self.by_step {
            writeln!(f, "      {}: {}", step, count)?;
        }
        writeln!(f, "  ❓ Unresolved: {}", self.unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_classifications_match_kinds() {
        let steps = [
            ResolutionStep::Project,
            ResolutionStep::ProceduralModule,
            ResolutionStep::ClassModule,
            ResolutionStep::UserDefinedType,
            ResolutionStep::Enumeration,
            ResolutionStep::ModuleUserDefinedType,
            ResolutionStep::ModuleEnumeration,
        ];
        for step in steps {
            let classification = step.classification().unwrap();
            let kind = step.declaration_kind().unwrap();
            assert!(classification.accepts(kind), "{} disagrees with {}", step, kind);
        }
        assert!(ResolutionStep::ProjectModule.classification().is_none());
    }

    #[test]
    fn test_stats_tally() {
        let mut stats = ResolutionStats::default();
        stats.record(&ResolutionResult::Unresolved { name: "Foo".into() });
        stats.record(&ResolutionResult::Unresolved { name: "Bar".into() });
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.unresolved, 2);
        assert!(stats.by_step.is_empty());
        assert!(stats.to_string().contains("Unresolved: 2"));
    }
}
