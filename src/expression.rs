//! Bound expressions - the output of binding
//!
//! A `BoundExpression` pairs a classification with the declaration it
//! denotes. The pair is checked on construction: a classification never
//! disagrees with its declaration's kind, and there is no way to build a
//! "successful" expression without a declaration.

use crate::declaration::{Declaration, DeclarationId, DeclarationType};
use crate::syntax::SyntaxNode;
use crate::{Error, Result};
use serde::Serialize;

/// What a bound expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionClassification {
    /// Not classified; never carried by a resolved expression
    Unbound,
    Project,
    ProceduralModule,
    /// Class module, user-defined type or enumeration
    Type,
    Variable,
    Property,
    Function,
    Subroutine,
    Value,
}

impl ExpressionClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionClassification::Unbound => "unbound",
            ExpressionClassification::Project => "project",
            ExpressionClassification::ProceduralModule => "procedural_module",
            ExpressionClassification::Type => "type",
            ExpressionClassification::Variable => "variable",
            ExpressionClassification::Property => "property",
            ExpressionClassification::Function => "function",
            ExpressionClassification::Subroutine => "subroutine",
            ExpressionClassification::Value => "value",
        }
    }

    /// Whether a declaration of `kind` may carry this classification
    pub fn accepts(&self, kind: DeclarationType) -> bool {
        use DeclarationType as D;
        match self {
            ExpressionClassification::Unbound => false,
            ExpressionClassification::Project => kind == D::Project,
            ExpressionClassification::ProceduralModule => kind == D::ProceduralModule,
            ExpressionClassification::Type => {
                matches!(kind, D::ClassModule | D::UserDefinedType | D::Enumeration)
            }
            ExpressionClassification::Variable => {
                matches!(kind, D::Variable | D::Parameter | D::UserDefinedTypeMember)
            }
            ExpressionClassification::Property => {
                matches!(kind, D::PropertyGet | D::PropertyLet | D::PropertySet)
            }
            ExpressionClassification::Function => kind == D::Function,
            ExpressionClassification::Subroutine => kind == D::Procedure,
            ExpressionClassification::Value => {
                matches!(kind, D::Constant | D::EnumerationMember)
            }
        }
    }
}

impl std::fmt::Display for ExpressionClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundExpression {
    classification: ExpressionClassification,
    declaration: DeclarationId,
    node: SyntaxNode,
    l_expression: Option<Box<BoundExpression>>,
}

impl BoundExpression {
    /// Bind `declaration` under `classification`.
    ///
    /// A mismatch between the two is a graph integrity failure.
    pub fn new(
        classification: ExpressionClassification,
        declaration: &Declaration,
        node: SyntaxNode,
        l_expression: Option<BoundExpression>,
    ) -> Result<Self> {
        if !classification.accepts(declaration.kind) {
            return Err(Error::Integrity(format!(
                "cannot classify {} as {}",
                declaration.short_description(),
                classification
            )));
        }
        Ok(Self {
            classification,
            declaration: declaration.id,
            node,
            l_expression: l_expression.map(Box::new),
        })
    }

    pub fn classification(&self) -> ExpressionClassification {
        self.classification
    }

    pub fn declaration(&self) -> DeclarationId {
        self.declaration
    }

    pub fn node(&self) -> &SyntaxNode {
        &self.node
    }

    /// The left-hand side this expression extends, for chained accesses
    pub fn l_expression(&self) -> Option<&BoundExpression> {
        self.l_expression.as_deref()
    }

    /// This expression and every l-expression below it, innermost first
    pub fn chain(&self) -> Vec<&BoundExpression> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(expression) = current {
            chain.push(expression);
            current = expression.l_expression();
        }
        chain.reverse();
        chain
    }
}
