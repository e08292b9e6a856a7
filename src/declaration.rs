//! Declarations - the nodes of the declaration graph
//!
//! Every named entity of a VBA project maps onto a `Declaration`:
//! - `Project`: a VBA project or a referenced type library
//! - `ProceduralModule` / `ClassModule`: the modules of a project
//! - `UserDefinedType` / `Enumeration`: type definitions inside a module
//! - members, variables, constants and parameters below those

use crate::attributes::Attributes;
use crate::class_module::ClassModule;
use crate::qualified_name::QualifiedName;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable handle of a declaration inside a `DeclarationGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclarationId(pub u32);

impl DeclarationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationType {
    Project,
    ProceduralModule,
    ClassModule,
    UserDefinedType,
    UserDefinedTypeMember,
    Enumeration,
    EnumerationMember,
    Procedure,
    Function,
    PropertyGet,
    PropertyLet,
    PropertySet,
    Event,
    Variable,
    Constant,
    Parameter,
}

impl DeclarationType {
    /// Get the string representation of the declaration type
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationType::Project => "project",
            DeclarationType::ProceduralModule => "procedural_module",
            DeclarationType::ClassModule => "class_module",
            DeclarationType::UserDefinedType => "user_defined_type",
            DeclarationType::UserDefinedTypeMember => "user_defined_type_member",
            DeclarationType::Enumeration => "enumeration",
            DeclarationType::EnumerationMember => "enumeration_member",
            DeclarationType::Procedure => "procedure",
            DeclarationType::Function => "function",
            DeclarationType::PropertyGet => "property_get",
            DeclarationType::PropertyLet => "property_let",
            DeclarationType::PropertySet => "property_set",
            DeclarationType::Event => "event",
            DeclarationType::Variable => "variable",
            DeclarationType::Constant => "constant",
            DeclarationType::Parameter => "parameter",
        }
    }

    /// Get all declaration types
    pub fn all() -> &'static [DeclarationType] {
        &[
            DeclarationType::Project,
            DeclarationType::ProceduralModule,
            DeclarationType::ClassModule,
            DeclarationType::UserDefinedType,
            DeclarationType::UserDefinedTypeMember,
            DeclarationType::Enumeration,
            DeclarationType::EnumerationMember,
            DeclarationType::Procedure,
            DeclarationType::Function,
            DeclarationType::PropertyGet,
            DeclarationType::PropertyLet,
            DeclarationType::PropertySet,
            DeclarationType::Event,
            DeclarationType::Variable,
            DeclarationType::Constant,
            DeclarationType::Parameter,
        ]
    }

    /// Procedural and class modules
    pub fn is_module(&self) -> bool {
        matches!(self, DeclarationType::ProceduralModule | DeclarationType::ClassModule)
    }

    /// Type definitions that live inside a module (UDTs and enums)
    pub fn is_module_type(&self) -> bool {
        matches!(self, DeclarationType::UserDefinedType | DeclarationType::Enumeration)
    }

    /// Procedures, functions, properties and events
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DeclarationType::Procedure
                | DeclarationType::Function
                | DeclarationType::PropertyGet
                | DeclarationType::PropertyLet
                | DeclarationType::PropertySet
                | DeclarationType::Event
        )
    }

    /// Whether a declaration of this type may be declared directly inside `parent`.
    pub fn can_be_child_of(&self, parent: DeclarationType) -> bool {
        use DeclarationType::*;
        match self {
            Project => false,
            ProceduralModule | ClassModule => parent == Project,
            UserDefinedType | Enumeration => parent.is_module(),
            UserDefinedTypeMember => parent == UserDefinedType,
            EnumerationMember => parent == Enumeration,
            Procedure | Function | PropertyGet | PropertyLet | PropertySet | Event => {
                parent.is_module()
            }
            Variable | Constant => parent.is_module() || parent.is_member(),
            Parameter => parent.is_member(),
        }
    }
}

impl FromStr for DeclarationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "project" | "library" => Ok(DeclarationType::Project),
            "procedural_module" | "module" | "standard_module" => {
                Ok(DeclarationType::ProceduralModule)
            }
            "class_module" | "class" => Ok(DeclarationType::ClassModule),
            "user_defined_type" | "udt" | "type" => Ok(DeclarationType::UserDefinedType),
            "user_defined_type_member" | "udt_member" | "field" => {
                Ok(DeclarationType::UserDefinedTypeMember)
            }
            "enumeration" | "enum" => Ok(DeclarationType::Enumeration),
            "enumeration_member" | "enum_member" => Ok(DeclarationType::EnumerationMember),
            "procedure" | "sub" => Ok(DeclarationType::Procedure),
            "function" => Ok(DeclarationType::Function),
            "property_get" => Ok(DeclarationType::PropertyGet),
            "property_let" => Ok(DeclarationType::PropertyLet),
            "property_set" => Ok(DeclarationType::PropertySet),
            "event" => Ok(DeclarationType::Event),
            "variable" | "dim" => Ok(DeclarationType::Variable),
            "constant" | "const" => Ok(DeclarationType::Constant),
            "parameter" | "param" => Ok(DeclarationType::Parameter),
            _ => Err(Error::InvalidName(format!("Unknown declaration type: {}", s))),
        }
    }
}

impl std::fmt::Display for DeclarationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared accessibility of a declaration.
///
/// `Implicit` is what the source gets when no modifier is written; for
/// module-level declarations it behaves like `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    #[default]
    Implicit,
    Private,
    Friend,
    Public,
    Global,
}

impl Accessibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Implicit => "implicit",
            Accessibility::Private => "private",
            Accessibility::Friend => "friend",
            Accessibility::Public => "public",
            Accessibility::Global => "global",
        }
    }

    /// Visible to other projects (given the enclosing module is).
    pub fn is_visible_outside_project(&self) -> bool {
        matches!(
            self,
            Accessibility::Implicit | Accessibility::Public | Accessibility::Global
        )
    }

    /// Visible to other modules of the same project.
    pub fn is_visible_outside_module(&self) -> bool {
        !matches!(self, Accessibility::Private)
    }
}

impl FromStr for Accessibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "implicit" | "" => Ok(Accessibility::Implicit),
            "private" => Ok(Accessibility::Private),
            "friend" => Ok(Accessibility::Friend),
            "public" => Ok(Accessibility::Public),
            "global" => Ok(Accessibility::Global),
            _ => Err(Error::InvalidName(format!("Unknown accessibility: {}", s))),
        }
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compare two VBA identifiers. VBA is case-insensitive.
pub fn identifier_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// A node of the declaration graph.
///
/// Declarations are created once while the graph is built and only their
/// class-module relations change afterwards.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclarationId,
    pub kind: DeclarationType,
    /// Identifier as written in source
    pub name: String,
    pub qualified_name: QualifiedName,
    pub accessibility: Accessibility,
    /// Enclosing declaration; `None` only for projects
    pub parent: Option<DeclarationId>,
    /// Enclosing project; a project is its own project
    pub project: DeclarationId,
    /// Enclosing module; `None` for projects, a module is its own module
    pub module: Option<DeclarationId>,
    pub attributes: Attributes,
    pub is_built_in: bool,
    pub(crate) class_module: Option<ClassModule>,
}

impl Declaration {
    /// Class-module data, present iff `kind == ClassModule`
    pub fn as_class_module(&self) -> Option<&ClassModule> {
        self.class_module.as_ref()
    }

    pub fn is_named(&self, name: &str) -> bool {
        identifier_eq(&self.name, name)
    }

    /// Short description for display
    pub fn short_description(&self) -> String {
        format!("{} {}", self.kind, self.qualified_name)
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Declaration {}

impl std::hash::Hash for Declaration {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
