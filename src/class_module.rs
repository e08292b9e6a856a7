//! Class module data and the interface-realization relation

use crate::Result;
use crate::attributes::{Attributes, VB_EXPOSED, VB_GLOBAL_NAMESPACE, VB_PREDECLARED_ID};
use crate::declaration::DeclarationId;
use serde::{Deserialize, Serialize};

/// Flags supplied by whoever constructs the class module.
///
/// They are OR-ed with the corresponding source attributes, which lets type
/// libraries mark classes exposed or global without synthesizing attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModuleOptions {
    #[serde(default)]
    pub exposed: bool,
    #[serde(default)]
    pub global: bool,
}

/// The class-module specialization of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassModule {
    options: ClassModuleOptions,
    is_exposed: bool,
    is_global_class_module: bool,
    has_predeclared_id: bool,
    supertype_names: Vec<String>,
    supertypes: Vec<DeclarationId>,
    subtypes: Vec<DeclarationId>,
    default_member: Option<DeclarationId>,
}

impl ClassModule {
    /// Compute the derived facts from the attribute bag.
    ///
    /// Fails if `VB_Exposed`, `VB_GlobalNamespace` or `VB_PredeclaredId`
    /// carries anything but a single value.
    pub fn new(attributes: &Attributes, options: ClassModuleOptions) -> Result<Self> {
        Ok(Self {
            options,
            is_exposed: options.exposed || attributes.flag(VB_EXPOSED)?,
            is_global_class_module: options.global || attributes.flag(VB_GLOBAL_NAMESPACE)?,
            has_predeclared_id: attributes.flag(VB_PREDECLARED_ID)?,
            supertype_names: Vec::new(),
            supertypes: Vec::new(),
            subtypes: Vec::new(),
            default_member: None,
        })
    }

    pub fn options(&self) -> ClassModuleOptions {
        self.options
    }

    /// Whether the class's public members can be reached from referencing projects.
    pub fn is_exposed(&self) -> bool {
        self.is_exposed
    }

    /// Whether the class's members are visible without qualification.
    pub fn is_global_class_module(&self) -> bool {
        self.is_global_class_module
    }

    /// Whether a default instance is addressable by the class name.
    /// Such classes resolve like procedural modules.
    pub fn has_predeclared_id(&self) -> bool {
        self.has_predeclared_id
    }

    pub fn has_default_instance_variable(&self) -> bool {
        self.has_predeclared_id || self.is_global_class_module
    }

    /// Interface names from `Implements` statements, in source order
    pub fn supertype_names(&self) -> &[String] {
        &self.supertype_names
    }

    pub fn supertypes(&self) -> &[DeclarationId] {
        &self.supertypes
    }

    pub fn subtypes(&self) -> &[DeclarationId] {
        &self.subtypes
    }

    pub fn default_member(&self) -> Option<DeclarationId> {
        self.default_member
    }

    pub fn set_default_member(&mut self, member: Option<DeclarationId>) {
        self.default_member = member;
    }

    pub fn add_supertype_name(&mut self, name: impl Into<String>) {
        self.supertype_names.push(name.into());
    }

    /// Record `supertype` as implemented by this class.
    ///
    /// Only this side of the edge is touched; the caller registers the
    /// subtype on the other class. Returns `false` if already present.
    pub fn add_supertype(&mut self, supertype: DeclarationId) -> bool {
        insert_unique(&mut self.supertypes, supertype)
    }

    /// Record `subtype` as implementing this class. One side only, see
    /// [`ClassModule::add_supertype`].
    pub fn add_subtype(&mut self, subtype: DeclarationId) -> bool {
        insert_unique(&mut self.subtypes, subtype)
    }
}

fn insert_unique(ids: &mut Vec<DeclarationId>, id: DeclarationId) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}
