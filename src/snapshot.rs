//! Snapshot documents - the serialized form of a declaration graph
//!
//! The construction phase (walking VBA sources) happens elsewhere and hands
//! its result over as a JSON or TOML document. Projects may reference each
//! other and classes may implement interfaces declared later in the
//! document: references and `Implements` names are only resolved after
//! every declaration exists.

use crate::attributes::{Attributes, VB_USER_MEM_ID};
use crate::class_module::ClassModuleOptions;
use crate::declaration::{Accessibility, DeclarationId, DeclarationType};
use crate::graph::DeclarationGraph;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub projects: Vec<ProjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    #[serde(default)]
    pub built_in: bool,
    /// Referenced project names, highest priority first
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Procedural,
    Class,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exposed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub global: bool,
    /// `Implements` names in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub name: String,
    pub kind: DeclarationType,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// UDT fields, enum members, parameters and locals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberSnapshot>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl GraphSnapshot {
    /// Read a snapshot file; `.toml` files are TOML, everything else JSON
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if is_toml(path) {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| Error::Snapshot(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Canonical JSON, used for fingerprinting
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

impl DeclarationGraph {
    /// Build a graph from a snapshot.
    ///
    /// Declarations are created first, then project references are
    /// attached and `Implements` names linked.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self> {
        let mut graph = DeclarationGraph::new();
        let mut projects: HashMap<String, DeclarationId> = HashMap::new();

        for project in &snapshot.projects {
            let key = project.name.to_ascii_lowercase();
            if projects.contains_key(&key) {
                return Err(Error::Integrity(format!("duplicate project '{}'", project.name)));
            }
            let id = graph.add_project(&project.name, project.built_in);
            projects.insert(key, id);
        }

        for project in &snapshot.projects {
            let project_id = projects[&project.name.to_ascii_lowercase()];
            for module in &project.modules {
                add_module(&mut graph, project_id, module)?;
            }
        }

        for project in &snapshot.projects {
            let project_id = projects[&project.name.to_ascii_lowercase()];
            for reference in &project.references {
                let referenced = projects
                    .get(&reference.to_ascii_lowercase())
                    .copied()
                    .ok_or_else(|| {
                        Error::Integrity(format!(
                            "project '{}' references unknown project '{}'",
                            project.name, reference
                        ))
                    })?;
                graph.add_project_reference(project_id, referenced)?;
            }
        }

        let stats = graph.link_supertypes();
        tracing::info!(
            "Built graph with {} declarations ({} supertype edges, {} unresolved interfaces)",
            graph.len(),
            stats.linked,
            stats.unresolved.len()
        );
        Ok(graph)
    }

    /// The snapshot this graph would be built from
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let projects = self
            .projects()
            .map(|project| ProjectSnapshot {
                name: project.name.clone(),
                built_in: project.is_built_in,
                references: self
                    .referenced_projects(project.id)
                    .iter()
                    .filter_map(|id| self.get(*id))
                    .map(|referenced| referenced.name.clone())
                    .collect(),
                modules: self
                    .modules(project.id)
                    .map(|module| {
                        let class_module = module.as_class_module();
                        let options = class_module.map(|c| c.options()).unwrap_or_default();
                        ModuleSnapshot {
                            name: module.name.clone(),
                            kind: if class_module.is_some() { ModuleKind::Class } else { ModuleKind::Procedural },
                            accessibility: module.accessibility,
                            attributes: module.attributes.clone(),
                            exposed: options.exposed,
                            global: options.global,
                            implements: class_module
                                .map(|c| c.supertype_names().to_vec())
                                .unwrap_or_default(),
                            members: self.member_snapshots(module.id),
                        }
                    })
                    .collect(),
            })
            .collect();
        GraphSnapshot { projects }
    }

    fn member_snapshots(&self, parent: DeclarationId) -> Vec<MemberSnapshot> {
        self.children(parent)
            .map(|member| MemberSnapshot {
                name: member.name.clone(),
                kind: member.kind,
                accessibility: member.accessibility,
                attributes: member.attributes.clone(),
                members: self.member_snapshots(member.id),
            })
            .collect()
    }
}

fn add_module(graph: &mut DeclarationGraph, project: DeclarationId, module: &ModuleSnapshot) -> Result<()> {
    let id = match module.kind {
        ModuleKind::Procedural => graph.add_procedural_module(
            project,
            &module.name,
            module.accessibility,
            module.attributes.clone(),
        )?,
        ModuleKind::Class => {
            let options = ClassModuleOptions {
                exposed: module.exposed,
                global: module.global,
            };
            graph.add_class_module(project, &module.name, module.attributes.clone(), options)?
        }
    };

    let mut default_member = None;
    for member in &module.members {
        let member_id = add_member(graph, id, member)?;
        if member.attributes.single(VB_USER_MEM_ID)? == Some("0") {
            default_member = Some(member_id);
        }
    }

    if module.kind == ModuleKind::Class {
        let class_module = graph.class_module_mut(id)?;
        for name in &module.implements {
            class_module.add_supertype_name(name);
        }
        class_module.set_default_member(default_member);
    } else if !module.implements.is_empty() {
        return Err(Error::Integrity(format!(
            "procedural module '{}' cannot implement interfaces",
            module.name
        )));
    }
    Ok(())
}

fn add_member(graph: &mut DeclarationGraph, parent: DeclarationId, member: &MemberSnapshot) -> Result<DeclarationId> {
    let id = graph.add_member(
        parent,
        &member.name,
        member.kind,
        member.accessibility,
        member.attributes.clone(),
    )?;
    for nested in &member.members {
        add_member(graph, id, nested)?;
    }
    Ok(id)
}
