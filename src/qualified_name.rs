//! Qualified names - project-rooted identity of every declaration
//!
//! Format: `<project>[.<module>[.<member>...]]`
//!
//! Examples:
//! - `VBAProject`
//! - `VBAProject.Module1`
//! - `VBAProject.Module1.CustomerRecord.Name`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project / module / member path of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Project name
    pub project: String,
    /// Module name, absent for the project itself
    pub module: Option<String>,
    /// Member path below the module (UDT, then UDT member, ...)
    pub members: Vec<String>,
}

impl QualifiedName {
    /// Name of a project
    pub fn project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            module: None,
            members: Vec::new(),
        }
    }

    /// Name of a module inside `project`
    pub fn module(project: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            module: Some(module.into()),
            members: Vec::new(),
        }
    }

    /// Name of a declaration nested directly below this one
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut child = self.clone();
        if child.module.is_none() {
            child.module = Some(name.into());
        } else {
            child.members.push(name.into());
        }
        child
    }

    /// Identifier of the named declaration (last segment)
    pub fn name(&self) -> &str {
        self.members
            .last()
            .map(String::as_str)
            .or(self.module.as_deref())
            .unwrap_or(&self.project)
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        1 + usize::from(self.module.is_some()) + self.members.len()
    }

    /// Parse a dotted name
    pub fn parse(name: &str) -> Result<Self> {
        let mut segments = name.split('.').map(str::trim);

        let project = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidName(format!("Empty project name in '{}'", name)))?;

        let mut qualified = Self::project(project);
        for segment in segments {
            if segment.is_empty() {
                return Err(Error::InvalidName(format!("Empty segment in '{}'", name)));
            }
            qualified = qualified.child(segment);
        }
        Ok(qualified)
    }

    /// Convert to the dotted string form
    pub fn to_name_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.depth());
        parts.push(self.project.as_str());
        if let Some(module) = &self.module {
            parts.push(module.as_str());
        }
        parts.extend(self.members.iter().map(String::as_str));
        parts.join(".")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name_string())
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for QualifiedName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_name_string())
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QualifiedName::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        let name = QualifiedName::module("VBAProject", "Module1").child("Customer");
        assert_eq!(name.to_name_string(), "VBAProject.Module1.Customer");
        assert_eq!(QualifiedName::parse("VBAProject.Module1.Customer").unwrap(), name);
    }

    #[test]
    fn test_name_parse() {
        let name = QualifiedName::parse("Lib.Shapes.Kind.Circle").unwrap();
        assert_eq!(name.project, "Lib");
        assert_eq!(name.module.as_deref(), Some("Shapes"));
        assert_eq!(name.members, vec!["Kind", "Circle"]);
        assert_eq!(name.name(), "Circle");
        assert_eq!(name.depth(), 4);
    }

    #[test]
    fn test_project_only() {
        let name = QualifiedName::parse("VBAProject").unwrap();
        assert!(name.module.is_none());
        assert_eq!(name.name(), "VBAProject");
    }

    #[test]
    fn test_invalid_name() {
        assert!(QualifiedName::parse("").is_err());
        assert!(QualifiedName::parse("Project..Member").is_err());
        assert!(QualifiedName::parse(".Module").is_err());
    }
}
