//! Component descriptor model.
//!
//! A component is a single script plus the metadata needed to package it:
//! its identity (name, namespace, version), the authors, the typed arguments
//! of its command-line surface, the commands it expects to find on `PATH`,
//! the resource files shipped alongside the script, and the engines it can
//! be executed under.

use crate::engine::EngineSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A component author, rendered into generated image metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Full name
    pub name: String,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Roles such as "author" or "maintainer"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{}>", self.name, email),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Data direction of a file argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The file is read by the component
    #[default]
    Input,
    /// The file is produced by the component
    Output,
}

/// A file-typed argument. File arguments participate in host↔container
/// path translation; output files are additionally queued for ownership
/// fixup after a containerized run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileArgument {
    /// Flag name as declared, e.g. `--input`
    pub name: String,
    #[serde(default)]
    /// Whether the component reads or writes this file
    pub direction: Direction,
    /// Whether the argument must be provided
    #[serde(default)]
    pub required: bool,
    /// Whether the argument accepts multiple separator-joined values
    #[serde(default)]
    pub multiple: bool,
    /// Separator for multiple values
    #[serde(default = "default_multiple_sep")]
    pub multiple_sep: char,
    /// Default value when the argument is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A plain value argument (string, integer, double or boolean).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueArgument {
    /// Flag name as declared, e.g. `--threads`
    pub name: String,
    /// Whether the argument must be provided
    #[serde(default)]
    pub required: bool,
    /// Whether the argument accepts multiple separator-joined values
    #[serde(default)]
    pub multiple: bool,
    /// Separator for multiple values
    #[serde(default = "default_multiple_sep")]
    pub multiple_sep: char,
    /// Default value when the argument is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_multiple_sep() -> char {
    ';'
}

/// A declared component argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Argument {
    /// File or directory path
    File(FileArgument),
    /// Free-form string
    String(ValueArgument),
    /// Integer value
    Integer(ValueArgument),
    /// Floating-point value
    Double(ValueArgument),
    /// Boolean value
    Boolean(ValueArgument),
}

impl Argument {
    /// Flag name as declared, e.g. `--input`.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(a) => &a.name,
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => &a.name,
        }
    }

    /// Flag name with leading dashes stripped, usable as a shell
    /// identifier suffix.
    #[must_use]
    pub fn plain_name(&self) -> &str {
        self.name().trim_start_matches('-')
    }

    /// Whether the argument must be provided.
    #[must_use]
    pub fn required(&self) -> bool {
        match self {
            Self::File(a) => a.required,
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => a.required,
        }
    }

    /// Whether the argument accepts multiple separator-joined values.
    #[must_use]
    pub fn multiple(&self) -> bool {
        match self {
            Self::File(a) => a.multiple,
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => a.multiple,
        }
    }

    /// Separator for multiple values.
    #[must_use]
    pub fn multiple_sep(&self) -> char {
        match self {
            Self::File(a) => a.multiple_sep,
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => {
                a.multiple_sep
            }
        }
    }

    /// Default value when the argument is omitted.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        match self {
            Self::File(a) => a.default.as_deref(),
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => {
                a.default.as_deref()
            }
        }
    }

    /// Help text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::File(a) => a.description.as_deref(),
            Self::String(a) | Self::Integer(a) | Self::Double(a) | Self::Boolean(a) => {
                a.description.as_deref()
            }
        }
    }

    /// The file view of this argument, if it is file-typed.
    #[must_use]
    pub fn as_file(&self) -> Option<&FileArgument> {
        match self {
            Self::File(a) => Some(a),
            _ => None,
        }
    }
}

/// A resource file shipped alongside the component script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Path relative to the component config file
    pub path: String,
}

/// The read-only component descriptor this crate generates wrappers for.
///
/// The first resource is the main script; remaining resources are support
/// files copied next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Component name
    pub name: String,
    /// Optional namespace grouping related components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Component version, used as the default image tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// One-line description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Component authors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    /// Declared command-line arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    /// Commands the component expects on `PATH` inside its image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Resource files; the first entry is the main script
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    /// Engines the component can execute under; the first is the default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engines: Vec<EngineSpec>,
}

impl ComponentDescriptor {
    /// The main script resource, if any resources are declared.
    #[must_use]
    pub fn main_script(&self) -> Option<&str> {
        self.resources.first().map(|r| r.path.as_str())
    }

    /// Namespace-qualified name joined with `separator`.
    #[must_use]
    pub fn full_name(&self, separator: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}{separator}{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Directory inside a container where resources are made available.
    #[must_use]
    pub fn container_dir(&self) -> String {
        format!("/capsule/{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_arg(name: &str, direction: Direction) -> Argument {
        Argument::File(FileArgument {
            name: name.to_string(),
            direction,
            required: false,
            multiple: false,
            multiple_sep: ';',
            default: None,
            description: None,
        })
    }

    #[test]
    fn plain_name_strips_dashes() {
        let arg = file_arg("--input", Direction::Input);
        assert_eq!(arg.plain_name(), "input");
        assert_eq!(arg.name(), "--input");
    }

    #[test]
    fn full_name_joins_namespace() {
        let descriptor = ComponentDescriptor {
            name: "align".to_string(),
            namespace: Some("mapping".to_string()),
            version: None,
            description: None,
            authors: Vec::new(),
            arguments: Vec::new(),
            dependencies: Vec::new(),
            resources: Vec::new(),
            engines: Vec::new(),
        };
        assert_eq!(descriptor.full_name("/"), "mapping/align");
        assert_eq!(descriptor.full_name("_"), "mapping_align");
    }

    #[test]
    fn author_display_includes_email() {
        let author = Author {
            name: "Jane Doe".to_string(),
            email: Some("jane@example.com".to_string()),
            roles: vec!["maintainer".to_string()],
        };
        assert_eq!(author.to_string(), "Jane Doe <jane@example.com>");
    }
}
