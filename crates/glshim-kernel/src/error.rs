//! Error types for glshim kernel operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable failure-class strings attached to every reported issue.
pub mod failure_class {
    pub const CONFIG_UNKNOWN_COPY_TARGET: &str = "config_unknown_copy_target";
    pub const CONFIG_COPY_CYCLE: &str = "config_copy_cycle";
    pub const CONFIG_UNKNOWN_PARAMETER: &str = "config_unknown_parameter";
    pub const CONFIG_CONFLICTING_ROLES: &str = "config_conflicting_roles";
    pub const CONFIG_UNKNOWN_FUNCTION: &str = "config_unknown_function";
    pub const CONFIG_NO_DESCRIPTOR: &str = "config_no_descriptor";
    pub const CONFIG_DUPLICATE_DESCRIPTOR: &str = "config_duplicate_descriptor";
    pub const CONFIG_INVALID_IDENTIFIER: &str = "config_invalid_identifier";
    pub const CONFIG_SINGLE_ON_SCALAR: &str = "config_single_on_scalar";
    pub const TEMPLATE_PARSE: &str = "template_parse";
    pub const TEMPLATE_EVAL: &str = "template_eval";
    pub const TEMPLATE_UNKNOWN_PARAMETER: &str = "template_unknown_parameter";
}

/// Descriptor table is malformed or inconsistent with the native catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `copy` names a descriptor that is not in the registry.
    #[error("{function}: unknown copy target `{target}`")]
    UnknownCopyTarget { function: String, target: String },

    /// A `copy` chain returns to a descriptor still being resolved.
    #[error("{function}: copy cycle {}", .cycle.join(" -> "))]
    CopyCycle { function: String, cycle: Vec<String> },

    /// A parameter tweak names a parameter the native signature lacks.
    #[error("{function}: unknown parameter `{parameter}`")]
    UnknownParameter { function: String, parameter: String },

    /// `output` and `omit` are both set on one parameter.
    #[error("{function}: parameter `{parameter}` is both output and omitted")]
    ConflictingRoles { function: String, parameter: String },

    /// Descriptor names a function absent from the native catalog.
    #[error("{function}: unknown function (not in native catalog)")]
    UnknownFunction { function: String },

    /// The registry holds no descriptor under this name.
    #[error("{function}: no descriptor")]
    NoDescriptor { function: String },

    /// Two descriptors share one name.
    #[error("{function}: duplicate descriptor")]
    DuplicateDescriptor { function: String },

    /// `rename` is not a valid identifier.
    #[error("{function}: parameter `{parameter}` renamed to invalid identifier `{value}`")]
    InvalidIdentifier {
        function: String,
        parameter: String,
        value: String,
    },

    /// `single` set on a parameter whose native type is not a pointer.
    #[error(
        "{function}: parameter `{parameter}` is marked single but has scalar type `{native_type}`"
    )]
    SingleOnScalar {
        function: String,
        parameter: String,
        native_type: String,
    },
}

impl ConfigError {
    pub fn function(&self) -> &str {
        match self {
            Self::UnknownCopyTarget { function, .. }
            | Self::CopyCycle { function, .. }
            | Self::UnknownParameter { function, .. }
            | Self::ConflictingRoles { function, .. }
            | Self::UnknownFunction { function }
            | Self::NoDescriptor { function }
            | Self::DuplicateDescriptor { function }
            | Self::InvalidIdentifier { function, .. }
            | Self::SingleOnScalar { function, .. } => function,
        }
    }

    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::UnknownCopyTarget { .. } => failure_class::CONFIG_UNKNOWN_COPY_TARGET,
            Self::CopyCycle { .. } => failure_class::CONFIG_COPY_CYCLE,
            Self::UnknownParameter { .. } => failure_class::CONFIG_UNKNOWN_PARAMETER,
            Self::ConflictingRoles { .. } => failure_class::CONFIG_CONFLICTING_ROLES,
            Self::UnknownFunction { .. } => failure_class::CONFIG_UNKNOWN_FUNCTION,
            Self::NoDescriptor { .. } => failure_class::CONFIG_NO_DESCRIPTOR,
            Self::DuplicateDescriptor { .. } => failure_class::CONFIG_DUPLICATE_DESCRIPTOR,
            Self::InvalidIdentifier { .. } => failure_class::CONFIG_INVALID_IDENTIFIER,
            Self::SingleOnScalar { .. } => failure_class::CONFIG_SINGLE_ON_SCALAR,
        }
    }
}

/// Which of the three snippets a template error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetKind {
    Before,
    After,
    Doc,
}

impl SnippetKind {
    pub const ALL: [SnippetKind; 3] = [SnippetKind::Before, SnippetKind::After, SnippetKind::Doc];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snippet text could not be parsed or evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("{function} ({snippet}): template parse error: {message}")]
    Parse {
        function: String,
        snippet: SnippetKind,
        message: String,
    },

    #[error("{function} ({snippet}): template evaluation error: {message}")]
    Eval {
        function: String,
        snippet: SnippetKind,
        message: String,
    },

    /// `paramGoType` or `paramElemType` was asked for a parameter the
    /// function does not have.
    #[error("{function} ({snippet}): template references unknown parameter `{parameter}`")]
    UnknownParameter {
        function: String,
        snippet: SnippetKind,
        parameter: String,
    },
}

impl TemplateError {
    pub fn function(&self) -> &str {
        match self {
            Self::Parse { function, .. }
            | Self::Eval { function, .. }
            | Self::UnknownParameter { function, .. } => function,
        }
    }

    pub fn snippet(&self) -> SnippetKind {
        match self {
            Self::Parse { snippet, .. }
            | Self::Eval { snippet, .. }
            | Self::UnknownParameter { snippet, .. } => *snippet,
        }
    }

    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::Parse { .. } => failure_class::TEMPLATE_PARSE,
            Self::Eval { .. } => failure_class::TEMPLATE_EVAL,
            Self::UnknownParameter { .. } => failure_class::TEMPLATE_UNKNOWN_PARAMETER,
        }
    }
}

/// Any failure that aborts generation of one function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl GenerationError {
    pub fn function(&self) -> &str {
        match self {
            Self::Config(err) => err.function(),
            Self::Template(err) => err.function(),
        }
    }

    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::Config(err) => err.failure_class(),
            Self::Template(err) => err.failure_class(),
        }
    }

    pub fn snippet(&self) -> Option<SnippetKind> {
        match self {
            Self::Config(_) => None,
            Self::Template(err) => Some(err.snippet()),
        }
    }
}
