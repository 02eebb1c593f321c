//! Per-function tweak descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tweaks for one native parameter, keyed by its original native name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ParameterTweak {
    /// Exposed name override. The native call keeps the original name, so
    /// the before snippet must bind it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    /// Pass `<name><suffix>` to the native call instead of the exposed value.
    #[serde(skip_serializing_if = "is_false")]
    pub replace: bool,

    /// Exposed type override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retype: Option<String>,

    /// Move the parameter from the input list to the result list.
    #[serde(skip_serializing_if = "is_false")]
    pub output: bool,

    /// Drop the identifier when the parameter is a result.
    #[serde(skip_serializing_if = "is_false")]
    pub unnamed: bool,

    /// Pointer carries one value, not a sequence.
    #[serde(skip_serializing_if = "is_false")]
    pub single: bool,

    /// Drop the parameter from the exposed signature entirely.
    #[serde(skip_serializing_if = "is_false")]
    pub omit: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One row of the tweak table, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParameterTweak>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub before: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A descriptor after copy-merging. Never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDescriptor {
    pub name: String,
    /// Descriptors inherited from, nearest first.
    #[serde(default)]
    pub copied_from: Vec<String>,
    #[serde(default)]
    pub params: BTreeMap<String, ParameterTweak>,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
    #[serde(default)]
    pub doc: String,
}

impl ResolvedDescriptor {
    /// The empty descriptor used for catalog functions without tweaks.
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn from_own(descriptor: &FunctionDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            copied_from: Vec::new(),
            params: descriptor.params.clone(),
            result: descriptor.result.clone(),
            before: descriptor.before.clone(),
            after: descriptor.after.clone(),
            doc: descriptor.doc.clone(),
        }
    }

    /// Merge `own` over an already-resolved `base`. Fields set on `own`
    /// win; params are merged per entry.
    pub(crate) fn merged(own: &FunctionDescriptor, base: &ResolvedDescriptor) -> Self {
        let mut params = base.params.clone();
        for (name, tweak) in &own.params {
            params.insert(name.clone(), tweak.clone());
        }

        let mut copied_from = Vec::with_capacity(base.copied_from.len() + 1);
        copied_from.push(base.name.clone());
        copied_from.extend(base.copied_from.iter().cloned());

        Self {
            name: own.name.clone(),
            copied_from,
            params,
            result: or_inherit(&own.result, &base.result),
            before: or_inherit(&own.before, &base.before),
            after: or_inherit(&own.after, &base.after),
            doc: or_inherit(&own.doc, &base.doc),
        }
    }

    pub fn snippet(&self, kind: crate::SnippetKind) -> &str {
        match kind {
            crate::SnippetKind::Before => &self.before,
            crate::SnippetKind::After => &self.after,
            crate::SnippetKind::Doc => &self.doc,
        }
    }
}

fn or_inherit(own: &str, base: &str) -> String {
    if own.trim().is_empty() {
        base.to_string()
    } else {
        own.to_string()
    }
}
