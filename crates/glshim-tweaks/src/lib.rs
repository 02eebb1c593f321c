//! Descriptor tables.
//!
//! A table is TOML with one `[[function]]` entry per tweaked function:
//!
//! ```toml
//! [[function]]
//! name = "GenBuffers"
//! before = "let mut buffers = vec![Buffer::default(); n as usize];"
//!
//! [function.params.buffers]
//! output = true
//! unnamed = true
//! retype = "sequence<Buffer>"
//! ```
//!
//! The built-in GL table ships embedded in the crate.

use glshim_kernel::{ConfigError, FunctionDescriptor, TweakRegistry};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Source of the built-in table.
pub const BUILTIN_TWEAKS: &str = include_str!("../data/tweaks.toml");

#[derive(Debug, Error)]
pub enum TweakTableError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TweakTable {
    #[serde(default)]
    function: Vec<FunctionDescriptor>,
}

/// Parse a table into descriptors, in file order.
///
/// `origin` only labels errors.
pub fn parse_tweak_table(
    text: &str,
    origin: &str,
) -> Result<Vec<FunctionDescriptor>, TweakTableError> {
    let table: TweakTable = toml::from_str(text).map_err(|source| TweakTableError::ParseToml {
        path: origin.to_string(),
        source,
    })?;
    Ok(table.function)
}

/// Build a registry from table text.
pub fn registry_from_str(text: &str, origin: &str) -> Result<TweakRegistry, TweakTableError> {
    let descriptors = parse_tweak_table(text, origin)?;
    tracing::debug!(origin, descriptors = descriptors.len(), "tweak table parsed");
    Ok(TweakRegistry::from_descriptors(descriptors)?)
}

/// Load a table file into a registry.
pub fn load_tweak_table(path: impl AsRef<Path>) -> Result<TweakRegistry, TweakTableError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TweakTableError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    registry_from_str(&text, &path.display().to_string())
}

/// Registry over the built-in GL table.
pub fn builtin_registry() -> Result<TweakRegistry, TweakTableError> {
    registry_from_str(BUILTIN_TWEAKS, "<builtin>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_functions_and_parameter_tweaks() {
        let descriptors = parse_tweak_table(
            r#"
[[function]]
name = "GenBuffers"
before = "let mut buffers = vec![Buffer::default(); n as usize];"

[function.params.buffers]
output = true
unnamed = true
retype = "sequence<Buffer>"

[[function]]
name = "GetUniformiv"
copy = "GetUniformfv"
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(descriptors.len(), 2);
        let buffers = &descriptors[0].params["buffers"];
        assert!(buffers.output && buffers.unnamed);
        assert_eq!(buffers.retype.as_deref(), Some("sequence<Buffer>"));
        assert_eq!(descriptors[1].copy.as_deref(), Some("GetUniformfv"));
    }

    #[test]
    fn empty_table_is_valid() {
        assert!(parse_tweak_table("", "inline").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_tweak_table(
            r#"
[[function]]
name = "Accum"
docs = "typo"
"#,
            "inline",
        )
        .unwrap_err();
        assert!(matches!(err, TweakTableError::ParseToml { ref path, .. } if path == "inline"));

        let err = parse_tweak_table(
            r#"
[[function]]
name = "GenBuffers"

[function.params.buffers]
outptu = true
"#,
            "inline",
        )
        .unwrap_err();
        assert!(matches!(err, TweakTableError::ParseToml { .. }));
    }

    #[test]
    fn duplicate_descriptors_reject_the_table() {
        let err = registry_from_str(
            r#"
[[function]]
name = "Accum"

[[function]]
name = "Accum"
"#,
            "inline",
        )
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Accum: duplicate descriptor");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_tweak_table("/nonexistent/glshim/tweaks.toml").unwrap_err();
        assert!(matches!(
            err,
            TweakTableError::ReadFile { ref path, .. } if path.ends_with("tweaks.toml")
        ));
    }

    #[test]
    fn builtin_table_builds_and_resolves_copies() {
        let registry = builtin_registry().unwrap();
        assert!(registry.contains("GenBuffers"));
        for name in registry.names() {
            assert!(registry.resolve(name).is_ok(), "{name} must resolve");
        }
        let iv = registry.resolve("GetVertexAttribiv").unwrap();
        assert_eq!(iv.copied_from, vec!["GetVertexAttribdv".to_string()]);
        assert!(iv.params["params"].replace);
    }
}
