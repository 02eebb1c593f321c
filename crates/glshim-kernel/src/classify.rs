//! Parameter classification.
//!
//! Applies a resolved descriptor's parameter tweaks to a native signature.
//! Tweaks are keyed by the original native parameter name; name fixes from
//! [`crate::normalize`] only shape the exposed and call-site identifiers.

use crate::catalog::{NativeFunction, NativeType};
use crate::descriptor::{ParameterTweak, ResolvedDescriptor};
use crate::error::ConfigError;
use crate::normalize::normalize_param_name;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRole {
    Input,
    Output,
    Omitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedParameter {
    pub native_name: String,
    pub native_type: NativeType,
    pub exposed_name: String,
    pub exposed_type: String,
    /// Pointee of the native type, or the type itself for scalars. Ignores
    /// `retype`.
    pub element_type: String,
    pub role: ParamRole,
    /// Identifier the native call site passes for this parameter.
    pub call_name: String,
    /// Call site goes through a shadow variable.
    pub replaced: bool,
    pub unnamed: bool,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
    })
}

pub fn is_identifier(name: &str) -> bool {
    identifier_re().is_match(name)
}

/// Classify every native parameter of `native`, in declaration order.
///
/// Every tweak is checked before anything is classified; all problems are
/// returned together.
pub fn classify_parameters(
    native: &NativeFunction,
    descriptor: &ResolvedDescriptor,
    shadow_suffix: &str,
) -> Result<Vec<ClassifiedParameter>, Vec<ConfigError>> {
    let mut errors = Vec::new();
    for (name, tweak) in &descriptor.params {
        match native.param(name) {
            Some(param) => validate_tweak(&descriptor.name, name, &param.ty, tweak, &mut errors),
            None => errors.push(ConfigError::UnknownParameter {
                function: descriptor.name.clone(),
                parameter: name.clone(),
            }),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let untweaked = ParameterTweak::default();
    let classified = native
        .params
        .iter()
        .map(|param| {
            let tweak = descriptor.params.get(&param.name).unwrap_or(&untweaked);
            classify_one(&param.name, &param.ty, tweak, shadow_suffix)
        })
        .collect();
    Ok(classified)
}

fn validate_tweak(
    function: &str,
    parameter: &str,
    native_type: &NativeType,
    tweak: &ParameterTweak,
    errors: &mut Vec<ConfigError>,
) {
    if tweak.output && tweak.omit {
        errors.push(ConfigError::ConflictingRoles {
            function: function.to_string(),
            parameter: parameter.to_string(),
        });
    }
    if let Some(rename) = &tweak.rename
        && !is_identifier(rename)
    {
        errors.push(ConfigError::InvalidIdentifier {
            function: function.to_string(),
            parameter: parameter.to_string(),
            value: rename.clone(),
        });
    }
    if tweak.single && !native_type.is_pointer() {
        errors.push(ConfigError::SingleOnScalar {
            function: function.to_string(),
            parameter: parameter.to_string(),
            native_type: native_type.to_string(),
        });
    }
}

fn classify_one(
    native_name: &str,
    native_type: &NativeType,
    tweak: &ParameterTweak,
    shadow_suffix: &str,
) -> ClassifiedParameter {
    let base_name = normalize_param_name(native_name);
    let exposed_name = tweak.rename.as_deref().unwrap_or(base_name).to_string();

    let exposed_type = match &tweak.retype {
        Some(retype) => retype.clone(),
        None if tweak.single => native_type.exposed_single(),
        None => native_type.exposed(),
    };

    let role = if tweak.omit {
        ParamRole::Omitted
    } else if tweak.output {
        ParamRole::Output
    } else {
        ParamRole::Input
    };

    let call_name = if tweak.replace {
        format!("{base_name}{shadow_suffix}")
    } else {
        base_name.to_string()
    };

    ClassifiedParameter {
        native_name: native_name.to_string(),
        native_type: native_type.clone(),
        exposed_name,
        exposed_type,
        element_type: native_type.exposed_single(),
        role,
        call_name,
        replaced: tweak.replace,
        unnamed: tweak.unnamed,
    }
}
