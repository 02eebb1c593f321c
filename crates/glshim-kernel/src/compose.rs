//! Signature composition.
//!
//! Builds the exposed input list, the result list and the native call
//! description from classified parameters. Order-preserving: inputs keep
//! native order, outputs trail the declared result in native order.

use crate::catalog::{NativeFunction, NativeType};
use crate::classify::{ClassifiedParameter, ParamRole};
use crate::descriptor::ResolvedDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    /// `None` for the declared result and for `unnamed` outputs.
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

impl fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} {}", self.ty),
            None => f.write_str(&self.ty),
        }
    }
}

/// How a result list is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape<'a> {
    None,
    Single(&'a ResultEntry),
    Tuple(&'a [ResultEntry]),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub inputs: Vec<InputParam>,
    pub results: Vec<ResultEntry>,
}

impl Signature {
    pub fn result_shape(&self) -> ResultShape<'_> {
        match self.results.as_slice() {
            [] => ResultShape::None,
            [single] => ResultShape::Single(single),
            many => ResultShape::Tuple(many),
        }
    }

    /// Neutral text form, e.g. `(n int32) -> sequence<Buffer>`.
    pub fn render(&self) -> String {
        let inputs = self
            .inputs
            .iter()
            .map(|param| format!("{} {}", param.name, param.ty))
            .collect::<Vec<_>>()
            .join(", ");
        match self.result_shape() {
            ResultShape::None => format!("({inputs})"),
            ResultShape::Single(entry) => format!("({inputs}) -> {entry}"),
            ResultShape::Tuple(entries) => {
                let rendered = entries
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({inputs}) -> ({rendered})")
            }
        }
    }
}

/// Inputs a renderer needs to build the native call expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCall {
    pub function: String,
    /// One identifier per native parameter, native order.
    pub args: Vec<String>,
    pub returns: NativeType,
}

pub fn compose_signature(
    descriptor: &ResolvedDescriptor,
    native: &NativeFunction,
    params: &[ClassifiedParameter],
) -> Signature {
    let inputs = params
        .iter()
        .filter(|param| param.role == ParamRole::Input)
        .map(|param| InputParam {
            name: param.exposed_name.clone(),
            ty: param.exposed_type.clone(),
        })
        .collect();

    let declared = if !descriptor.result.trim().is_empty() {
        Some(descriptor.result.trim().to_string())
    } else if !native.returns.is_void() {
        Some(native.returns.exposed())
    } else {
        None
    };

    let results = declared
        .into_iter()
        .map(|ty| ResultEntry { name: None, ty })
        .chain(
            params
                .iter()
                .filter(|param| param.role == ParamRole::Output)
                .map(|param| ResultEntry {
                    name: (!param.unnamed).then(|| param.exposed_name.clone()),
                    ty: param.exposed_type.clone(),
                }),
        )
        .collect();

    Signature { inputs, results }
}

pub fn compose_native_call(native: &NativeFunction, params: &[ClassifiedParameter]) -> NativeCall {
    NativeCall {
        function: native.name.clone(),
        args: params.iter().map(|param| param.call_name.clone()).collect(),
        returns: native.returns.clone(),
    }
}
