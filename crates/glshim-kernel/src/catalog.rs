//! Native catalog seam.
//!
//! The catalog is produced elsewhere (header/registry parsing is not a
//! kernel concern). The kernel only needs ordered parameters with types and
//! the return type of each function, looked up by canonical name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A native type in the catalog's neutral notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NativeType {
    Void,
    Scalar(String),
    Pointer(Box<NativeType>),
}

impl NativeType {
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    /// Default exposed type.
    pub fn exposed(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Scalar(name) => name.clone(),
            Self::Pointer(inner) => match inner.as_ref() {
                Self::Void => "pointer".to_string(),
                Self::Scalar(name) if is_byte_like(name) => "bytes".to_string(),
                other => format!("sequence<{}>", other.exposed()),
            },
        }
    }

    /// Exposed type when the pointer carries one value.
    pub fn exposed_single(&self) -> String {
        match self {
            Self::Pointer(inner) if !inner.is_void() => inner.exposed(),
            other => other.exposed(),
        }
    }
}

fn is_byte_like(name: &str) -> bool {
    matches!(name, "char" | "byte" | "uint8")
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Scalar(name) => f.write_str(name),
            Self::Pointer(inner) => write!(f, "*{inner}"),
        }
    }
}

impl FromStr for NativeType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("const ").unwrap_or(trimmed).trim();
        if let Some(rest) = trimmed.strip_prefix('*') {
            return Ok(Self::Pointer(Box::new(rest.parse()?)));
        }
        if trimmed.is_empty() {
            return Err(format!("invalid native type `{raw}`"));
        }
        if trimmed == "void" {
            return Ok(Self::Void);
        }
        if trimmed
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        {
            return Err(format!("invalid native type `{raw}`"));
        }
        Ok(Self::Scalar(trimmed.to_string()))
    }
}

impl TryFrom<String> for NativeType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NativeType> for String {
    fn from(value: NativeType) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: NativeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeFunction {
    pub name: String,
    #[serde(default)]
    pub params: Vec<NativeParam>,
    #[serde(default = "void_type")]
    pub returns: NativeType,
}

fn void_type() -> NativeType {
    NativeType::Void
}

impl NativeFunction {
    pub fn param(&self, name: &str) -> Option<&NativeParam> {
        self.params.iter().find(|param| param.name == name)
    }
}

/// Lookup surface the kernel consumes.
pub trait NativeCatalog: Send + Sync {
    fn function(&self, name: &str) -> Option<&NativeFunction>;

    /// All function names, sorted.
    fn function_names(&self) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog json: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Shape(String),

    #[error("duplicate catalog function: {0}")]
    DuplicateFunction(String),
}

/// In-memory catalog keyed by function name.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    functions: BTreeMap<String, NativeFunction>,
}

impl MemoryCatalog {
    pub fn from_functions(functions: Vec<NativeFunction>) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        for function in functions {
            if index.contains_key(&function.name) {
                return Err(CatalogError::DuplicateFunction(function.name));
            }
            index.insert(function.name.clone(), function);
        }
        Ok(Self { functions: index })
    }

    /// Accepts `{"functions": [...]}` or a bare array.
    pub fn from_json_value(raw: Value) -> Result<Self, CatalogError> {
        let rows = match raw {
            Value::Array(rows) => rows,
            Value::Object(mut obj) => match obj.remove("functions") {
                Some(Value::Array(rows)) => rows,
                Some(_) => return Err(CatalogError::Shape("`functions` must be an array".into())),
                None => {
                    return Err(CatalogError::Shape(
                        "object root must contain a `functions` array".into(),
                    ));
                }
            },
            _ => return Err(CatalogError::Shape("root must be an array or object".into())),
        };
        let functions = rows
            .into_iter()
            .map(serde_json::from_value::<NativeFunction>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_functions(functions)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl NativeCatalog for MemoryCatalog {
    fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}
