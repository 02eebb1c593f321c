//! # glshim Kernel
//!
//! Tweak-driven signature transformation: a native prototype plus a
//! declarative descriptor becomes an idiomatic wrapper description that an
//! external renderer turns into source text.
//!
//! This crate is **target-agnostic**: it never emits final syntax, file
//! paths or packages. It only decides which parameters are exposed, in what
//! order, under which names and types, and what the snippets around the
//! native call say.
//!
//! ## Architecture
//!
//! ```text
//! TweakRegistry         ← descriptors by name, copy chains resolved once
//!     │
//! classify_parameters   ← name fixes + per-parameter tweaks → roles/types
//!     │
//! compose_signature     ← inputs, results, native call arguments
//!     │
//! expand_snippet        ← before / after / doc templates
//!     │
//! Generator             ← one function, or the whole catalog in parallel
//! ```

pub mod catalog;
pub mod classify;
pub mod compose;
pub mod descriptor;
pub mod error;
pub mod generate;
pub mod normalize;
pub mod registry;
pub mod template;

pub use catalog::{
    CatalogError, MemoryCatalog, NativeCatalog, NativeFunction, NativeParam, NativeType,
};
pub use classify::{ClassifiedParameter, ParamRole, classify_parameters};
pub use compose::{
    InputParam, NativeCall, ResultEntry, ResultShape, Signature, compose_native_call,
    compose_signature,
};
pub use descriptor::{FunctionDescriptor, ParameterTweak, ResolvedDescriptor};
pub use error::{ConfigError, GenerationError, SnippetKind, TemplateError, failure_class};
pub use generate::{
    FunctionWrapper, GENERATION_REPORT_KIND, GenerateOptions, GenerationIssue, GenerationReport,
    Generator,
};
pub use normalize::{PARAM_NAME_FIXES, normalize_param_name};
pub use registry::TweakRegistry;
pub use template::{TemplateView, dedent};
