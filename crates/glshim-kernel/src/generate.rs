//! Per-function generation pipeline and batch runs.
//!
//! One function is generated as a unit: copy resolution, classification,
//! composition, then expansion of the three snippets. A function that fails
//! reports every problem found at the failing stage, not just the first.
//! Functions are independent of each other, so a batch run fans out over
//! `rayon` and folds every outcome into one [`GenerationReport`].

use crate::catalog::{NativeCatalog, NativeFunction};
use crate::classify::{ClassifiedParameter, classify_parameters};
use crate::compose::{NativeCall, Signature, compose_native_call, compose_signature};
use crate::descriptor::ResolvedDescriptor;
use crate::error::{ConfigError, GenerationError, SnippetKind};
use crate::registry::TweakRegistry;
use crate::template::{TemplateView, expand_snippet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const GENERATION_REPORT_KIND: &str = "glshim.generation_report.v1";
pub const GENERATION_REPORT_SCHEMA: u32 = 1;
const REPORT_DIGEST_PREFIX: &str = "gr1_";

pub const DEFAULT_API_LABEL: &str = "GL";
pub const DEFAULT_SHADOW_SUFFIX: &str = "_c";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// API name used by `funcSince`.
    pub api_label: String,
    /// Appended to the call-site name of `replace` parameters.
    pub shadow_suffix: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            api_label: DEFAULT_API_LABEL.to_string(),
            shadow_suffix: DEFAULT_SHADOW_SUFFIX.to_string(),
        }
    }
}

/// Everything a renderer needs to emit one wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionWrapper {
    pub name: String,
    #[serde(default)]
    pub copied_from: Vec<String>,
    pub signature: Signature,
    pub call: NativeCall,
    pub params: Vec<ClassifiedParameter>,
    pub before: String,
    pub after: String,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationIssue {
    pub function: String,
    pub failure_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SnippetKind>,
    pub message: String,
}

impl GenerationIssue {
    fn from_error(function: &str, err: &GenerationError) -> Self {
        Self {
            function: function.to_string(),
            failure_class: err.failure_class().to_string(),
            snippet: err.snippet(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub schema: u32,
    pub report_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub functions: Vec<FunctionWrapper>,
    pub issues: Vec<GenerationIssue>,
    pub digest: String,
}

impl GenerationReport {
    fn from_outcomes(
        mut functions: Vec<FunctionWrapper>,
        mut issues: Vec<GenerationIssue>,
    ) -> Self {
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        issues.sort_by(|a, b| {
            (&a.function, &a.failure_class, &a.message).cmp(&(
                &b.function,
                &b.failure_class,
                &b.message,
            ))
        });
        let failure_classes: Vec<String> = issues
            .iter()
            .map(|issue| issue.failure_class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let digest = format!(
            "{REPORT_DIGEST_PREFIX}{}",
            digest_serializable(&functions)
        );
        Self {
            schema: GENERATION_REPORT_SCHEMA,
            report_kind: GENERATION_REPORT_KIND.to_string(),
            result: if issues.is_empty() {
                "accepted".to_string()
            } else {
                "rejected".to_string()
            },
            failure_classes,
            functions,
            issues,
            digest,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionWrapper> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Names of functions with at least one issue, sorted and unique.
    pub fn failed_functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .issues
            .iter()
            .map(|issue| issue.function.as_str())
            .collect();
        names.dedup();
        names
    }
}

fn digest_serializable<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut digest = Sha256::new();
    digest.update(&bytes);
    let output = digest.finalize();
    let mut rendered = String::with_capacity(output.len() * 2);
    for byte in output {
        rendered.push_str(format!("{byte:02x}").as_str());
    }
    rendered
}

/// A function ready for expansion.
struct Prepared {
    descriptor: Arc<ResolvedDescriptor>,
    native: NativeFunction,
    params: Vec<ClassifiedParameter>,
}

/// Shared, read-only generation state. Cloning is cheap.
#[derive(Clone)]
pub struct Generator {
    registry: Arc<TweakRegistry>,
    catalog: Arc<dyn NativeCatalog>,
    options: Arc<GenerateOptions>,
}

impl Generator {
    pub fn new(registry: Arc<TweakRegistry>, catalog: Arc<dyn NativeCatalog>) -> Self {
        Self {
            registry,
            catalog,
            options: Arc::new(GenerateOptions::default()),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn registry(&self) -> &TweakRegistry {
        &self.registry
    }

    /// Resolved descriptor for a function, or the identity descriptor when
    /// the function is in the catalog but has no tweaks.
    pub fn descriptor_for(&self, name: &str) -> Result<Arc<ResolvedDescriptor>, ConfigError> {
        match self.registry.lookup(name) {
            Some(resolved) => resolved,
            None if self.catalog.function(name).is_some() => {
                Ok(Arc::new(ResolvedDescriptor::identity(name)))
            }
            None => Err(ConfigError::UnknownFunction {
                function: name.to_string(),
            }),
        }
    }

    fn prepare(&self, name: &str) -> Result<Prepared, Vec<GenerationError>> {
        let descriptor = self
            .descriptor_for(name)
            .map_err(|err| vec![GenerationError::from(err)])?;
        let native = self.catalog.function(name).cloned().ok_or_else(|| {
            vec![GenerationError::from(ConfigError::UnknownFunction {
                function: name.to_string(),
            })]
        })?;
        let params = classify_parameters(&native, &descriptor, &self.options.shadow_suffix)
            .map_err(|errors| errors.into_iter().map(GenerationError::from).collect::<Vec<_>>())?;
        Ok(Prepared {
            descriptor,
            native,
            params,
        })
    }

    fn view(&self, prepared: &Prepared) -> TemplateView {
        TemplateView {
            name: prepared.descriptor.name.clone(),
            copied_from: prepared.descriptor.copied_from.clone(),
            result: prepared.descriptor.result.clone(),
            api_label: self.options.api_label.clone(),
            params: prepared
                .params
                .iter()
                .map(|param| (param.native_name.clone(), param.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Generate one function.
    ///
    /// On failure every error of the failing stage is returned: all bad
    /// tweaks, or all broken snippets.
    pub fn generate(&self, name: &str) -> Result<FunctionWrapper, Vec<GenerationError>> {
        let _span = tracing::debug_span!("generate", function = %name).entered();
        let prepared = self.prepare(name)?;
        let signature = compose_signature(&prepared.descriptor, &prepared.native, &prepared.params);
        let call = compose_native_call(&prepared.native, &prepared.params);

        let view = self.view(&prepared);
        let mut snippets = BTreeMap::new();
        let mut errors = Vec::new();
        for kind in SnippetKind::ALL {
            let source = prepared.descriptor.snippet(kind);
            match expand_snippet(self, kind, source, &view, &[]) {
                Ok(text) => {
                    snippets.insert(kind, text);
                }
                Err(err) => errors.push(GenerationError::from(err)),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        tracing::debug!(signature = %signature.render(), "composed");

        let mut take = |kind| snippets.remove(&kind).unwrap_or_default();
        Ok(FunctionWrapper {
            name: prepared.descriptor.name.clone(),
            copied_from: prepared.descriptor.copied_from.clone(),
            before: take(SnippetKind::Before),
            after: take(SnippetKind::After),
            doc: take(SnippetKind::Doc),
            signature,
            call,
            params: prepared.params,
        })
    }

    /// Expanded doc of `name` in its own context; backs `copyDoc`.
    pub(crate) fn expanded_doc(
        &self,
        name: &str,
        chain: &[String],
    ) -> Result<String, Vec<GenerationError>> {
        let prepared = self.prepare(name)?;
        let view = self.view(&prepared);
        expand_snippet(self, SnippetKind::Doc, &prepared.descriptor.doc, &view, chain)
            .map_err(|err| vec![GenerationError::from(err)])
    }

    /// Every catalog function plus every descriptor, so descriptors for
    /// functions missing from the catalog are reported.
    pub fn all_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.catalog.function_names().into_iter().collect();
        names.extend(self.registry.names().map(ToOwned::to_owned));
        names.into_iter().collect()
    }

    /// Generate the whole catalog.
    pub fn generate_all(&self) -> GenerationReport {
        self.generate_selected(&self.all_names())
    }

    /// Generate the named functions. Failures are collected, never fatal to
    /// the rest of the batch.
    pub fn generate_selected(&self, names: &[String]) -> GenerationReport {
        tracing::info!(functions = names.len(), "generating");
        let outcomes: Vec<(String, Result<FunctionWrapper, Vec<GenerationError>>)> = names
            .par_iter()
            .map(|name| (name.clone(), self.generate(name)))
            .collect();

        let mut functions = Vec::with_capacity(outcomes.len());
        let mut issues = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(wrapper) => functions.push(wrapper),
                Err(errors) => {
                    for err in errors {
                        tracing::warn!(function = %name, error = %err, "generation failed");
                        issues.push(GenerationIssue::from_error(&name, &err));
                    }
                }
            }
        }
        let report = GenerationReport::from_outcomes(functions, issues);
        tracing::info!(
            generated = report.functions.len(),
            failed = report.failed_functions().len(),
            issues = report.issues.len(),
            result = %report.result,
            "generation finished"
        );
        report
    }
}
