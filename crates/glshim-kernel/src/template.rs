//! Snippet expansion.
//!
//! `before`, `after` and `doc` are minijinja templates evaluated after copy
//! resolution and classification. The only context value is `this`, the
//! view of the function being generated, so inherited text always renders
//! against the inheriting function.
//!
//! ```text
//! {{ this.name }}                      the function being generated
//! {{ paramGoType(this, "params") }}    exposed type of a native parameter
//! {{ paramElemType(this, "params") }}  its element type (pointee of a pointer)
//! {{ copyDoc("GetUniformfv") }}        another function's expanded doc
//! {{ funcSince(this, "2.0+") }}        availability sentence
//! ```

use crate::classify::ClassifiedParameter;
use crate::error::{SnippetKind, TemplateError};
use crate::generate::Generator;
use minijinja::{Environment, Error, ErrorKind, State, UndefinedBehavior, Value, context};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Context value exposed to templates as `this`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    pub name: String,
    pub copied_from: Vec<String>,
    pub result: String,
    pub api_label: String,
    /// Keyed by original native parameter name.
    pub params: BTreeMap<String, ClassifiedParameter>,
}

/// Marker attached to helper errors so the expander can tell an unknown
/// parameter apart from other evaluation failures.
#[derive(Debug, thiserror::Error)]
#[error("unknown parameter `{0}`")]
struct UnknownTemplateParameter(String);

fn version_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+\.\d+)(\+?)$").expect("version tag regex must compile")
    })
}

/// Strip leading blank lines, common indentation and trailing whitespace.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|line| !line.is_empty());
    let Some(start) = start else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(lines.len(), |idx| idx + 1);
    let body = &lines[start..end];

    let indent = body
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|line| if line.is_empty() { *line } else { &line[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

fn tidy(rendered: &str) -> String {
    let lines: Vec<&str> = rendered.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |idx| idx + 1);
    lines[..end].join("\n")
}

fn param_field(helper: &str, field: &str, this: &Value, param: String) -> Result<String, Error> {
    let entry = this.get_attr("params")?.get_item(&Value::from(param.as_str()))?;
    if entry.is_undefined() || entry.is_none() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{helper}: unknown parameter `{param}`"),
        )
        .with_source(UnknownTemplateParameter(param)));
    }
    let value = entry.get_attr(field)?;
    value.as_str().map(ToOwned::to_owned).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("{helper}: parameter `{param}` has no {field}"),
        )
    })
}

fn param_go_type(this: Value, param: String) -> Result<String, Error> {
    param_field("paramGoType", "exposedType", &this, param)
}

fn param_elem_type(this: Value, param: String) -> Result<String, Error> {
    param_field("paramElemType", "elementType", &this, param)
}

fn func_since(this: Value, tag: String) -> Result<String, Error> {
    let name = this.get_attr("name")?;
    let api = this.get_attr("apiLabel")?;
    let (Some(name), Some(api)) = (name.as_str(), api.as_str()) else {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "funcSince: first argument must be the function view",
        ));
    };
    let Some(caps) = version_tag_re().captures(tag.trim()) else {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("funcSince: invalid version tag `{tag}`"),
        ));
    };
    let version = &caps[1];
    if caps[2].is_empty() {
        Ok(format!("{name} is available in {api} version {version}."))
    } else {
        Ok(format!(
            "{name} is available in {api} version {version} or greater."
        ))
    }
}

fn copy_chain(state: &State) -> Vec<String> {
    state
        .lookup("copyChain")
        .and_then(|chain| chain.try_iter().ok().map(|iter| iter.collect::<Vec<_>>()))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| item.as_str().map(ToOwned::to_owned))
        .collect()
}

fn environment<'source>(generator: &Generator) -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_function("paramGoType", param_go_type);
    env.add_function("paramElemType", param_elem_type);
    env.add_function("funcSince", func_since);

    let generator = generator.clone();
    env.add_function(
        "copyDoc",
        move |state: &State, other: String| -> Result<String, Error> {
            let chain = copy_chain(state);
            if chain.iter().any(|name| *name == other) {
                let mut cycle = chain.clone();
                cycle.push(other.clone());
                return Err(Error::new(
                    ErrorKind::InvalidOperation,
                    format!("copyDoc cycle {}", cycle.join(" -> ")),
                ));
            }
            generator.expanded_doc(&other, &chain).map_err(|errors| {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("copyDoc(\"{other}\"): {}", messages.join("; ")),
                )
            })
        },
    );
    env
}

/// Expand one snippet of `view`'s function.
///
/// `chain` lists the functions whose docs are already being expanded above
/// this one (via `copyDoc`). Expanding a doc appends the function itself.
pub(crate) fn expand_snippet(
    generator: &Generator,
    kind: SnippetKind,
    source: &str,
    view: &TemplateView,
    chain: &[String],
) -> Result<String, TemplateError> {
    let source = dedent(source);
    if source.is_empty() {
        return Ok(String::new());
    }

    let env = environment(generator);
    let template = env
        .template_from_str(&source)
        .map_err(|err| TemplateError::Parse {
            function: view.name.clone(),
            snippet: kind,
            message: err.to_string(),
        })?;

    let mut copy_chain = chain.to_vec();
    if kind == SnippetKind::Doc {
        copy_chain.push(view.name.clone());
    }
    let rendered = template
        .render(context! { this => view, copyChain => copy_chain })
        .map_err(|err| classify_render_error(&view.name, kind, err))?;
    Ok(tidy(&rendered))
}

fn classify_render_error(function: &str, snippet: SnippetKind, err: Error) -> TemplateError {
    let unknown = std::error::Error::source(&err)
        .and_then(|source| source.downcast_ref::<UnknownTemplateParameter>());
    match unknown {
        Some(UnknownTemplateParameter(parameter)) => TemplateError::UnknownParameter {
            function: function.to_string(),
            snippet,
            parameter: parameter.clone(),
        },
        None => TemplateError::Eval {
            function: function.to_string(),
            snippet,
            message: err.to_string(),
        },
    }
}
