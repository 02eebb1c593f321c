//! Canonical native parameter name fixes.
//!
//! Older catalog revisions spell some parameter names in lower case. The
//! table below is applied to every function before any per-function tweak.

/// Native spelling -> exposed spelling.
pub const PARAM_NAME_FIXES: &[(&str, &str)] = &[
    ("binaryformat", "binaryFormat"),
    ("bufsize", "bufSize"),
    ("indx", "index"),
    ("infolog", "infoLog"),
    ("internalformat", "internalFormat"),
    ("precisiontype", "precisionType"),
];

pub fn normalize_param_name(name: &str) -> &str {
    PARAM_NAME_FIXES
        .iter()
        .find_map(|(native, fixed)| (*native == name).then_some(*fixed))
        .unwrap_or(name)
}
