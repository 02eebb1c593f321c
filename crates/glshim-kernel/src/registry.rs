//! Tweak registry and copy resolution.
//!
//! The registry is built once from the full descriptor table. Every
//! descriptor's copy chain is resolved at build time and memoized, so the
//! registry is read-only afterwards and can be shared across workers.

use crate::descriptor::{FunctionDescriptor, ResolvedDescriptor};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::sync::Arc;

type Resolution = Result<Arc<ResolvedDescriptor>, ConfigError>;

#[derive(Debug, Clone, Default)]
pub struct TweakRegistry {
    descriptors: BTreeMap<String, FunctionDescriptor>,
    resolved: BTreeMap<String, Resolution>,
}

impl TweakRegistry {
    /// Build a registry from a descriptor table.
    ///
    /// Duplicate names reject the whole table. Copy errors do not: they are
    /// memoized against the affected names and reported by [`Self::resolve`].
    pub fn from_descriptors(descriptors: Vec<FunctionDescriptor>) -> Result<Self, ConfigError> {
        let mut index = BTreeMap::new();
        for descriptor in descriptors {
            if index.contains_key(&descriptor.name) {
                return Err(ConfigError::DuplicateDescriptor {
                    function: descriptor.name,
                });
            }
            index.insert(descriptor.name.clone(), descriptor);
        }

        let mut memo: BTreeMap<String, Arc<ResolvedDescriptor>> = BTreeMap::new();
        let mut resolved = BTreeMap::new();
        for name in index.keys() {
            let mut in_progress = Vec::new();
            let outcome = resolve_into(&index, name, &mut in_progress, &mut memo);
            if let Err(err) = &outcome {
                tracing::debug!(function = %name, error = %err, "copy resolution failed");
            }
            resolved.insert(name.clone(), outcome);
        }

        Ok(Self {
            descriptors: index,
            resolved,
        })
    }

    /// Resolved descriptor for a tweaked function.
    ///
    /// Use [`Self::lookup`] when absence is expected.
    pub fn resolve(&self, name: &str) -> Result<Arc<ResolvedDescriptor>, ConfigError> {
        self.lookup(name).unwrap_or_else(|| {
            Err(ConfigError::NoDescriptor {
                function: name.to_string(),
            })
        })
    }

    /// `None` when the function has no descriptor.
    pub fn lookup(&self, name: &str) -> Option<Result<Arc<ResolvedDescriptor>, ConfigError>> {
        self.resolved.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Descriptor as authored, before copy-merging.
    pub fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.descriptors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn resolve_into(
    index: &BTreeMap<String, FunctionDescriptor>,
    name: &str,
    in_progress: &mut Vec<String>,
    memo: &mut BTreeMap<String, Arc<ResolvedDescriptor>>,
) -> Resolution {
    if let Some(done) = memo.get(name) {
        return Ok(done.clone());
    }
    if let Some(start) = in_progress.iter().position(|item| item == name) {
        let mut cycle: Vec<String> = in_progress[start..].to_vec();
        cycle.push(name.to_string());
        return Err(ConfigError::CopyCycle {
            function: in_progress[0].clone(),
            cycle,
        });
    }

    let Some(descriptor) = index.get(name) else {
        let function = in_progress
            .last()
            .cloned()
            .unwrap_or_else(|| name.to_string());
        return Err(ConfigError::UnknownCopyTarget {
            function,
            target: name.to_string(),
        });
    };

    let resolved = match descriptor.copy.as_deref() {
        None => ResolvedDescriptor::from_own(descriptor),
        Some(target) => {
            in_progress.push(name.to_string());
            let base = resolve_into(index, target, in_progress, memo);
            in_progress.pop();
            let base = base?;
            ResolvedDescriptor::merged(descriptor, &base)
        }
    };

    let resolved = Arc::new(resolved);
    memo.insert(name.to_string(), resolved.clone());
    Ok(resolved)
}
