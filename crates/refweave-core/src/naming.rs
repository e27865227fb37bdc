//! Definition naming
//!
//! A [`DefinitionNamingStrategy`] proposes a legible base name for an
//! embedded document. The [`NameAllocator`] turns proposals into unique
//! keys within one embedding call: the first request for a base name gets
//! it verbatim, later requests get numeric suffixes in first-seen order.
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Proposes a base definition name for an external identity
pub trait DefinitionNamingStrategy: Send + Sync {
    fn base_name(&self, identity: &str) -> String;
}

impl<F> DefinitionNamingStrategy for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn base_name(&self, identity: &str) -> String {
        self(identity)
    }
}

/// Names a document after its file name: `common/Car-Model.yaml` becomes `carmodel`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStemNaming;

impl DefinitionNamingStrategy for FileStemNaming {
    fn base_name(&self, identity: &str) -> String {
        let path = identity.split(['?', '#']).next().unwrap_or(identity);
        let file_name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(path);
        let stem = match file_name.rfind('.') {
            Some(0) | None => file_name,
            Some(dot) => &file_name[..dot],
        };

        stem.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}

/// Names documents after the type configured for them
///
/// Identities without a configured type fall back to [`FileStemNaming`].
#[derive(Debug, Clone, Default)]
pub struct TypeNaming {
    names: HashMap<String, String>,
}

impl TypeNaming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `type_name` for the document loaded from `identity`
    pub fn with_type(mut self, identity: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.names.insert(identity.into(), type_name.into());
        self
    }

    pub fn insert(&mut self, identity: impl Into<String>, type_name: impl Into<String>) {
        self.names.insert(identity.into(), type_name.into());
    }
}

impl DefinitionNamingStrategy for TypeNaming {
    fn base_name(&self, identity: &str) -> String {
        self.names
            .get(identity)
            .cloned()
            .unwrap_or_else(|| FileStemNaming.base_name(identity))
    }
}

/// Default upper bound for numeric disambiguation suffixes
pub const DEFAULT_MAX_NAME_SUFFIX: usize = 10_000;

/// Hands out unique definition names within one embedding call
#[derive(Debug, Clone)]
pub struct NameAllocator {
    taken: HashSet<String>,
    max_suffix: usize,
}

impl NameAllocator {
    pub fn new(max_suffix: usize) -> Self {
        Self {
            taken: HashSet::new(),
            max_suffix,
        }
    }

    /// Mark a name as used without allocating it
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Allocate `base`, or `base2`, `base3`, ... if it is already taken
    pub fn allocate(&mut self, base: &str, identity: &str) -> Result<String> {
        if base.is_empty() {
            return Err(Error::name_collision(base, identity));
        }

        if self.taken.insert(base.to_string()) {
            return Ok(base.to_string());
        }

        for suffix in 2..=self.max_suffix {
            let candidate = format!("{}{}", base, suffix);
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }

        Err(Error::name_collision(base, identity))
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_SUFFIX)
    }
}
