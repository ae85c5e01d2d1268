//! Schema configuration snapshot handed out by an introspection provider.
//! A catalog copies it once at construction and never re-reads it.

use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::ident::DEFAULT_SCHEMA;

/// PostgreSQL's NAMEDATALEN - 1.
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

pub const ENV_DEFAULT_SCHEMA: &str = "LAZYSCHEMA_DEFAULT_SCHEMA";
pub const ENV_MAX_IDENTIFIER_LENGTH: &str = "LAZYSCHEMA_MAX_IDENTIFIER_LENGTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    /// Default schema; prepended to unqualified table names.
    pub name: String,
    pub max_identifier_length: usize,
    /// Options copied onto every table created through the catalog.
    #[serde(default)]
    pub default_table_options: BTreeMap<String, String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCHEMA.to_string(),
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            default_table_options: BTreeMap::new(),
        }
    }
}

impl SchemaConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_max_identifier_length(mut self, len: usize) -> Self {
        self.max_identifier_length = len;
        self
    }

    pub fn with_default_table_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_table_options.insert(key.into(), value.into());
        self
    }

    /// Build from `LAZYSCHEMA_*` environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = SchemaConfig::default();
        if let Some(name) = parse_string_env(ENV_DEFAULT_SCHEMA) {
            cfg.name = name;
        }
        if let Some(len) = parse_usize_env(ENV_MAX_IDENTIFIER_LENGTH) {
            cfg.max_identifier_length = len;
        }
        cfg
    }
}

pub(crate) fn parse_string_env(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

pub(crate) fn parse_usize_env(name: &str) -> Option<usize> {
    match env::var(name) {
        Ok(val) => val.trim().parse::<usize>().ok().filter(|n| *n > 0),
        Err(_) => None,
    }
}
