//!
//! File-backed introspection provider
//! ----------------------------------
//! Reads table definitions from a directory tree laid out as
//! `<root>/<schema>/<table>/schema.json`. The JSON document follows the store's
//! schema format:
//!
//! ```json
//! { "columns": { "id": "int64", "label": "string" },
//!   "primaryKey": ["id"], "partitions": ["region"], "locks": ["id"],
//!   "tableType": "regular" }
//! ```
//!
//! A legacy flat map (`{ "id": "int64", ... }`) is accepted as well. A missing
//! table directory is `TableNotFound`; a directory without schema.json is a
//! table with no columns, which catalogs also treat as absent.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::ident;
use crate::provider::IntrospectionProvider;
use crate::table::{Column, TableMetadata};
use crate::tprintln;

pub const SCHEMA_FILE: &str = "schema.json";

/// Keys with structural meaning; everything else in a flat document is a column.
const RESERVED_KEYS: [&str; 7] = ["columns", "locks", "primaryKey", "partitions", "tableType", "PRIMARY", "options"];

#[derive(Debug, Clone)]
pub struct FileCatalogProvider {
    root: PathBuf,
    config: SchemaConfig,
}

impl FileCatalogProvider {
    pub fn new<P: AsRef<Path>>(root: P, config: SchemaConfig) -> Self {
        Self { root: root.as_ref().to_path_buf(), config }
    }

    /// Directory for a table name, qualifying it with the default schema.
    /// Every segment must be a single plain path component: empty, `.`/`..`,
    /// absolute, drive-prefixed or separator-carrying segments are rejected
    /// with `InvalidIdentifier`, so the result always lies under the root.
    pub fn table_dir(&self, name: &str) -> CatalogResult<PathBuf> {
        let (schema, table) = ident::split_qualified(name);
        let schema = schema.unwrap_or_else(|| self.config.name.clone());
        let mut out = self.root.clone();
        for part in [schema, table] {
            let p = ident::normalize_identifier(&part);
            if let Some(reason) = unsafe_path_segment(&p) {
                return Err(CatalogError::invalid_identifier(name, reason));
            }
            out.push(p);
        }
        Ok(out)
    }

    pub fn schema_path(&self, name: &str) -> CatalogResult<PathBuf> {
        Ok(self.table_dir(name)?.join(SCHEMA_FILE))
    }

    /// Write `table` as schema.json, creating the table directory.
    pub fn save_table(&self, table: &TableMetadata) -> CatalogResult<()> {
        let dir = self.table_dir(&table.name)?;
        fs::create_dir_all(&dir)?;
        let mut cols = Map::new();
        for c in &table.columns {
            cols.insert(c.name.clone(), Value::String(c.data_type.clone()));
        }
        let mut root = Map::new();
        root.insert("columns".into(), Value::Object(cols));
        if let Some(pk) = table.primary_key() {
            root.insert("primaryKey".into(), serde_json::json!(pk.columns));
        }
        let mut options = table.options.clone();
        if let Some(parts) = options.remove("partitions") {
            let parts: Vec<&str> = parts.split(',').filter(|p| !p.is_empty()).collect();
            root.insert("partitions".into(), serde_json::json!(parts));
        }
        if let Some(locks) = options.remove("locks") {
            let locks: Vec<&str> = locks.split(',').filter(|p| !p.is_empty()).collect();
            root.insert("locks".into(), serde_json::json!(locks));
        }
        if let Some(tt) = options.remove("tableType") {
            root.insert("tableType".into(), Value::String(tt));
        }
        if !options.is_empty() {
            root.insert("options".into(), serde_json::json!(options));
        }
        let path = dir.join(SCHEMA_FILE);
        fs::write(&path, serde_json::to_string_pretty(&Value::Object(root))?)?;
        debug!(target: "lazyschema::storage", "save_table: wrote '{}'", path.display());
        Ok(())
    }
}

fn unsafe_path_segment(seg: &str) -> Option<&'static str> {
    if seg.is_empty() { return Some("empty path segment"); }
    if seg == "." || seg == ".." { return Some("relative path segment"); }
    if seg.contains(['/', '\\', ':', '\0']) { return Some("path separator in name"); }
    if Path::new(seg).is_absolute() { return Some("absolute path in name"); }
    None
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(|x| x.as_array())
        .map(|arr| arr.iter().filter_map(|e| e.as_str().map(|s| s.to_string())).collect())
        .unwrap_or_default()
}

/// Parse a schema.json document into table metadata named `name`.
pub(crate) fn parse_schema_document(name: &str, text: &str) -> CatalogResult<TableMetadata> {
    let v: Value = serde_json::from_str(text)?;
    let obj = v
        .as_object()
        .ok_or_else(|| CatalogError::internal(format!("schema.json for '{}' is not an object", name)))?;
    let mut table = TableMetadata::new(name);
    match obj.get("columns").and_then(|x| x.as_object()) {
        Some(cols) => {
            tprintln!("[STORAGE] parse_schema_document: nested format, cols={:?}", cols.keys().collect::<Vec<_>>());
            for (k, v) in cols.iter() {
                if let Some(s) = v.as_str() { table.add_column(Column::new(k.clone(), s)); }
            }
        }
        None => {
            // Legacy: flat schema map
            for (k, v) in obj.iter() {
                if RESERVED_KEYS.contains(&k.as_str()) { continue; }
                if let Some(s) = v.as_str() { table.add_column(Column::new(k.clone(), s)); }
            }
        }
    }
    let pk = string_list(obj.get("primaryKey"));
    if !pk.is_empty() {
        for c in table.columns.iter_mut() {
            if pk.iter().any(|k| k.eq_ignore_ascii_case(&c.name)) { c.nullable = false; }
        }
        table.set_primary_key(&pk[..]);
    }
    let partitions = string_list(obj.get("partitions"));
    if !partitions.is_empty() { table.add_option("partitions", partitions.join(",")); }
    let locks = string_list(obj.get("locks"));
    if !locks.is_empty() { table.add_option("locks", locks.join(",")); }
    if let Some(tt) = obj.get("tableType").and_then(|x| x.as_str()) {
        table.add_option("tableType", tt);
    }
    if let Some(opts) = obj.get("options").and_then(|x| x.as_object()) {
        let extra: BTreeMap<String, String> = opts
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect();
        table.options.extend(extra);
    }
    Ok(table)
}

impl IntrospectionProvider for FileCatalogProvider {
    fn list_table_details(&self, name: &str) -> CatalogResult<TableMetadata> {
        let qualified = ident::full_qualified_name(name, &self.config.name);
        // A name that cannot map to a directory under the root names no stored table
        let dir = match self.table_dir(name) {
            Ok(d) => d,
            Err(e) => {
                debug!(target: "lazyschema::storage", "list_table_details: '{}' rejected: {}", name, e.message());
                return Err(CatalogError::not_found(qualified));
            }
        };
        debug!(target: "lazyschema::storage", "list_table_details: '{}' dir='{}' exists={}", name, dir.display(), dir.is_dir());
        if !dir.is_dir() {
            return Err(CatalogError::not_found(qualified));
        }
        let path = dir.join(SCHEMA_FILE);
        if !path.exists() {
            return Ok(TableMetadata::new(name));
        }
        let text = fs::read_to_string(&path)?;
        parse_schema_document(name, &text)
    }

    fn create_schema_config(&self) -> SchemaConfig { self.config.clone() }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
