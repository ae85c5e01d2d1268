use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::ident;
use crate::table::TableMetadata;

/// Source of per-table structural metadata, usually a live database.
///
/// A missing table may be reported either as `CatalogError::TableNotFound` or
/// as metadata with zero columns; catalogs treat both as "absent". Any other
/// error is an infrastructure failure and is passed through untouched.
pub trait IntrospectionProvider: Send + Sync {
    fn list_table_details(&self, name: &str) -> CatalogResult<TableMetadata>;
    fn create_schema_config(&self) -> SchemaConfig;
}

/// In-memory provider backed by a fixed table set. Records every query and
/// every config read so callers can observe how often the database would have
/// been hit.
pub struct MemoryProvider {
    config: Mutex<SchemaConfig>,
    config_reads: AtomicUsize,
    tables: Mutex<HashMap<String, TableMetadata>>,
    queries: Mutex<Vec<String>>,
    failure: Mutex<Option<CatalogError>>,
    missing_as_empty: bool,
}

impl MemoryProvider {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config: Mutex::new(config),
            config_reads: AtomicUsize::new(0),
            tables: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            missing_as_empty: false,
        }
    }

    pub fn with_table(self, table: TableMetadata) -> Self {
        self.insert_table(table);
        self
    }

    /// Report unknown tables as zero-column metadata instead of `TableNotFound`.
    pub fn missing_as_empty(mut self) -> Self {
        self.missing_as_empty = true;
        self
    }

    fn qualify(&self, name: &str) -> String {
        ident::full_qualified_name(name, &self.config.lock().name)
    }

    pub fn insert_table(&self, table: TableMetadata) {
        let key = self.qualify(&table.name);
        self.tables.lock().insert(key, table);
    }

    pub fn remove_table(&self, name: &str) -> Option<TableMetadata> {
        let key = self.qualify(name);
        self.tables.lock().remove(&key)
    }

    /// Replace the config handed out by later `create_schema_config` calls.
    pub fn set_config(&self, config: SchemaConfig) {
        *self.config.lock() = config;
    }

    /// Number of `create_schema_config` calls so far.
    pub fn config_reads(&self) -> usize { self.config_reads.load(Ordering::SeqCst) }

    /// Make every following query fail with `err` until `clear_failure`.
    pub fn fail_with(&self, err: CatalogError) {
        *self.failure.lock() = Some(err);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    pub fn query_count(&self) -> usize { self.queries.lock().len() }

    /// Number of queries issued for `name`, compared by qualified name.
    pub fn queries_for(&self, name: &str) -> usize {
        let key = self.qualify(name);
        self.queries
            .lock()
            .iter()
            .filter(|q| self.qualify(q) == key)
            .count()
    }

    /// Raw names in query order.
    pub fn queried_names(&self) -> Vec<String> { self.queries.lock().clone() }
}

impl IntrospectionProvider for MemoryProvider {
    fn list_table_details(&self, name: &str) -> CatalogResult<TableMetadata> {
        self.queries.lock().push(name.to_string());
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let key = self.qualify(name);
        debug!(target: "lazyschema::provider", "memory list_table_details: '{}'", key);
        match self.tables.lock().get(&key) {
            Some(t) => Ok(t.clone()),
            None if self.missing_as_empty => Ok(TableMetadata::new(name)),
            None => Err(CatalogError::not_found(key)),
        }
    }

    fn create_schema_config(&self) -> SchemaConfig {
        self.config_reads.fetch_add(1, Ordering::SeqCst);
        self.config.lock().clone()
    }
}
