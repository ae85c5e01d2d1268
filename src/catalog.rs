//!
//! On-demand table catalog
//! -----------------------
//! `LazySchema` wraps an eager `Schema` and an `IntrospectionProvider`. A
//! migration typically touches a handful of tables, so instead of loading the
//! whole database catalog up front each table is introspected the first time
//! one of the accessors below names it. Both answers are cached for the
//! catalog's lifetime:
//!
//! - present: the provider returned at least one column; the metadata is
//!   installed into the eager registry under its fully-qualified name.
//! - absent: the provider reported `TableNotFound`, or returned no columns.
//!
//! Per qualified name the states are `unrequested -> pending -> present | absent`.
//! Absent is terminal; nothing here ever invalidates an entry. An infrastructure
//! error moves `pending` back to `unrequested` so the next access retries.
//!
//! Every raw name ever passed to an accessor is also recorded in
//! `requested_tables`, with the provider's metadata once it arrived. Another
//! catalog can replay that list through `import_requested_tables` to warm its
//! own cache; it re-queries the provider rather than sharing metadata.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SchemaConfig;
use crate::error::CatalogResult;
use crate::provider::IntrospectionProvider;
use crate::schema::Schema;
use crate::table::TableMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Pending,
    Present,
    Absent,
}

/// Lookup counters for one catalog instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Calls made to `list_table_details`.
    pub provider_queries: u64,
    /// Accesses answered without asking the provider.
    pub cache_hits: u64,
    pub tables_present: u64,
    pub tables_absent: u64,
}

#[derive(Clone)]
pub struct LazySchema {
    provider: Arc<dyn IntrospectionProvider>,
    schema: Schema,
    requested: HashMap<String, Option<TableMetadata>>,
    resolved: HashMap<String, Resolution>,
    stats: CatalogStats,
}

impl std::fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySchema")
            .field("schema", &self.schema.name())
            .field("installed_tables", &self.schema.len())
            .field("requested_tables", &self.requested.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl LazySchema {
    /// Bind to `provider`, taking its schema configuration snapshot now.
    pub fn new(provider: Arc<dyn IntrospectionProvider>) -> Self {
        let config = provider.create_schema_config();
        debug!(target: "lazyschema::catalog", "new: default schema '{}'", config.name);
        Self {
            provider,
            schema: Schema::new(Vec::new(), config),
            requested: HashMap::new(),
            resolved: HashMap::new(),
            stats: CatalogStats::default(),
        }
    }

    pub fn config(&self) -> &SchemaConfig { self.schema.config() }

    /// The eager registry holding every table resolved present so far.
    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn full_qualified_name(&self, name: &str) -> String {
        self.schema.full_qualified_name(name)
    }

    fn ensure_resolved(&mut self, name: &str) -> CatalogResult<()> {
        let fqn = self.full_qualified_name(name);
        if self.resolved.contains_key(&fqn) || self.schema.has_table(&fqn) {
            self.stats.cache_hits += 1;
            return Ok(());
        }
        // Mark the attempt before asking the provider.
        self.requested.insert(name.to_string(), None);
        self.resolved.insert(fqn.clone(), Resolution::Pending);
        self.stats.provider_queries += 1;
        debug!(target: "lazyschema::catalog", "ensure_resolved: introspecting '{}' as '{}'", name, fqn);

        match self.provider.list_table_details(name) {
            Ok(meta) => {
                if meta.has_columns() {
                    self.schema.install_table(&fqn, meta.clone());
                    self.resolved.insert(fqn.clone(), Resolution::Present);
                    self.stats.tables_present += 1;
                } else {
                    self.resolved.insert(fqn.clone(), Resolution::Absent);
                    self.stats.tables_absent += 1;
                }
                debug!(target: "lazyschema::catalog", "ensure_resolved: '{}' columns={}", fqn, meta.column_count());
                self.requested.insert(name.to_string(), Some(meta));
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.schema.remove_table(&fqn);
                self.resolved.insert(fqn.clone(), Resolution::Absent);
                self.stats.tables_absent += 1;
                debug!(target: "lazyschema::catalog", "ensure_resolved: '{}' does not exist", fqn);
                Ok(())
            }
            Err(e) => {
                self.resolved.remove(&fqn);
                warn!(target: "lazyschema::catalog", "ensure_resolved: introspection of '{}' failed: {}", fqn, e);
                Err(e)
            }
        }
    }

    /// Whether the table exists. Absence is a normal answer, not an error;
    /// only provider infrastructure failures are returned as `Err`.
    pub fn has_table(&mut self, name: &str) -> CatalogResult<bool> {
        self.ensure_resolved(name)?;
        Ok(self.schema.has_table(name))
    }

    pub fn get_table(&mut self, name: &str) -> CatalogResult<&TableMetadata> {
        self.ensure_resolved(name)?;
        self.schema.get_table(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> CatalogResult<&mut TableMetadata> {
        self.ensure_resolved(name)?;
        self.schema.get_table_mut(name)
    }

    /// Drop from the active registry. The request history keeps the name.
    pub fn drop_table(&mut self, name: &str) -> CatalogResult<&mut Self> {
        self.ensure_resolved(name)?;
        self.schema.drop_table(name)?;
        Ok(self)
    }

    /// Both names are resolved first so an existing destination table in the
    /// database is detected as a conflict.
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> CatalogResult<&mut Self> {
        self.ensure_resolved(old_name)?;
        self.ensure_resolved(new_name)?;
        self.schema.rename_table(old_name, new_name)?;
        Ok(self)
    }

    /// Create a new empty table, failing if the database already has one by
    /// that name.
    pub fn create_table(&mut self, name: &str) -> CatalogResult<&mut TableMetadata> {
        self.ensure_resolved(name)?;
        self.schema.create_table(name)
    }

    /// Replay every name `other` has requested through this catalog's own
    /// resolution path. Metadata is fetched again, never shared.
    pub fn import_requested_tables(&mut self, other: &LazySchema) -> CatalogResult<()> {
        let mut names: Vec<&String> = other.requested.keys().collect();
        names.sort();
        debug!(target: "lazyschema::catalog", "import_requested_tables: {} names", names.len());
        for name in names {
            self.has_table(name)?;
        }
        Ok(())
    }

    /// Every raw name requested so far, with the provider's answer if one arrived.
    pub fn requested_tables(&self) -> &HashMap<String, Option<TableMetadata>> {
        &self.requested
    }

    /// Sorted qualified names currently present in the catalog: tables loaded
    /// from the provider or created locally, under their current names.
    pub fn resolved_tables(&self) -> Vec<String> {
        self.schema.table_names()
    }

    /// True if `name` was resolved absent. Never queries the provider.
    pub fn is_absent(&self, name: &str) -> bool {
        let fqn = self.full_qualified_name(name);
        self.resolved.get(&fqn) == Some(&Resolution::Absent) && !self.schema.has_table(&fqn)
    }

    pub fn stats(&self) -> CatalogStats { self.stats }

    /// Independent copy: metadata is deep-copied, the provider handle is shared.
    pub fn duplicate(&self) -> Self { self.clone() }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod catalog_tests;
