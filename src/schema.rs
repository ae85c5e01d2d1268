//!
//! Eager schema registry
//! ---------------------
//! `Schema` is the plain in-memory table collection: it assumes every table it
//! will ever be asked about has already been loaded. Tables are keyed by their
//! fully-qualified name (see `ident::full_qualified_name`) so `Orders`,
//! `orders` and `public.orders` all address the same entry.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::ident;
use crate::table::TableMetadata;

#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: HashMap<String, TableMetadata>,
    config: SchemaConfig,
}

impl Schema {
    /// Build a registry from already-loaded tables. Later duplicates of the
    /// same qualified name replace earlier ones.
    pub fn new(tables: Vec<TableMetadata>, config: SchemaConfig) -> Self {
        let mut schema = Schema { tables: HashMap::new(), config };
        for t in tables {
            let key = schema.full_qualified_name(&t.name);
            schema.tables.insert(key, t);
        }
        schema
    }

    /// Name of the default schema.
    pub fn name(&self) -> &str { &self.config.name }

    pub fn config(&self) -> &SchemaConfig { &self.config }

    pub fn full_qualified_name(&self, name: &str) -> String {
        ident::full_qualified_name(name, &self.config.name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&self.full_qualified_name(name))
    }

    pub fn get_table(&self, name: &str) -> CatalogResult<&TableMetadata> {
        let key = self.full_qualified_name(name);
        self.tables.get(&key).ok_or_else(|| CatalogError::not_found(key.clone()))
    }

    pub fn get_table_mut(&mut self, name: &str) -> CatalogResult<&mut TableMetadata> {
        let key = self.full_qualified_name(name);
        match self.tables.get_mut(&key) {
            Some(t) => Ok(t),
            None => Err(CatalogError::not_found(key)),
        }
    }

    /// Create an empty table carrying the configured default table options.
    pub fn create_table(&mut self, name: &str) -> CatalogResult<&mut TableMetadata> {
        ident::validate_table_name(name, self.config.max_identifier_length)?;
        let mut table = TableMetadata::new(name);
        table.options = self.config.default_table_options.clone();
        self.add_table(table)
    }

    /// Register a table, failing if its qualified name is taken.
    pub fn add_table(&mut self, table: TableMetadata) -> CatalogResult<&mut TableMetadata> {
        let key = self.full_qualified_name(&table.name);
        if self.tables.contains_key(&key) {
            return Err(CatalogError::already_exists(key));
        }
        debug!(target: "lazyschema::schema", "add_table: '{}'", key);
        Ok(self.tables.entry(key).or_insert(table))
    }

    /// Insert or replace the entry under an explicit qualified key.
    pub fn install_table(&mut self, qualified: &str, table: TableMetadata) {
        self.tables.insert(qualified.to_string(), table);
    }

    /// Remove the entry for `name` if any; never fails.
    pub fn remove_table(&mut self, name: &str) -> Option<TableMetadata> {
        self.tables.remove(&self.full_qualified_name(name))
    }

    pub fn drop_table(&mut self, name: &str) -> CatalogResult<TableMetadata> {
        let key = self.full_qualified_name(name);
        match self.tables.remove(&key) {
            Some(t) => {
                debug!(target: "lazyschema::schema", "drop_table: '{}'", key);
                Ok(t)
            }
            None => Err(CatalogError::not_found(key)),
        }
    }

    /// Move a table to a new name. The table's own `name` is updated to the
    /// new name exactly as supplied.
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> CatalogResult<()> {
        let old_key = self.full_qualified_name(old_name);
        let new_key = self.full_qualified_name(new_name);
        if !self.tables.contains_key(&old_key) {
            return Err(CatalogError::not_found(old_key));
        }
        if old_key != new_key && self.tables.contains_key(&new_key) {
            return Err(CatalogError::already_exists(new_key));
        }
        ident::validate_table_name(new_name, self.config.max_identifier_length)?;
        if let Some(mut table) = self.tables.remove(&old_key) {
            table.name = new_name.to_string();
            debug!(target: "lazyschema::schema", "rename_table: '{}' -> '{}'", old_key, new_key);
            self.tables.insert(new_key, table);
        }
        Ok(())
    }

    /// Qualified names of all registered tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableMetadata)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize { self.tables.len() }

    pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn table(name: &str, cols: usize) -> TableMetadata {
        TableMetadata::with_columns(name, (0..cols).map(|i| Column::new(format!("c{}", i), "int64")))
    }

    fn schema() -> Schema {
        Schema::new(vec![table("Orders", 3), table("billing.invoices", 2)], SchemaConfig::new("app"))
    }

    #[test]
    fn lookups_use_qualified_keys() {
        let s = schema();
        assert!(s.has_table("orders"));
        assert!(s.has_table("APP.ORDERS"));
        assert!(s.has_table("\"Orders\""));
        assert!(s.has_table("billing.invoices"));
        assert!(!s.has_table("invoices"));
        assert_eq!(s.tables().count(), 2);
        assert_eq!(s.table_names(), vec!["app.orders".to_string(), "billing.invoices".to_string()]);
    }

    #[test]
    fn get_missing_is_not_found() {
        let s = schema();
        let err = s.get_table("ghost").unwrap_err();
        assert_eq!(err, CatalogError::not_found("app.ghost"));
        assert_eq!(s.get_table("orders").unwrap().column_count(), 3);
    }

    #[test]
    fn create_applies_default_options_and_rejects_duplicates() {
        let cfg = SchemaConfig::new("app").with_default_table_option("charset", "utf8");
        let mut s = Schema::new(vec![], cfg);
        let t = s.create_table("events").unwrap();
        t.add_column(Column::new("id", "int64"));
        assert_eq!(s.get_table("events").unwrap().options.get("charset").map(String::as_str), Some("utf8"));
        let err = s.create_table("EVENTS").unwrap_err();
        assert_eq!(err.code_str(), "table_already_exists");
    }

    #[test]
    fn create_validates_identifier_length() {
        let mut s = Schema::new(vec![], SchemaConfig::new("app").with_max_identifier_length(4));
        assert_eq!(s.create_table("toolong").unwrap_err().code_str(), "invalid_identifier");
        assert!(s.create_table("ok").is_ok());
    }

    #[test]
    fn drop_and_remove() {
        let mut s = schema();
        assert_eq!(s.drop_table("orders").unwrap().name, "Orders");
        assert!(s.drop_table("orders").unwrap_err().is_not_found());
        assert!(s.remove_table("orders").is_none());
        assert!(s.remove_table("billing.invoices").is_some());
        assert!(s.is_empty());
    }

    #[test]
    fn rename_moves_entry() {
        let mut s = schema();
        s.rename_table("orders", "purchases").unwrap();
        assert!(!s.has_table("orders"));
        assert_eq!(s.get_table("purchases").unwrap().name, "purchases");

        assert!(s.rename_table("ghost", "x").unwrap_err().is_not_found());
        let err = s.rename_table("purchases", "billing.invoices").unwrap_err();
        assert_eq!(err, CatalogError::already_exists("billing.invoices"));
        // renaming onto itself (case change only) is allowed
        s.rename_table("purchases", "Purchases").unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn clone_is_independent() {
        let original = schema();
        let mut copy = original.clone();
        copy.get_table_mut("orders").unwrap().add_column(Column::new("extra", "string"));
        copy.drop_table("billing.invoices").unwrap();
        assert_eq!(original.get_table("orders").unwrap().column_count(), 3);
        assert!(original.has_table("billing.invoices"));
    }
}
