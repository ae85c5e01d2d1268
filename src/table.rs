//!
//! Table metadata model
//! --------------------
//! `TableMetadata` is what an introspection provider returns for one table:
//! ordered columns plus index, foreign key and option definitions. Values are
//! plain owned data, so `Clone` is always a deep copy and two catalogs never
//! share a mutable table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Database type name as reported by the provider (e.g. "int64", "character varying").
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

fn default_nullable() -> bool { true }

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: data_type.into(), nullable: true, default: None }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

/// One table's structure as introspected from the database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Name as supplied by the provider; not necessarily fully qualified.
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_columns<I>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = Column>,
    {
        Self { name: name.into(), columns: columns.into_iter().collect(), ..Default::default() }
    }

    /// Providers signal "this table really exists" by returning at least one column.
    pub fn has_columns(&self) -> bool { !self.columns.is_empty() }

    pub fn column_count(&self) -> usize { self.columns.len() }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool { self.column(name).is_some() }

    /// Add or replace a column (matched case-insensitively), keeping column order.
    pub fn add_column(&mut self, column: Column) -> &mut Self {
        match self.columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(&column.name)) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Remove a column along with any index or foreign key that references it.
    /// Returns the removed column, if present.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name))?;
        let removed = self.columns.remove(pos);
        self.indexes.retain(|i| !i.columns.iter().any(|c| c.eq_ignore_ascii_case(name)));
        self.foreign_keys.retain(|f| !f.columns.iter().any(|c| c.eq_ignore_ascii_case(name)));
        Some(removed)
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.primary)
    }

    /// Replace the primary key; the new key is named `<table>_pkey` after the
    /// unqualified table name.
    pub fn set_primary_key<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        self.indexes.retain(|i| !i.primary);
        let base = self.name.rsplit('.').next().unwrap_or(&self.name).to_string();
        self.indexes.push(Index {
            name: format!("{}_pkey", base),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            unique: true,
            primary: true,
        });
        self
    }

    pub fn add_index(&mut self, index: Index) -> &mut Self {
        self.indexes.retain(|i| !i.name.eq_ignore_ascii_case(&index.name));
        self.indexes.push(index);
        self
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKey) -> &mut Self {
        self.foreign_keys.retain(|f| !f.name.eq_ignore_ascii_case(&fk.name));
        self.foreign_keys.push(fk);
        self
    }

    pub fn add_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
