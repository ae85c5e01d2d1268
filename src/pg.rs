//!
//! PostgreSQL introspection provider
//! ---------------------------------
//! Blocking provider over `tokio-postgres`. The catalog is synchronous, so the
//! provider owns a private current-thread runtime and drives every query with
//! `block_on`; the connection task is spawned on the same runtime and makes
//! progress whenever a query is in flight.
//!
//! A table that does not exist comes back as metadata with no columns, the same
//! way an empty `information_schema.columns` result reads.

use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, info, warn};

use crate::config::{SchemaConfig, DEFAULT_MAX_IDENTIFIER_LENGTH};
use crate::error::CatalogResult;
use crate::ident;
use crate::provider::IntrospectionProvider;
use crate::table::{Column, ForeignKey, Index, TableMetadata};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const COLUMNS_SQL: &str = "\
SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
FROM information_schema.columns \
WHERE table_schema = $1 AND table_name = $2 \
ORDER BY ordinal_position";

const INDEXES_SQL: &str = "\
SELECT i.relname::text, ix.indisunique, ix.indisprimary, \
       array_agg(a.attname::text ORDER BY k.ord) \
FROM pg_index ix \
JOIN pg_class t ON t.oid = ix.indrelid \
JOIN pg_namespace n ON n.oid = t.relnamespace \
JOIN pg_class i ON i.oid = ix.indexrelid \
CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) \
JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
WHERE n.nspname = $1 AND t.relname = $2 \
GROUP BY i.relname, ix.indisunique, ix.indisprimary \
ORDER BY i.relname";

const FOREIGN_KEYS_SQL: &str = "\
SELECT c.conname::text, \
       ARRAY(SELECT a.attname::text FROM unnest(c.conkey) WITH ORDINALITY AS k(attnum, ord) \
             JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum ORDER BY k.ord), \
       fn.nspname::text || '.' || ft.relname::text, \
       ARRAY(SELECT a.attname::text FROM unnest(c.confkey) WITH ORDINALITY AS k(attnum, ord) \
             JOIN pg_attribute a ON a.attrelid = c.confrelid AND a.attnum = k.attnum ORDER BY k.ord) \
FROM pg_constraint c \
JOIN pg_class t ON t.oid = c.conrelid \
JOIN pg_namespace n ON n.oid = t.relnamespace \
JOIN pg_class ft ON ft.oid = c.confrelid \
JOIN pg_namespace fn ON fn.oid = ft.relnamespace \
WHERE c.contype = 'f' AND n.nspname = $1 AND t.relname = $2 \
ORDER BY c.conname";

pub struct PgIntrospectionProvider {
    rt: Runtime,
    client: Client,
    config: SchemaConfig,
}

impl PgIntrospectionProvider {
    /// Connect and derive the schema config from the session's
    /// `current_schema()` and `max_identifier_length`.
    pub fn connect(dsn: &str, connect_timeout: Duration) -> CatalogResult<Self> {
        let mut cfg: Config = dsn.parse()?;
        cfg.connect_timeout(connect_timeout);
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let (client, connection) = rt.block_on(cfg.connect(NoTls))?;
        rt.spawn(async move {
            if let Err(e) = connection.await {
                warn!(target: "lazyschema::pg", "connection task ended: {}", e);
            }
        });

        let row = rt.block_on(client.query_one("SELECT current_schema()::text, current_setting('max_identifier_length')", &[]))?;
        let schema: Option<String> = row.try_get(0)?;
        let max_len: String = row.try_get(1)?;
        let config = SchemaConfig::new(schema.unwrap_or_else(|| ident::DEFAULT_SCHEMA.to_string()))
            .with_max_identifier_length(parse_max_identifier_length(&max_len));
        info!(target: "lazyschema::pg", "connected: default schema '{}', max identifier length {}", config.name, config.max_identifier_length);
        Ok(Self { rt, client, config })
    }

    /// Override the snapshot handed to catalogs (e.g. to pin a schema other
    /// than the session's `current_schema()`).
    pub fn with_config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    fn query(&self, sql: &str, schema: &str, table: &str) -> CatalogResult<Vec<tokio_postgres::Row>> {
        Ok(self.rt.block_on(self.client.query(sql, &[&schema, &table]))?)
    }
}

/// Split a table name into the `(schema, table)` pair Postgres stores in its
/// catalogs. Each segment folds on its own: unquoted segments go to lower
/// case, quoted ones keep their case. Dots inside quotes do not split.
/// `default_schema` is used as stored.
pub(crate) fn pg_identifier(name: &str, default_schema: &str) -> (String, String) {
    let mut segments = split_segments(name.trim());
    let table = segments.pop().map(fold_segment).unwrap_or_default();
    let schema = match segments.pop() {
        Some(seg) if !seg.trim().is_empty() => fold_segment(seg),
        _ => default_schema.to_string(),
    };
    (schema, table)
}

fn fold_segment(seg: &str) -> String {
    let seg = seg.trim();
    if ident::is_identifier_quoted(seg) { ident::trim_quotes(seg) } else { seg.to_lowercase() }
}

fn split_segments(name: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut closing: Option<char> = None;
    let mut start = 0;
    for (i, ch) in name.char_indices() {
        match closing {
            Some(c) if ch == c => closing = None,
            Some(_) => {}
            None => match ch {
                '"' => closing = Some('"'),
                '`' => closing = Some('`'),
                '[' => closing = Some(']'),
                '.' => {
                    out.push(&name[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    out.push(&name[start..]);
    out
}

pub(crate) fn parse_max_identifier_length(raw: &str) -> usize {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_IDENTIFIER_LENGTH)
}

impl IntrospectionProvider for PgIntrospectionProvider {
    fn list_table_details(&self, name: &str) -> CatalogResult<TableMetadata> {
        let (schema, table) = pg_identifier(name, &self.config.name);
        debug!(target: "lazyschema::pg", "list_table_details: schema='{}' table='{}'", schema, table);
        let mut meta = TableMetadata::new(name);

        for row in self.query(COLUMNS_SQL, &schema, &table)? {
            let is_nullable: String = row.try_get(2)?;
            meta.columns.push(Column {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default: row.try_get(3)?,
            });
        }
        if !meta.has_columns() {
            return Ok(meta);
        }

        for row in self.query(INDEXES_SQL, &schema, &table)? {
            meta.indexes.push(Index {
                name: row.try_get(0)?,
                unique: row.try_get(1)?,
                primary: row.try_get(2)?,
                columns: row.try_get(3)?,
            });
        }
        for row in self.query(FOREIGN_KEYS_SQL, &schema, &table)? {
            meta.foreign_keys.push(ForeignKey {
                name: row.try_get(0)?,
                columns: row.try_get(1)?,
                foreign_table: row.try_get(2)?,
                foreign_columns: row.try_get(3)?,
            });
        }
        Ok(meta)
    }

    fn create_schema_config(&self) -> SchemaConfig { self.config.clone() }
}
