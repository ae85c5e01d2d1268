//! Identifier qualification utilities
//! ----------------------------------
//! Single source of truth for turning a table name as written in a migration
//! into the fully-qualified cache key used by the catalog and the registry.

use crate::error::{CatalogError, CatalogResult};

pub const DEFAULT_SCHEMA: &str = "public";

const QUOTE_CHARS: [char; 4] = ['`', '"', '[', ']'];

/// True when the identifier opens with a quoting marker (`"`, `` ` `` or `[`).
pub fn is_identifier_quoted(ident: &str) -> bool {
    matches!(ident.trim_start().chars().next(), Some('"') | Some('`') | Some('['))
}

/// Strip every quoting marker, including those around individual segments
/// of a dotted name (`"app"."Orders"` -> `app.Orders`).
pub fn trim_quotes(ident: &str) -> String {
    ident.trim().chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Normalize an identifier according to SQL rules:
/// - If enclosed in double-quotes, strip quotes and preserve case
/// - Otherwise, convert to lowercase for case-insensitive matching
pub fn normalize_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Cache key for a table: quote-stripped, prefixed with `default_schema` when
/// the name has no `.` separator, and lower-cased as a whole.
///
/// Case folding is unconditional here (quoted names included); the key is only
/// used for lookups, the caller's spelling is kept elsewhere.
pub fn full_qualified_name(name: &str, default_schema: &str) -> String {
    let mut name = name.trim().to_string();
    if is_identifier_quoted(&name) {
        name = trim_quotes(&name);
    }
    if !name.contains('.') {
        name = format!("{}.{}", default_schema, name);
    }
    name.to_lowercase()
}

/// Split a possibly qualified name into `(schema, table)`, stripping quotes.
/// Only the last `.` separates the table; anything before it is the schema.
pub fn split_qualified(name: &str) -> (Option<String>, String) {
    let unquoted = trim_quotes(name);
    match unquoted.rsplit_once('.') {
        Some((schema, table)) if !schema.is_empty() => (Some(schema.to_string()), table.to_string()),
        Some((_, table)) => (None, table.to_string()),
        None => (None, unquoted),
    }
}

/// Reject names a migration could never create: empty segments or a table
/// segment longer than the configured identifier limit.
pub fn validate_table_name(name: &str, max_identifier_length: usize) -> CatalogResult<()> {
    let (schema, table) = split_qualified(name);
    if table.trim().is_empty() || schema.as_deref().map(|s| s.trim().is_empty()).unwrap_or(false) {
        return Err(CatalogError::invalid_identifier(name, "has an empty segment"));
    }
    if table.chars().count() > max_identifier_length {
        let reason = format!("exceeds the maximum identifier length of {}", max_identifier_length);
        return Err(CatalogError::invalid_identifier(name.to_string(), reason));
    }
    Ok(())
}
