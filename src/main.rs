//!
//! lazyschema report binary
//! ------------------------
//! Resolves the named tables through one lazy catalog, twice, and prints a JSON
//! report with per-table presence plus the catalog's lookup counters. The second
//! pass is answered from cache, which the counters make visible.
//!
//! Usage: lazyschema [--root DIR | --pg DSN] [--schema NAME] <table>...
//! Env fallbacks: LAZYSCHEMA_ROOT, LAZYSCHEMA_PG_DSN, LAZYSCHEMA_DEFAULT_SCHEMA.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use lazyschema::pg::{PgIntrospectionProvider, DEFAULT_CONNECT_TIMEOUT};
use lazyschema::storage::FileCatalogProvider;
use lazyschema::{IntrospectionProvider, LazySchema, SchemaConfig};

const VALUE_FLAGS: [&str; 3] = ["--root", "--pg", "--schema"];

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let a = &args[i];
        if VALUE_FLAGS.contains(&a.as_str()) {
            i += 2;
            continue;
        }
        if !a.starts_with("--") { out.push(a.clone()); }
        i += 1;
    }
    out
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn table_report(catalog: &mut LazySchema, tables: &[String]) -> Result<Value> {
    let mut entries = Vec::with_capacity(tables.len());
    for pass in 0..2 {
        for t in tables {
            let present = catalog.has_table(t)?;
            if pass == 0 {
                let columns = if present { catalog.get_table(t)?.column_count() } else { 0 };
                entries.push(json!({
                    "table": t,
                    "qualified": catalog.full_qualified_name(t),
                    "present": present,
                    "columns": columns,
                }));
            }
        }
    }
    Ok(json!({
        "schema": catalog.config().name,
        "tables": entries,
        "stats": catalog.stats(),
    }))
}

fn main() -> Result<()> {
    // Init logging; stdout is reserved for the JSON report
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("usage: lazyschema [--root DIR | --pg DSN] [--schema NAME] <table>...");
        return Ok(());
    }
    let tables = positional_args(&args);
    if tables.is_empty() {
        return Err(anyhow!("no tables given; see --help"));
    }
    let schema = parse_value_arg(&args, "--schema");
    let root = parse_value_arg(&args, "--root").or_else(|| env_value("LAZYSCHEMA_ROOT"));
    let dsn = parse_value_arg(&args, "--pg").or_else(|| env_value("LAZYSCHEMA_PG_DSN"));

    let provider: Arc<dyn IntrospectionProvider> = match (dsn, root) {
        (Some(dsn), _) => {
            let mut pg = PgIntrospectionProvider::connect(&dsn, DEFAULT_CONNECT_TIMEOUT)?;
            if let Some(name) = schema {
                let cfg = SchemaConfig { name, ..pg.create_schema_config() };
                pg = pg.with_config(cfg);
            }
            Arc::new(pg)
        }
        (None, Some(root)) => {
            let mut cfg = SchemaConfig::from_env();
            if let Some(name) = schema { cfg.name = name; }
            Arc::new(FileCatalogProvider::new(root, cfg))
        }
        (None, None) => return Err(anyhow!("either --root or --pg (or LAZYSCHEMA_ROOT / LAZYSCHEMA_PG_DSN) is required")),
    };

    let mut catalog = LazySchema::new(provider);
    info!(target: "lazyschema", "resolving {} table(s) in schema '{}'", tables.len(), catalog.config().name);
    let report = table_report(&mut catalog, &tables)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
