use super::*;
use std::sync::Arc;

use crate::catalog::LazySchema;
use crate::table::Index;

fn write_raw(root: &Path, schema: &str, table: &str, body: &str) {
    let dir = root.join(schema).join(table);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(SCHEMA_FILE), body).unwrap();
}

#[test]
fn reads_nested_schema_document() {
    let tmp = tempfile::tempdir().unwrap();
    write_raw(
        tmp.path(),
        "public",
        "orders",
        r#"{"columns":{"id":"int64","total":"float64","label":"string"},"primaryKey":["id"],"partitions":["region"],"locks":["id"],"tableType":"regular"}"#,
    );
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::default());
    let t = p.list_table_details("Orders").unwrap();
    assert_eq!(t.name, "Orders");
    assert_eq!(t.column_count(), 3);
    assert_eq!(t.column("total").unwrap().data_type, "float64");
    assert!(!t.column("id").unwrap().nullable);
    assert_eq!(t.primary_key().unwrap().columns, vec!["id".to_string()]);
    assert_eq!(t.options.get("partitions").map(String::as_str), Some("region"));
    assert_eq!(t.options.get("locks").map(String::as_str), Some("id"));
    assert_eq!(t.options.get("tableType").map(String::as_str), Some("regular"));
}

#[test]
fn reads_legacy_flat_document() {
    let tmp = tempfile::tempdir().unwrap();
    write_raw(tmp.path(), "app", "events", r#"{"v":"float64","label":"string","locks":["v"]}"#);
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::new("app"));
    let t = p.list_table_details("events").unwrap();
    assert_eq!(t.column_count(), 2);
    assert!(t.has_column("v"));
    assert!(!t.has_column("locks"));
}

#[test]
fn missing_directory_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::default());
    let err = p.list_table_details("ghost").unwrap_err();
    assert_eq!(err, CatalogError::not_found("public.ghost"));
}

#[test]
fn directory_without_schema_file_has_no_columns() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("public").join("bare")).unwrap();
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::default());
    assert!(!p.list_table_details("bare").unwrap().has_columns());
}

#[test]
fn malformed_json_is_internal_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_raw(tmp.path(), "public", "broken", "{ nope");
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::default());
    assert_eq!(p.list_table_details("broken").unwrap_err().code_str(), "internal");
    write_raw(tmp.path(), "public", "array", "[1,2]");
    assert_eq!(p.list_table_details("array").unwrap_err().code_str(), "internal");
}

#[test]
fn table_dir_qualifies_names() {
    let p = FileCatalogProvider::new("/data", SchemaConfig::new("app"));
    assert_eq!(p.table_dir("Orders").unwrap(), PathBuf::from("/data/app/orders"));
    assert_eq!(p.table_dir("billing.Invoices").unwrap(), PathBuf::from("/data/billing/invoices"));
    assert_eq!(p.schema_path("t").unwrap(), PathBuf::from("/data/app/t/schema.json"));
}

#[test]
fn table_dir_rejects_names_leaving_the_root() {
    let tmp = tempfile::tempdir().unwrap();
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::new("app"));
    for name in ["/etc", "x./etc", "...x", "a.b\\c", "c:.t", "app."] {
        let err = p.table_dir(name).unwrap_err();
        assert_eq!(err.code_str(), "invalid_identifier", "name {:?}", name);
    }
    // "/etc" exists on disk but is never consulted
    assert_eq!(p.list_table_details("/etc").unwrap_err(), CatalogError::not_found("app./etc"));
    assert!(p.list_table_details("x./etc").unwrap_err().is_not_found());

    let outside = TableMetadata::with_columns("x./tmp", vec![Column::new("id", "int64")]);
    assert_eq!(p.save_table(&outside).unwrap_err().code_str(), "invalid_identifier");
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn save_then_list() {
    let tmp = tempfile::tempdir().unwrap();
    let p = FileCatalogProvider::new(tmp.path(), SchemaConfig::default());
    let mut t = TableMetadata::with_columns("customers", vec![Column::new("id", "int64"), Column::new("name", "string")]);
    t.set_primary_key(&["id"]);
    t.add_index(Index { name: "customers_name_idx".into(), columns: vec!["name".into()], unique: true, primary: false });
    t.add_option("partitions", "region,country");
    t.add_option("comment", "people");
    p.save_table(&t).unwrap();

    let back = p.list_table_details("customers").unwrap();
    assert_eq!(back.column_count(), 2);
    assert_eq!(back.primary_key().unwrap().columns, vec!["id".to_string()]);
    assert_eq!(back.options.get("partitions").map(String::as_str), Some("region,country"));
    assert_eq!(back.options.get("comment").map(String::as_str), Some("people"));
}

#[test]
fn lazy_catalog_over_directory_tree() {
    let tmp = tempfile::tempdir().unwrap();
    write_raw(tmp.path(), "public", "orders", r#"{"columns":{"id":"int64"}}"#);
    fs::create_dir_all(tmp.path().join("public").join("bare")).unwrap();
    let p = Arc::new(FileCatalogProvider::new(tmp.path(), SchemaConfig::default()));
    let mut c = LazySchema::new(p);
    assert!(c.has_table("orders").unwrap());
    assert!(!c.has_table("bare").unwrap());
    assert!(!c.has_table("ghost").unwrap());
    assert_eq!(c.resolved_tables(), vec!["public.orders".to_string()]);
    assert_eq!(c.stats().provider_queries, 3);
}
