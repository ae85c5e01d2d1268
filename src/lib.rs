pub mod error;
pub mod config;
pub mod ident;
pub mod table;
pub mod schema;
pub mod provider;
pub mod storage;
pub mod pg;
pub mod catalog;

pub use catalog::{CatalogStats, LazySchema};
pub use config::SchemaConfig;
pub use error::{CatalogError, CatalogResult};
pub use provider::{IntrospectionProvider, MemoryProvider};
pub use schema::Schema;
pub use table::{Column, ForeignKey, Index, TableMetadata};

// Test-only printing helper: expands to eprintln! during tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
