/// Version reported in logs and written to @PG records.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
