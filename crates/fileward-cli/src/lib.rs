use fileward::MemoryRecord;

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Stand-in owner for the record the files belong to. `primary` is the
/// record's current attribute value, when it has one.
pub fn owner_record(owner_type: &str, owner_id: &str, field: &str, primary: Option<&str>) -> MemoryRecord {
    match primary {
        Some(name) => MemoryRecord::stored(owner_type, owner_id, [(field, name)]),
        None => MemoryRecord::stored(owner_type, owner_id, Vec::<(String, String)>::new()),
    }
}
