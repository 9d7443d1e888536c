/// Result type used by the storage, config and presentation layers.
pub type Result<T> = anyhow::Result<T>;
