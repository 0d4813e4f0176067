// store constants
pub const INITIAL_SCHEMA_VERSION: u32 = 0;
pub const STRATA_VERSION: &str = env!("CARGO_PKG_VERSION");

// meta area keys
pub const META_CREDENTIAL: &str = "credential";
pub const META_CREATE_TIME: &str = "create_time";
pub const META_STRATA_VERSION: &str = "strata_version";

// in-memory store ids
pub const MEMORY_STORE_PREFIX: &str = "memory:";
