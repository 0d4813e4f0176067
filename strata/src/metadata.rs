use crate::common::{META_CREATE_TIME, META_STRATA_VERSION, STRATA_VERSION};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::SchemaStore;
use chrono::{DateTime, Utc};

/// Store metadata capturing creation time and versions.
///
/// Creation time and library version are written once, the first time a
/// store is opened, into the store's metadata area. The schema version is
/// always read from the store's version slot.
///
/// # Fields
/// - `create_time`: When the store was first opened by Strata, if recorded
/// - `strata_version`: Version of the library that created the store
/// - `schema_version`: Committed schema version at the time of reading
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreMetadata {
    pub create_time: Option<DateTime<Utc>>,
    pub strata_version: Option<String>,
    pub schema_version: u32,
}

impl StoreMetadata {
    /// Reads the metadata of an open store.
    ///
    /// A creation time that cannot be parsed is reported as an
    /// `EncodingError` instead of being silently dropped.
    pub fn load<S: SchemaStore>(store: &S) -> StrataResult<StoreMetadata> {
        let create_time = match store.read_meta(META_CREATE_TIME)? {
            Some(value) => Some(parse_create_time(&value)?),
            None => None,
        };

        Ok(StoreMetadata {
            create_time,
            strata_version: store.read_meta(META_STRATA_VERSION)?,
            schema_version: store.schema_version()?,
        })
    }

    /// Records creation time and library version unless already present.
    /// Returns true when the store was seen for the first time.
    pub fn record_creation<S: SchemaStore>(store: &S) -> StrataResult<bool> {
        if store.read_meta(META_CREATE_TIME)?.is_some() {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        store.write_meta(META_CREATE_TIME, &now)?;
        store.write_meta(META_STRATA_VERSION, STRATA_VERSION)?;
        log::debug!("Recorded creation metadata for store {}", store.store_id());
        Ok(true)
    }
}

fn parse_create_time(value: &str) -> StrataResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| {
            log::error!("Invalid store creation time {}: {}", value, err);
            StrataError::new(
                &format!("Invalid store creation time {}: {}", value, err),
                ErrorKind::EncodingError,
            )
        })
}
