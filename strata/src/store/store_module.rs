use crate::errors::StrataResult;
use crate::store::SchemaStore;

/// Supplies the [`SchemaStore`] a [`crate::Strata`] handle opens.
pub trait StoreModule {
    type Store: SchemaStore;

    fn get_store(&self) -> StrataResult<Self::Store>;
}
