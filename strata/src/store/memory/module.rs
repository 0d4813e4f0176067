use crate::errors::StrataResult;
use crate::store::memory::InMemoryStore;
use crate::store::StoreModule;

/// Store module that hands out a fresh [`InMemoryStore`], or a shared one
/// when built from an existing store.
#[derive(Default)]
pub struct InMemoryStoreModule {
    store: Option<InMemoryStore>,
}

impl InMemoryStoreModule {
    pub fn new() -> InMemoryStoreModule {
        InMemoryStoreModule { store: None }
    }

    pub fn with_config() -> InMemoryStoreModuleBuilder {
        InMemoryStoreModuleBuilder::new()
    }
}

impl StoreModule for InMemoryStoreModule {
    type Store = InMemoryStore;

    fn get_store(&self) -> StrataResult<InMemoryStore> {
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => Ok(InMemoryStore::new()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryStoreModuleBuilder {
    store: Option<InMemoryStore>,
}

impl InMemoryStoreModuleBuilder {
    pub fn new() -> InMemoryStoreModuleBuilder {
        InMemoryStoreModuleBuilder { store: None }
    }

    /// Reuses an existing store, so a later open sees what an earlier handle
    /// committed.
    pub fn store(mut self, store: InMemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> InMemoryStoreModule {
        InMemoryStoreModule { store: self.store }
    }
}
