//! CRUD operations over customers, points of sale and items.
//!
//! The repository is generic over the [`Record`] type, so every entity kind
//! shares one implementation of create / retrieve / update / enumerate.

use crate::codec;
use crate::config::Config;
use crate::entity::{Deactivate, EntityKind, Record};
use crate::error::{LoyaltyError, Result};
use crate::index;
use crate::store::{RecordStore, WriteSet};
use log::debug;

/// Typed access to the records in a store.
pub struct Repository<'a, S: ?Sized> {
    store: &'a mut S,
    config: &'a Config,
}

impl<'a, S: RecordStore + ?Sized> Repository<'a, S> {
    /// Creates a repository over `store`.
    pub fn new(store: &'a mut S, config: &'a Config) -> Self {
        Repository { store, config }
    }

    /// Creates a record with its default field values.
    ///
    /// Fails with `InvalidIdentifier` if `id` is malformed and with
    /// `AlreadyExists` if anything is already stored under `id`. The record
    /// and its index entry are committed together or not at all.
    pub fn create<T: Record>(&mut self, id: &str) -> Result<T> {
        self.config.id_policy.check(id)?;

        if self.store.get(id)?.is_some() {
            return Err(LoyaltyError::AlreadyExists {
                kind: T::KIND,
                id: id.to_string(),
            });
        }

        let record = T::with_defaults(id, self.config);
        let bytes = codec::encode(&record)?;

        let (writes, indexed) = {
            let mut staged = WriteSet::new(&*self.store);
            staged.put(id, bytes)?;
            let indexed = index::append(&mut staged, T::KIND, id)?;
            (staged.into_writes(), indexed)
        };
        self.store.commit(writes)?;

        debug!("Created {} {} ({} indexed)", T::KIND, id, indexed);
        Ok(record)
    }

    /// Loads the record stored under `id`.
    pub fn retrieve<T: Record>(&self, id: &str) -> Result<T> {
        match self.store.get(id)? {
            Some(bytes) => codec::decode(id, &bytes),
            None => Err(LoyaltyError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            }),
        }
    }

    /// Returns `true` if the record under `id` can be retrieved.
    pub fn exists<T: Record>(&self, id: &str) -> bool {
        self.retrieve::<T>(id).is_ok()
    }

    /// Writes the whole record back under its identifier.
    pub fn save<T: Record>(&mut self, record: &T) -> Result<()> {
        let bytes = codec::encode(record)?;
        self.store.put(record.id(), bytes)
    }

    /// Applies a field change to an already loaded record and saves it.
    ///
    /// Customers and points of sale must be active; items are always open.
    pub fn apply_update<T: Record>(&mut self, mut record: T, field: T::Field) -> Result<T> {
        if !record.is_active() {
            return Err(LoyaltyError::NotActive {
                kind: T::KIND,
                id: record.id().to_string(),
            });
        }

        record.apply(field);
        self.save(&record)?;

        debug!("Updated {} {}", T::KIND, record.id());
        Ok(record)
    }

    /// Loads the record under `id` and applies a field change.
    pub fn update_field<T: Record>(&mut self, id: &str, field: T::Field) -> Result<T> {
        let record = self.retrieve::<T>(id)?;
        self.apply_update(record, field)
    }

    /// Switches the record's status flag off. The index entry stays.
    pub fn deactivate<T: Deactivate>(&mut self, id: &str) -> Result<T> {
        let mut record = self.retrieve::<T>(id)?;
        if !record.is_active() {
            return Err(LoyaltyError::NotActive {
                kind: T::KIND,
                id: id.to_string(),
            });
        }

        record.deactivate();
        self.save(&record)?;

        debug!("Deactivated {} {}", T::KIND, id);
        Ok(record)
    }

    /// Loads every indexed record of type `T`, in creation order.
    ///
    /// Fails fast: if any indexed record cannot be retrieved, the whole
    /// enumeration fails with `RetrievalFailed`.
    pub fn list_all<T: Record>(&self) -> Result<Vec<T>> {
        index::read(&*self.store, T::KIND)?
            .into_iter()
            .map(|id| {
                self.retrieve::<T>(&id)
                    .map_err(|e| LoyaltyError::RetrievalFailed {
                        kind: T::KIND,
                        id,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    /// Number of identifiers in the index for `kind`.
    pub fn index_len(&self, kind: EntityKind) -> Result<usize> {
        Ok(index::read(&*self.store, kind)?.len())
    }
}
