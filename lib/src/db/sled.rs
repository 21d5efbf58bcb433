use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::{config, error::ErrorKind, Result};

use super::{decode, encode, Collectable, Identifiable};

#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
}

impl SledDb {
    pub fn open(store: &config::Store) -> Result<Self> {
        let inner = sled::Config::default()
            .path(&store.path)
            .temporary(store.temporary)
            .open()?;
        Ok(Self { inner })
    }

    /// Opens a throwaway database, removed from disk once dropped.
    pub fn temporary() -> Result<Self> {
        let inner = sled::Config::default().temporary(true).open()?;
        Ok(Self { inner })
    }

    pub fn get_collection<T: DeserializeOwned + Collectable>(&self) -> Result<Vec<T>> {
        self.get_collection_at(T::get_collection_name())
    }

    /// Gets a collection of entries of the same type from the collection
    /// specified by name.
    pub fn get_collection_at<T: DeserializeOwned>(&self, name: impl AsRef<[u8]>) -> Result<Vec<T>> {
        let tree = self.inner.open_tree(name)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            out.push(decode(&value_bytes)?);
        }
        Ok(out)
    }

    /// Gets an item from the collection defined for the item type, `None` if
    /// nothing is stored under the id.
    pub fn find<T: DeserializeOwned + Collectable>(&self, id: Uuid) -> Result<Option<T>> {
        let tree = self.inner.open_tree(T::get_collection_name())?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + Identifiable + Collectable>(&self, value: &T) -> Result<()> {
        self.set_at(T::get_collection_name(), value)
    }

    pub fn set_at<T: Serialize + Identifiable>(
        &self,
        collection: impl AsRef<[u8]>,
        value: &T,
    ) -> Result<()> {
        let tree = self.inner.open_tree(collection)?;
        let encoded = encode(value)?;
        tree.insert(value.get_id().as_bytes(), encoded)?;
        Ok(())
    }

    /// Reads the stored item, passes it through `f` and writes the result
    /// back, provided the entry was not modified in the meantime.
    ///
    /// Returns `Ok(None)` if nothing is stored under `id`. Losing the race
    /// against a concurrent writer results in a `DbConflict`.
    pub fn update_with<T, F>(&self, id: Uuid, f: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Collectable,
        F: FnOnce(T) -> Result<T>,
    {
        let tree = self.inner.open_tree(T::get_collection_name())?;
        let Some(current) = tree.get(id.as_bytes())? else {
            return Ok(None);
        };
        let new = f(decode(&current)?)?;
        match tree.compare_and_swap(id.as_bytes(), Some(current), Some(encode(&new)?))? {
            Ok(()) => Ok(Some(new)),
            Err(_) => Err(ErrorKind::DbConflict(format!(
                "entity with id '{}' in collection {} was modified concurrently",
                id,
                T::get_collection_name()
            ))
            .into()),
        }
    }

    /// Removes an entry by id. Returns whether anything was removed.
    pub fn remove_by_id<T: Collectable>(&self, id: Uuid) -> Result<bool> {
        let tree = self.inner.open_tree(T::get_collection_name())?;
        Ok(tree.remove(id.as_bytes())?.is_some())
    }
}
