//! Favourite anime ids and their persisted form.

use anyhow::Result;
use serde_json::Value;
use shared::KeyValueStore;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Storage key holding the favourite ids
pub const FAVOURITES_KEY: &str = "favourites";

/// Set of favourite anime ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavouriteSet {
    ids: HashSet<u32>,
}

impl FavouriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Flip membership of `id`. Returns whether it is a favourite afterwards.
    pub fn toggle(&mut self, id: u32) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order
    pub fn sorted(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Stored form: a JSON array of integers, ascending
    pub fn to_value(&self) -> Value {
        Value::from(self.sorted())
    }

    /// Decode the stored form. Anything other than an array of non-negative
    /// integers that fit in `u32` is rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let ids = items
            .iter()
            .map(|item| item.as_u64().and_then(|id| u32::try_from(id).ok()))
            .collect::<Option<HashSet<u32>>>()?;
        Some(Self { ids })
    }

    /// Read favourites from `store`.
    ///
    /// Missing, malformed or unreadable data all yield an empty set; the
    /// problem is logged and never fatal.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load(FAVOURITES_KEY) {
            Ok(Some(value)) => match Self::from_value(&value) {
                Some(set) => {
                    debug!(count = set.len(), "Loaded favourites");
                    set
                }
                None => {
                    warn!(stored = %value, "Stored favourites are not an array of ids, starting empty");
                    Self::default()
                }
            },
            Ok(None) => {
                debug!("No stored favourites");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read favourites, starting empty");
                Self::default()
            }
        }
    }

    /// Write the full set to `store`
    pub fn persist(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.save(FAVOURITES_KEY, &self.to_value())
    }
}

impl FromIterator<u32> for FavouriteSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::MemoryStore;

    #[test]
    fn test_double_toggle_restores() {
        let mut set: FavouriteSet = [3, 7].into_iter().collect();
        let before = set.clone();

        assert!(set.toggle(9));
        assert!(!set.toggle(9));
        assert_eq!(set, before);

        assert!(!set.toggle(3));
        assert!(set.toggle(3));
        assert_eq!(set, before);
    }

    #[test]
    fn test_stored_form_is_sorted() {
        let set: FavouriteSet = [42, 3, 7].into_iter().collect();
        assert_eq!(set.to_value(), json!([3, 7, 42]));
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert!(FavouriteSet::from_value(&json!({"ids": [1]})).is_none());
        assert!(FavouriteSet::from_value(&json!("1,2")).is_none());
        assert!(FavouriteSet::from_value(&json!([1, "2"])).is_none());
        assert!(FavouriteSet::from_value(&json!([1, -2])).is_none());
        assert!(FavouriteSet::from_value(&json!([1.5])).is_none());
        assert!(FavouriteSet::from_value(&json!([5_000_000_000u64])).is_none());
        assert_eq!(FavouriteSet::from_value(&json!([])), Some(FavouriteSet::new()));
    }

    #[test]
    fn test_load_and_persist() -> Result<()> {
        let store = MemoryStore::new();
        assert!(FavouriteSet::load(&store).is_empty());

        let set: FavouriteSet = [3, 7].into_iter().collect();
        set.persist(&store)?;
        assert_eq!(store.load(FAVOURITES_KEY)?, Some(json!([3, 7])));

        let loaded = FavouriteSet::load(&store);
        assert!(loaded.contains(7));
        assert!(!loaded.contains(9));

        Ok(())
    }

    #[test]
    fn test_load_malformed_is_empty() -> Result<()> {
        let store = MemoryStore::new();
        store.save(FAVOURITES_KEY, &json!({"oops": true}))?;
        assert!(FavouriteSet::load(&store).is_empty());
        Ok(())
    }
}
