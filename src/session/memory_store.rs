//! In-memory carrier.
//!
//! Suitable for tests and single-process tools.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::AuthError;

use super::carrier::{Carrier, CarrierKey};

/// Entries are kept in a `HashMap` behind a `RwLock`; clones share storage.
///
/// Entries are lost when the process restarts.
/// For persistent storage, use [`FileCarrier`](super::FileCarrier).
#[derive(Clone, Default)]
pub struct InMemoryCarrier {
    entries: Arc<RwLock<HashMap<CarrierKey, String>>>,
}

impl InMemoryCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Carrier for InMemoryCarrier {
    fn get(&self, key: CarrierKey) -> Option<String> {
        self.entries.read().ok()?.get(&key).cloned()
    }

    fn set(&self, key: CarrierKey, value: &str) -> Result<(), AuthError> {
        self.entries
            .write()
            .map_err(|_| AuthError::Internal("Lock poisoned".to_owned()))?
            .insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: CarrierKey) -> Result<(), AuthError> {
        self.entries
            .write()
            .map_err(|_| AuthError::Internal("Lock poisoned".to_owned()))?
            .remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let carrier = InMemoryCarrier::new();
        assert!(carrier.is_empty());

        carrier.set(CarrierKey::UserEmail, "ana@x.com").unwrap();
        assert_eq!(carrier.get(CarrierKey::UserEmail).as_deref(), Some("ana@x.com"));
        assert_eq!(carrier.len(), 1);

        carrier.remove(CarrierKey::UserEmail).unwrap();
        assert_eq!(carrier.get(CarrierKey::UserEmail), None);

        // removing an absent key is fine
        carrier.remove(CarrierKey::UserEmail).unwrap();
    }

    #[test]
    fn test_clones_share_entries() {
        let carrier = InMemoryCarrier::new();
        let other = carrier.clone();
        carrier.set(CarrierKey::UserId, "3").unwrap();
        assert_eq!(other.get(CarrierKey::UserId).as_deref(), Some("3"));
    }
}
