//! File-based carrier.
//!
//! Stores the entries of one client as a JSON object in a single file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::AuthError;

use super::carrier::{Carrier, CarrierKey};

/// Carrier persisted to a JSON file, so a session survives process restarts.
///
/// Every write rewrites the whole file. A missing or unreadable file reads as
/// an empty carrier.
///
/// # Example
///
/// ```rust,ignore
/// use rdx_dash::session::FileCarrier;
///
/// let carrier = FileCarrier::new("/var/lib/rdx-dash/operator.json")?;
/// ```
pub struct FileCarrier {
    path: PathBuf,
    // serialises read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileCarrier {
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Internal(format!("Failed to create carrier directory: {e}"))
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(target: "rdx_dash::session", "msg=\"carrier file unreadable\" path=\"{}\" error=\"{e}\"", self.path.display());
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| AuthError::Internal(format!("Failed to serialize carrier: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| AuthError::Internal(format!("Failed to write carrier file: {e}")))
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AuthError::Internal("Lock poisoned".to_owned()))?;
        let mut entries = self.read_entries();
        f(&mut entries);
        self.write_entries(&entries)
    }
}

impl Carrier for FileCarrier {
    fn get(&self, key: CarrierKey) -> Option<String> {
        self.read_entries().remove(key.as_str())
    }

    fn set(&self, key: CarrierKey, value: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: CarrierKey) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::crypto::generate_token;
    use crate::session::Session;

    fn temp_file() -> PathBuf {
        env::temp_dir()
            .join(format!("rdx_dash_carrier_test_{}", generate_token(8)))
            .join("carrier.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let path = temp_file();
        let carrier = FileCarrier::new(&path).unwrap();
        assert_eq!(carrier.get(CarrierKey::LoggedIn), None);
        cleanup(&path);
    }

    #[test]
    fn test_entries_survive_new_instance() {
        let path = temp_file();
        {
            let carrier = FileCarrier::new(&path).unwrap();
            carrier.set(CarrierKey::LoggedIn, "true").unwrap();
            carrier.set(CarrierKey::Expiration, "1700000100").unwrap();
        }

        let reopened = FileCarrier::new(&path).unwrap();
        assert_eq!(reopened.get(CarrierKey::LoggedIn).as_deref(), Some("true"));
        assert_eq!(reopened.get(CarrierKey::Expiration).as_deref(), Some("1700000100"));
        cleanup(&path);
    }

    #[test]
    fn test_corrupt_file_degrades_to_logged_out() {
        let path = temp_file();
        let carrier = FileCarrier::new(&path).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let session = Session::rehydrate(&carrier);
        assert!(!session.is_valid(0));
        cleanup(&path);
    }

    #[test]
    fn test_remove() {
        let path = temp_file();
        let carrier = FileCarrier::new(&path).unwrap();
        carrier.set(CarrierKey::UserEmail, "ana@x.com").unwrap();
        carrier.remove(CarrierKey::UserEmail).unwrap();
        assert_eq!(carrier.get(CarrierKey::UserEmail), None);
        cleanup(&path);
    }
}
