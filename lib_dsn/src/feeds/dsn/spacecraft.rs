//! # Spacecraft Name Resolution
//!
//! The live feed identifies spacecraft by short codes (`vgr1`, `mro`, ...).
//! `SpacecraftFinder` maps them to the friendly names published in the
//! configuration document.
//!
//! The configuration table holds a few hundred entries and is searched
//! linearly, so every resolved code is memoized. A spacecraft usually stays
//! in view for many consecutive polls; after the first poll its name comes
//! straight from the cache. Codes are assumed never to be renamed while the
//! process runs, so cached entries never expire.

use std::collections::HashMap;

use super::model::ConfigDocument;
use crate::error::DsnError;

/// Resolves spacecraft codes to friendly names with a process-lifetime cache.
///
/// Resolution takes `&mut self`; a poller owns its finder exclusively, which
/// keeps cache writes single-threaded without a lock.
#[derive(Debug)]
pub struct SpacecraftFinder {
    /// The configuration table, read-only.
    config: ConfigDocument,
    /// Lower-cased code → friendly name.
    known: HashMap<String, String>,
    /// Number of linear scans of `config` performed so far.
    scans: usize,
}

impl SpacecraftFinder {
    /// Creates a finder over the given configuration document.
    pub fn new(config: ConfigDocument) -> Self {
        Self {
            config,
            known: HashMap::new(),
            scans: 0,
        }
    }

    /// Resolves `code` to its friendly name.
    ///
    /// Matching is case-insensitive. A hit is cached under the lower-cased
    /// code, so later lookups in any casing skip the scan. Misses are not
    /// cached.
    ///
    /// # Errors
    /// `UnknownSpacecraft` if no configuration entry carries `code`.
    pub fn resolve(&mut self, code: &str) -> Result<String, DsnError> {
        let key = code.to_lowercase();
        if let Some(name) = self.known.get(&key) {
            return Ok(name.clone());
        }

        self.scans += 1;
        let entry = self
            .config
            .spacecraft
            .iter()
            .find(|entry| entry.code.to_lowercase() == key)
            .ok_or_else(|| DsnError::UnknownSpacecraft(code.to_string()))?;

        log::debug!("Resolved spacecraft '{}' to '{}'", code, entry.friendly_name);
        self.known.insert(key, entry.friendly_name.clone());
        Ok(entry.friendly_name.clone())
    }

    /// Number of linear scans performed, i.e. cache misses.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
