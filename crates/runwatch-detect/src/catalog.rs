//! Local zone catalog.

use runwatch_models::ZoneId;

use crate::error::{DetectError, DetectResult};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub id: ZoneId,
    pub label: String,
}

impl ZoneEntry {
    pub fn new(id: ZoneId) -> Self {
        let label = id.label();
        Self { id, label }
    }
}

/// Ordered set of known zones, unique by identifier.
#[derive(Debug, Clone, Default)]
pub struct ZoneCatalog {
    entries: Vec<ZoneEntry>,
}

impl ZoneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with one zone.
    pub fn with_default(zone: ZoneId) -> Self {
        Self {
            entries: vec![ZoneEntry::new(zone)],
        }
    }

    /// Add a user-entered zone name.
    ///
    /// Fails without touching the catalog if the name is empty or its
    /// canonical identifier already exists.
    pub fn add(&mut self, name: &str) -> DetectResult<ZoneId> {
        let id = ZoneId::parse(name)?;
        if self.contains(&id) {
            return Err(DetectError::DuplicateZone(id.label()));
        }
        self.entries.push(ZoneEntry::new(id.clone()));
        Ok(id)
    }

    /// Merge externally defined zones. Existing identifiers are kept as-is
    /// and unparseable names are skipped. Returns the number added.
    pub fn merge<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let Ok(id) = ZoneId::parse(name.as_ref()) else {
                continue;
            };
            if !self.contains(&id) {
                self.entries.push(ZoneEntry::new(id));
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    pub fn get(&self, id: &ZoneId) -> Option<&ZoneEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
