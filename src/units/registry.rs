//! Tracked units keyed by name

use std::collections::HashMap;

use super::UnitRecord;

#[derive(Debug, Default)]
pub struct UnitRegistry {
    entries: HashMap<String, UnitRecord>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` unless its name is already tracked. Returns whether it
    /// was inserted; an existing record is never replaced.
    pub fn insert_if_absent(&mut self, record: UnitRecord) -> bool {
        if self.entries.contains_key(record.name()) {
            return false;
        }
        self.entries.insert(record.name().to_string(), record);
        true
    }

    pub fn get(&self, name: &str) -> Option<&UnitRecord> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UnitRecord> {
        self.entries.get_mut(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &UnitRecord> {
        self.entries.values()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut UnitRecord> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
