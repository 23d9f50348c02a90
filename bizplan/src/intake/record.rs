//! Intake records and frozen snapshots.

use super::IntakeValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntakeRecord {
    values: BTreeMap<String, IntakeValue>,
}

impl IntakeRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: IntakeValue) -> Option<IntakeValue> {
        self.values.insert(name.into(), value)
    }

    /// Removes a field.
    pub fn remove(&mut self, name: &str) -> Option<IntakeValue> {
        self.values.remove(name)
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IntakeValue> {
        self.values.get(name)
    }

    /// Renders a field for prompt interpolation; absent fields render empty.
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        self.values.get(name).map(IntakeValue::render).unwrap_or_default()
    }

    /// Returns the number of set fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IntakeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An immutable view of a record taken at generation time.
///
/// Cloning is cheap; every stage of a run reads the same snapshot.
#[derive(Debug, Clone)]
pub struct IntakeSnapshot {
    record: Arc<IntakeRecord>,
    version: u64,
}

impl IntakeSnapshot {
    /// Freezes a record at the given version.
    #[must_use]
    pub fn new(record: IntakeRecord, version: u64) -> Self {
        Self { record: Arc::new(record), version }
    }

    /// Returns the frozen record.
    #[must_use]
    pub fn record(&self) -> &IntakeRecord {
        &self.record
    }

    /// Returns the builder version the snapshot was taken at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Renders a field; absent fields render empty.
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        self.record.render(name)
    }
}

impl From<IntakeRecord> for IntakeSnapshot {
    fn from(record: IntakeRecord) -> Self {
        Self::new(record, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_absent_is_empty() {
        let record = IntakeRecord::new();
        assert_eq!(record.render("legal_structure"), "");
    }

    #[test]
    fn test_insert_replaces() {
        let mut record = IntakeRecord::new();
        record.insert("business_name", IntakeValue::Text("A".into()));
        let previous = record.insert("business_name", IntakeValue::Text("B".into()));

        assert_eq!(previous, Some(IntakeValue::Text("A".into())));
        assert_eq!(record.render("business_name"), "B");
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_snapshot_shares_record() {
        let mut record = IntakeRecord::new();
        record.insert("start_year", IntakeValue::Text("2020".into()));
        let snapshot = IntakeSnapshot::new(record, 4);
        let copy = snapshot.clone();

        assert!(Arc::ptr_eq(&snapshot.record, &copy.record));
        assert_eq!(copy.version(), 4);
        assert_eq!(copy.render("start_year"), "2020");
    }
}
