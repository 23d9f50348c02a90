//! Per-session form state.

use super::{FieldKind, FieldSpec, IntakeRecord, IntakeSchema, IntakeSnapshot, IntakeValue, Section};
use crate::errors::IntakeError;
use std::collections::BTreeSet;

/// Versioned, mutable intake state for one form session.
///
/// Each successful mutation bumps the version. [`IntakeBuilder::freeze`]
/// takes an immutable snapshot that later edits never affect.
#[derive(Debug, Clone)]
pub struct IntakeBuilder {
    schema: IntakeSchema,
    record: IntakeRecord,
    version: u64,
    page: Section,
    visited: BTreeSet<Section>,
}

impl IntakeBuilder {
    /// Creates an empty builder positioned on the first section.
    #[must_use]
    pub fn new(schema: IntakeSchema) -> Self {
        Self {
            schema,
            record: IntakeRecord::new(),
            version: 0,
            page: Section::CompanyBasics,
            visited: BTreeSet::from([Section::CompanyBasics]),
        }
    }

    fn spec(&self, name: &str, kind: FieldKind) -> Result<FieldSpec, IntakeError> {
        let spec = *self
            .schema
            .get(name)
            .ok_or_else(|| IntakeError::UnknownField(name.to_string()))?;
        if spec.kind != kind {
            return Err(IntakeError::WrongType {
                field: name.to_string(),
                expected: match spec.kind {
                    FieldKind::Text => "free text",
                    FieldKind::Choice => "a single choice",
                    FieldKind::Tags => "a set of choices",
                },
            });
        }
        Ok(spec)
    }

    fn commit(&mut self, name: &str, value: IntakeValue) {
        self.record.insert(name, value);
        self.version += 1;
    }

    /// Sets a free-text field.
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), IntakeError> {
        self.spec(name, FieldKind::Text)?;
        self.commit(name, IntakeValue::Text(value.into()));
        Ok(())
    }

    /// Sets a single-choice field. The value must be one of the offered options.
    pub fn set_choice(&mut self, name: &str, value: impl Into<String>) -> Result<(), IntakeError> {
        let spec = self.spec(name, FieldKind::Choice)?;
        let value = value.into();
        if !spec.accepts(&value) {
            return Err(IntakeError::InvalidChoice { field: name.to_string(), value });
        }
        self.commit(name, IntakeValue::Choice(value));
        Ok(())
    }

    /// Sets a tag field. Duplicates collapse; the selection limit applies after.
    pub fn set_tags<I, S>(&mut self, name: &str, values: I) -> Result<(), IntakeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.spec(name, FieldKind::Tags)?;

        let mut tags: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !spec.accepts(&value) {
                return Err(IntakeError::InvalidChoice { field: name.to_string(), value });
            }
            if !tags.contains(&value) {
                tags.push(value);
            }
        }

        if let Some(max) = spec.max_selections {
            if tags.len() > max {
                return Err(IntakeError::TooManySelections {
                    field: name.to_string(),
                    max,
                    got: tags.len(),
                });
            }
        }

        self.commit(name, IntakeValue::Tags(tags));
        Ok(())
    }

    /// Clears a field. Returns the removed value.
    pub fn clear(&mut self, name: &str) -> Result<Option<IntakeValue>, IntakeError> {
        if !self.schema.contains(name) {
            return Err(IntakeError::UnknownField(name.to_string()));
        }
        let removed = self.record.remove(name);
        if removed.is_some() {
            self.version += 1;
        }
        Ok(removed)
    }

    /// Jumps to a section and marks it visited.
    pub fn visit(&mut self, section: Section) {
        self.page = section;
        self.visited.insert(section);
    }

    /// Advances to the next section; stays on the last one.
    pub fn next_page(&mut self) -> Section {
        if let Some(next) = self.page.next() {
            self.visit(next);
        }
        self.page
    }

    /// Returns to the previous section; stays on the first one.
    pub fn previous_page(&mut self) -> Section {
        if let Some(previous) = self.page.previous() {
            self.visit(previous);
        }
        self.page
    }

    /// Returns the current section.
    #[must_use]
    pub fn page(&self) -> Section {
        self.page
    }

    /// Returns true once every section has been visited.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Section::ALL.iter().all(|s| self.visited.contains(s))
    }

    /// Returns the mutation counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the current record.
    #[must_use]
    pub fn record(&self) -> &IntakeRecord {
        &self.record
    }

    /// Takes an immutable snapshot of the current record.
    #[must_use]
    pub fn freeze(&self) -> IntakeSnapshot {
        IntakeSnapshot::new(self.record.clone(), self.version)
    }
}

impl Default for IntakeBuilder {
    fn default() -> Self {
        Self::new(IntakeSchema::business_plan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_fields_bumps_version() {
        let mut builder = IntakeBuilder::default();
        builder.set_text("business_name", "EcoFashion").unwrap();
        builder.set_choice("product_range", "Wide").unwrap();
        builder.set_tags("financial_funding", ["Own financing"]).unwrap();

        assert_eq!(builder.version(), 3);
        assert_eq!(builder.record().render("financial_funding"), "Own financing");
    }

    #[test]
    fn test_invalid_choice_rejected() {
        let mut builder = IntakeBuilder::default();
        let err = builder.set_choice("market_type", "Duopoly").unwrap_err();

        assert_eq!(
            err,
            IntakeError::InvalidChoice { field: "market_type".into(), value: "Duopoly".into() }
        );
        assert_eq!(builder.version(), 0);
    }

    #[test]
    fn test_selection_limit() {
        let mut builder = IntakeBuilder::default();
        let err = builder
            .set_tags(
                "cost_intensive_components",
                ["Marketing Department", "Sales Department", "Inbound logistics", "Outbound logistics"],
            )
            .unwrap_err();

        assert!(matches!(err, IntakeError::TooManySelections { max: 3, got: 4, .. }));
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let mut builder = IntakeBuilder::default();
        builder.set_tags("primary_revenue", ["Sales", "Ads", "Sales"]).unwrap();

        assert_eq!(builder.record().render("primary_revenue"), "Sales, Ads");
    }

    #[test]
    fn test_wrong_kind_and_unknown_field() {
        let mut builder = IntakeBuilder::default();

        assert!(matches!(
            builder.set_text("financial_funding", "cash"),
            Err(IntakeError::WrongType { .. })
        ));
        assert_eq!(
            builder.set_text("nickname", "x").unwrap_err(),
            IntakeError::UnknownField("nickname".into())
        );
    }

    #[test]
    fn test_clear() {
        let mut builder = IntakeBuilder::default();
        builder.set_text("team_members", "Ada").unwrap();

        assert!(builder.clear("team_members").unwrap().is_some());
        assert!(builder.clear("team_members").unwrap().is_none());
        assert_eq!(builder.version(), 2);
    }

    #[test]
    fn test_page_navigation_and_completion() {
        let mut builder = IntakeBuilder::default();
        assert_eq!(builder.page(), Section::CompanyBasics);
        assert!(!builder.is_complete());

        assert_eq!(builder.previous_page(), Section::CompanyBasics);
        assert_eq!(builder.next_page(), Section::MarketAndRevenue);
        assert_eq!(builder.next_page(), Section::ResourcesAndTeam);
        assert_eq!(builder.next_page(), Section::ResourcesAndTeam);
        assert!(builder.is_complete());

        assert_eq!(builder.previous_page(), Section::MarketAndRevenue);
    }

    #[test]
    fn test_freeze_is_isolated_from_later_edits() {
        let mut builder = IntakeBuilder::default();
        builder.set_text("business_name", "EcoFashion").unwrap();
        let snapshot = builder.freeze();

        builder.set_text("business_name", "Renamed").unwrap();

        assert_eq!(snapshot.render("business_name"), "EcoFashion");
        assert_eq!(snapshot.version(), 1);
        assert_eq!(builder.version(), 2);
    }
}
