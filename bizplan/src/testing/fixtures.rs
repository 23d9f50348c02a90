//! The EcoFashion intake: a sustainable clothing startup with every
//! required field answered.

use crate::intake::{IntakeRecord, IntakeSnapshot, IntakeValue};
use serde_json::{Map, Value};

const TEXT_FIELDS: &[(&str, &str)] = &[
    ("business_name", "EcoFashion"),
    ("start_year", "2020"),
    ("primary_countries", "Denmark, Sweden"),
    ("product_service_description", "Clothing made from recycled ocean plastics"),
    ("segment_name", "Conscious urban shoppers"),
    ("segment_demographics", "Ages 25-40, city dwellers, mid to high income"),
    ("segment_characteristics", "Value sustainability and transparent supply chains"),
    ("customer_count", "50000"),
    ("problems_faced", "Few affordable sustainable fashion options"),
    ("biggest_competitors", "Patagonia, Reformation"),
    ("team_members", "Two founders with retail and textile backgrounds"),
    ("funding_amount", "250000 EUR"),
    ("funding_purpose", "Production scale-up and online marketing"),
];

const TAG_FIELDS: &[(&str, &[&str])] = &[
    ("financial_funding", &["Own financing"]),
    ("end_consumer_characteristics_2", &["Individuals"]),
    ("competitive_parameters", &["Quality", "Innovation"]),
    ("value_propositions", &["Quality"]),
    ("primary_revenue", &["Sales"]),
    ("distribution_channels", &["Webshop"]),
    ("product_related_characteristics", &["Recycled materials"]),
    ("material_resources", &["Facilities"]),
    ("intangible_resources", &["Brands"]),
    ("important_activities", &["Production", "Marketing"]),
    ("inhouse_activities", &["Core operations"]),
    ("important_strategic_partners", &["Suppliers"]),
    ("partnership_benefits", &["Reducing risk"]),
    ("cost_intensive_components", &["Production Department"]),
];

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Returns the EcoFashion answers as a record.
#[must_use]
pub fn eco_fashion_record() -> IntakeRecord {
    let mut record = IntakeRecord::new();
    for (name, value) in TEXT_FIELDS {
        record.insert(*name, IntakeValue::Text((*value).to_string()));
    }
    for (name, values) in TAG_FIELDS {
        record.insert(*name, IntakeValue::Tags(tags(values)));
    }
    record
}

/// Returns the EcoFashion answers as a generation request body, without
/// provider keys.
#[must_use]
pub fn eco_fashion_body() -> Map<String, Value> {
    let mut body = Map::new();
    for (name, value) in TEXT_FIELDS {
        body.insert((*name).to_string(), Value::String((*value).to_string()));
    }
    for (name, values) in TAG_FIELDS {
        body.insert((*name).to_string(), Value::Array(values.iter().map(|v| Value::String((*v).to_string())).collect()));
    }
    body
}

/// Returns the EcoFashion record frozen at version 1.
#[must_use]
pub fn eco_fashion_intake() -> IntakeSnapshot {
    IntakeSnapshot::new(eco_fashion_record(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeSchema;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_body_parses_to_record() {
        let parsed = IntakeSchema::business_plan().parse(&eco_fashion_body()).unwrap();
        assert_eq!(parsed, eco_fashion_record());
    }

    #[test]
    fn test_covers_required_fields() {
        let schema = IntakeSchema::business_plan();
        let record = eco_fashion_record();
        for field in schema.fields().iter().filter(|f| f.required) {
            assert!(record.get(field.name).is_some(), "{} missing", field.name);
        }
    }
}
