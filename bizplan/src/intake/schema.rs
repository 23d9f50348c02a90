//! The canonical intake schema.
//!
//! Every field the form collects is declared once here, with its section,
//! kind, boundary requiredness and the options the form offers.

use super::{IntakeRecord, IntakeValue};
use crate::errors::IntakeError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The three wizard sections of the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Page 1: company basics.
    CompanyBasics,
    /// Page 2: segment, market and revenue.
    MarketAndRevenue,
    /// Page 3: resources, partners and team.
    ResourcesAndTeam,
}

impl Section {
    /// All sections in page order.
    pub const ALL: [Self; 3] = [Self::CompanyBasics, Self::MarketAndRevenue, Self::ResourcesAndTeam];

    /// Returns the 1-based page number.
    #[must_use]
    pub fn page(self) -> usize {
        match self {
            Self::CompanyBasics => 1,
            Self::MarketAndRevenue => 2,
            Self::ResourcesAndTeam => 3,
        }
    }

    /// Returns the page heading.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::CompanyBasics => "Part 1: Basic information and market information",
            Self::MarketAndRevenue => "Part 2: Segmentation and Revenue Information",
            Self::ResourcesAndTeam => "Part 3: Resources, Partners, and Team",
        }
    }

    /// Returns the following section, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::CompanyBasics => Some(Self::MarketAndRevenue),
            Self::MarketAndRevenue => Some(Self::ResourcesAndTeam),
            Self::ResourcesAndTeam => None,
        }
    }

    /// Returns the preceding section, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::CompanyBasics => None,
            Self::MarketAndRevenue => Some(Self::CompanyBasics),
            Self::ResourcesAndTeam => Some(Self::MarketAndRevenue),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// One value from an enumerated set.
    Choice,
    /// A set of values from an enumerated set.
    Tags,
}

/// Declaration of one intake field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// The field name, also the prompt placeholder.
    pub name: &'static str,
    /// The section that collects the field.
    pub section: Section,
    /// The value shape.
    pub kind: FieldKind,
    /// Whether the generation request must carry the field.
    pub required: bool,
    /// Options offered by the form; empty means unconstrained.
    pub options: &'static [&'static str],
    /// Maximum number of tags, if limited.
    pub max_selections: Option<usize>,
}

impl FieldSpec {
    const fn text(name: &'static str, section: Section, required: bool) -> Self {
        Self { name, section, kind: FieldKind::Text, required, options: &[], max_selections: None }
    }

    const fn choice(name: &'static str, section: Section, options: &'static [&'static str]) -> Self {
        Self { name, section, kind: FieldKind::Choice, required: false, options, max_selections: None }
    }

    const fn tags(
        name: &'static str,
        section: Section,
        required: bool,
        options: &'static [&'static str],
        max_selections: Option<usize>,
    ) -> Self {
        Self { name, section, kind: FieldKind::Tags, required, options, max_selections }
    }

    /// Returns true if the value is one of the offered options.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.options.is_empty() || self.options.contains(&value)
    }
}

use FieldSpec as F;
use Section::{CompanyBasics as S1, MarketAndRevenue as S2, ResourcesAndTeam as S3};

const LEGAL_STRUCTURES: &[&str] = &[
    "Sole proprietorship",
    "Private limited company",
    "General partnership",
    "Limited partnership",
    "Public limited company",
    "Association",
    "Branch of another company",
    "Non-profit",
];

const FUNDING_SOURCES: &[&str] =
    &["Own financing", "Funding from investors", "Bank loan", "Revenue from sales", "Other"];

const BUSINESS_SECTORS: &[&str] = &[
    "Raw materials (eg mining, steel, trading companies)",
    "Industrial business (e.g. means of production, transport)",
    "Services (e.g. commercial and professional services, tourism)",
    "Durable consumer goods (e.g., furniture, clothing, retail)",
    "Fast-moving consumer goods (e.g., food, beverages, personal products)",
    "Healthcare (e.g., healthcare equipment, pharmaceuticals)",
    "Financial sectors (e.g., banks, insurance)",
    "Information technology",
    "Utilities and energy",
    "Culture and entertainment",
];

const PARTNERSHIP_BENEFITS: &[&str] = &[
    "Cost reduction (e.g. economies of scale, up-selling, raw material cost reduction, sharing common infrastructure)",
    "Reducing risk",
    "Access to important information (e.g. market knowledge, research and development, legislation)",
    "Outsourcing of activities (e.g. business partners sell/deliver products/services to our customers)",
    "Increases bargaining power",
    "Access to special customer segments",
    "Access to critical resources",
    "Funding/Financing",
    "Other",
];

const DEPENDENCY_LEVELS: &[&str] = &[
    "Not Dependent",
    "Somewhat Dependent",
    "Dependent",
    "Highly Dependent",
    "Completely Dependent",
];

const COST_COMPONENTS: &[&str] = &[
    "Administration, finance and management/control",
    "Building and maintaining customer relationships",
    "Building and maintaining partnerships",
    "Follow-up sales and service activities",
    "Management and employee development",
    "Inbound logistics",
    "Outbound logistics",
    "Marketing Department",
    "Sales Department",
    "Advising and solving clients' unique challenges",
    "Procurement Department",
    "Production Department",
    "R&D (research and development)",
];

const BUSINESS_PLAN_FIELDS: &[FieldSpec] = &[
    // Company basics
    F::text("business_name", S1, true),
    F::text("start_year", S1, true),
    F::text("business_reason", S1, false),
    F::text("mission_vision", S1, false),
    F::choice("legal_structure", S1, LEGAL_STRUCTURES),
    F::tags("financial_funding", S1, true, FUNDING_SOURCES, Some(5)),
    F::choice("business_sector", S1, BUSINESS_SECTORS),
    F::choice("raw_materials_type", S1, &["Mining", "Steel", "Trading", "Other"]),
    F::choice("industrial_business_type", S1, &[]),
    F::choice("services_type", S1, &[]),
    F::choice("durable_goods_type", S1, &[]),
    F::choice("consumer_goods_type", S1, &[]),
    F::choice("healthcare_type", S1, &[]),
    F::choice("financial_sector_type", S1, &[]),
    F::choice("it_sector_type", S1, &[]),
    F::choice("utilities_type", S1, &[]),
    F::choice("culture_type", S1, &[]),
    F::text("primary_countries", S1, true),
    F::choice("product_centralisation", S1, &["Centralized", "Decentralized"]),
    F::choice("product_range", S1, &["Narrow", "Medium", "Wide"]),
    F::choice("end_consumer_characteristics", S1, &[]),
    F::tags("end_consumer_characteristics_2", S1, true, &["Individuals", "Businesses", "Government", "Other"], None),
    F::text("product_service_description", S1, true),
    // Segment, market and revenue
    F::text("segment_name", S2, true),
    F::text("segment_demographics", S2, true),
    F::text("segment_characteristics", S2, true),
    F::text("customer_count", S2, true),
    F::text("problems_faced", S2, true),
    F::text("biggest_competitors", S2, true),
    F::choice("competition_intensity", S2, &["Low", "Medium", "High"]),
    F::choice("price_comparison", S2, &["Lower", "Similar", "Higher"]),
    F::choice("market_type", S2, &["Monopoly", "Oligopoly", "Competitive"]),
    F::tags("competitive_parameters", S2, true, &["Quality", "Price", "Innovation", "Service", "Other"], None),
    F::tags("value_propositions", S2, true, &["Efficiency", "Quality", "Cost", "Innovation", "Other"], None),
    F::choice("direct_income", S2, &["Yes", "No"]),
    F::tags("primary_revenue", S2, true, &["Sales", "Subscriptions", "Ads", "Other"], None),
    F::tags("one_time_payments", S2, false, &[], None),
    F::tags("ongoing_payments", S2, false, &[], None),
    F::tags("payment_characteristics", S2, false, &[], None),
    F::choice("package_price", S2, &[]),
    F::choice("price_negotiation", S2, &[]),
    F::tags("fixed_prices", S2, false, &[], None),
    F::tags("dynamic_prices", S2, false, &[], None),
    F::tags("distribution_channels", S2, true, &[], None),
    F::choice("purchasing_power", S2, &[]),
    F::tags("product_related_characteristics", S2, true, &[], None),
    F::choice("self_service_availability", S2, &[]),
    F::choice("online_communities_presence", S2, &[]),
    F::choice("development_process_customer_involvement", S2, &[]),
    F::choice("after_sale_purchases", S2, &[]),
    F::choice("personal_assistance_offered", S2, &[]),
    F::choice("similar_products_switch", S2, &[]),
    F::choice("general_customer_relation", S2, &[]),
    // Resources, partners and team
    F::tags("material_resources", S3, true, &["Equipment", "Facilities", "Inventory", "Other"], None),
    F::tags("intangible_resources", S3, true, &["Patents", "Brands", "Software", "Other"], None),
    F::tags("important_activities", S3, true, &["Production", "Marketing", "R&D", "Other"], None),
    F::tags("inhouse_activities", S3, true, &["Core operations", "Support functions", "Other"], None),
    F::tags("outsourced_activities", S3, false, &["Logistics", "IT", "Manufacturing", "Other"], None),
    F::tags("company_statements", S3, false, &["Mission", "Vision", "Values", "Other"], None),
    F::tags("important_strategic_partners", S3, true, &["Suppliers", "Distributors", "Allies", "Other"], None),
    F::tags("partnership_benefits", S3, true, PARTNERSHIP_BENEFITS, Some(3)),
    F::text("other_benefit", S3, false),
    F::choice("company_dependency", S3, DEPENDENCY_LEVELS),
    F::tags("cost_intensive_components", S3, true, COST_COMPONENTS, Some(3)),
    F::text("team_members", S3, true),
    F::text("funding_amount", S3, true),
    F::text("funding_purpose", S3, true),
];

/// A set of field declarations.
#[derive(Debug, Clone)]
pub struct IntakeSchema {
    fields: Vec<FieldSpec>,
    index: HashMap<&'static str, usize>,
}

impl IntakeSchema {
    /// Creates a schema from field declarations.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let index = fields.iter().enumerate().map(|(i, f)| (f.name, i)).collect();
        Self { fields, index }
    }

    /// The business plan intake schema.
    #[must_use]
    pub fn business_plan() -> Self {
        Self::new(BUSINESS_PLAN_FIELDS.to_vec())
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Checks whether a field is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns all fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the fields of one section.
    pub fn section(&self, section: Section) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.section == section)
    }

    /// Parses a generation request body into a record.
    ///
    /// Requiredness and value shapes are enforced; option membership and
    /// selection limits are the form's concern and are not re-checked here.
    /// Keys outside the schema are ignored.
    pub fn parse(
        &self,
        body: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<IntakeRecord, IntakeError> {
        let mut record = IntakeRecord::new();

        for spec in &self.fields {
            let value = match body.get(spec.name) {
                None if spec.required => return Err(IntakeError::MissingField(spec.name.to_string())),
                None | Some(serde_json::Value::Null) if !spec.required => continue,
                None => continue,
                Some(value) => value,
            };

            let parsed = match (spec.kind, value) {
                (FieldKind::Text, serde_json::Value::String(s)) => IntakeValue::Text(s.clone()),
                (FieldKind::Choice, serde_json::Value::String(s)) => IntakeValue::Choice(s.clone()),
                (FieldKind::Tags, serde_json::Value::Array(items)) => {
                    let mut tags = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            serde_json::Value::String(s) => tags.push(s.clone()),
                            _ => {
                                return Err(IntakeError::WrongType {
                                    field: spec.name.to_string(),
                                    expected: "a list of strings",
                                })
                            }
                        }
                    }
                    IntakeValue::Tags(tags)
                }
                (FieldKind::Tags, _) => {
                    return Err(IntakeError::WrongType {
                        field: spec.name.to_string(),
                        expected: "a list of strings",
                    })
                }
                (FieldKind::Text | FieldKind::Choice, _) => {
                    return Err(IntakeError::WrongType {
                        field: spec.name.to_string(),
                        expected: "a string",
                    })
                }
            };
            record.insert(spec.name, parsed);
        }

        for key in body.keys().filter(|k| !self.contains(k)) {
            tracing::debug!(field = %key, "Ignoring unknown intake field");
        }

        Ok(record)
    }
}

impl Default for IntakeSchema {
    fn default() -> Self {
        Self::business_plan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::eco_fashion_body;
    use serde_json::json;

    #[test]
    fn test_schema_covers_required_fields() {
        let schema = IntakeSchema::business_plan();
        let required: Vec<_> = schema.fields().iter().filter(|f| f.required).map(|f| f.name).collect();

        assert_eq!(required.len(), 27);
        assert!(required.contains(&"business_name"));
        assert!(required.contains(&"cost_intensive_components"));
        assert!(!required.contains(&"legal_structure"));
    }

    #[test]
    fn test_field_names_are_unique() {
        let schema = IntakeSchema::business_plan();
        assert_eq!(schema.index.len(), schema.fields().len());
    }

    #[test]
    fn test_sections_partition_fields() {
        let schema = IntakeSchema::business_plan();
        let total: usize = Section::ALL.iter().map(|s| schema.section(*s).count()).sum();
        assert_eq!(total, schema.fields().len());
        assert_eq!(schema.get("team_members").unwrap().section, Section::ResourcesAndTeam);
    }

    #[test]
    fn test_parse_full_body() {
        let schema = IntakeSchema::business_plan();
        let record = schema.parse(&eco_fashion_body()).unwrap();

        assert_eq!(record.render("business_name"), "EcoFashion");
        assert_eq!(record.render("financial_funding"), "Own financing");
        assert_eq!(record.render("legal_structure"), "");
    }

    #[test]
    fn test_parse_missing_required() {
        let schema = IntakeSchema::business_plan();
        let mut body = eco_fashion_body();
        body.remove("segment_name");

        assert_eq!(
            schema.parse(&body).unwrap_err(),
            IntakeError::MissingField("segment_name".into())
        );
    }

    #[test]
    fn test_parse_null_optional_is_absent() {
        let schema = IntakeSchema::business_plan();
        let mut body = eco_fashion_body();
        body.insert("legal_structure".into(), json!(null));
        body.insert("fixed_prices".into(), json!(null));

        let record = schema.parse(&body).unwrap();
        assert!(record.get("legal_structure").is_none());
        assert_eq!(record.render("fixed_prices"), "");
    }

    #[test]
    fn test_parse_wrong_type() {
        let schema = IntakeSchema::business_plan();
        let mut body = eco_fashion_body();
        body.insert("financial_funding".into(), json!("Own financing"));

        assert!(matches!(
            schema.parse(&body),
            Err(IntakeError::WrongType { ref field, .. }) if field == "financial_funding"
        ));
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let schema = IntakeSchema::business_plan();
        let mut body = eco_fashion_body();
        body.insert("characteristics".into(), json!(["x"]));

        let record = schema.parse(&body).unwrap();
        assert!(record.get("characteristics").is_none());
    }

    #[test]
    fn test_accepts_unconstrained_choice() {
        let schema = IntakeSchema::business_plan();
        assert!(schema.get("purchasing_power").unwrap().accepts("anything"));
        assert!(!schema.get("product_range").unwrap().accepts("Huge"));
    }

    #[test]
    fn test_section_navigation() {
        assert_eq!(Section::CompanyBasics.next(), Some(Section::MarketAndRevenue));
        assert_eq!(Section::ResourcesAndTeam.next(), None);
        assert_eq!(Section::CompanyBasics.previous(), None);
        assert_eq!(Section::ResourcesAndTeam.page(), 3);
    }
}
