//! The shipped business plan catalog.
//!
//! Six content stages each write one part of the plan and read every part
//! written before them. A consolidator merges the parts; the quality gate
//! then reviews and rewrites the merged document.

use super::{Persona, Stage, StageCatalog};
use crate::core::StageKind;
use crate::errors::CatalogError;
use crate::gate::QualityGate;
use crate::providers::ProviderKind;

/// Business concept stage.
pub const CREATE_BUSINESS_CONCEPT: &str = "create_business_concept";
/// Product design stage.
pub const CREATE_PRODUCT_DESIGN: &str = "create_product_design";
/// Market analysis stage.
pub const CREATE_MARKET_ANALYSIS: &str = "create_market_analysis";
/// Marketing plan stage.
pub const CREATE_MARKETING_PLAN: &str = "create_marketing_plan";
/// Operating plan stage.
pub const CREATE_OPERATING_PLAN: &str = "create_operating_plan";
/// Financial plan stage.
pub const CREATE_FINANCIAL_PLAN: &str = "create_financial_plan";
/// Consolidation stage.
pub const CONSOLIDATE_PLAN: &str = "consolidate_plan";
/// Evaluation stage.
pub const EVALUATE_PLAN: &str = "evaluate_plan";
/// Refinement stage.
pub const REFINE_PLAN: &str = "refine_plan";

const BUSINESS_CONCEPT_PROMPT: &str = "\
Write the business concept chapter of a business plan for {business_name}, founded in {start_year}.

Why the business exists: {business_reason}
Mission and vision: {mission_vision}
Legal structure: {legal_structure}
Funding sources: {financial_funding}
Sector: {business_sector}
Sector details: {raw_materials_type}{industrial_business_type}{services_type}{durable_goods_type}\
{consumer_goods_type}{healthcare_type}{financial_sector_type}{it_sector_type}{utilities_type}{culture_type}
Primary countries: {primary_countries}
Products and services: {product_service_description}

Describe the idea, the problem it solves, the legal and ownership setup and the long-term \
ambition. Write in Markdown under the heading \"## Business Concept\".";

const PRODUCT_DESIGN_PROMPT: &str = "\
Write the product and service chapter for {business_name}.

Products and services: {product_service_description}
Production is {product_centralisation}; the product range is {product_range}.
End consumers: {end_consumer_characteristics_2}
End consumer characteristics: {end_consumer_characteristics}
Value propositions: {value_propositions}
Product-related characteristics: {product_related_characteristics}

Explain what is offered, how it creates value for each customer group and how the range \
is expected to evolve. Write in Markdown under the heading \"## Product and Service\".";

const MARKET_ANALYSIS_PROMPT: &str = "\
Write the market analysis chapter for {business_name}.

Target segment: {segment_name}
Demographics: {segment_demographics}
Characteristics: {segment_characteristics}
Estimated number of customers: {customer_count}
Problems the segment faces: {problems_faced}
Purchasing power: {purchasing_power}
Biggest competitors: {biggest_competitors}
Competition intensity: {competition_intensity}; our prices compared to competitors: {price_comparison}
Market type: {market_type}
We compete on: {competitive_parameters}

Size the market, profile the segment, map the competition and state where the company can win. \
Write in Markdown under the heading \"## Market Analysis\".";

const MARKETING_PLAN_PROMPT: &str = "\
Write the marketing and sales chapter for {business_name}.

Value propositions: {value_propositions}
Distribution channels: {distribution_channels}
Self-service: {self_service_availability}
Online communities: {online_communities_presence}
Customer involvement in development: {development_process_customer_involvement}
After-sale purchases: {after_sale_purchases}
Personal assistance: {personal_assistance_offered}
Likelihood of switching to similar products: {similar_products_switch}
Overall customer relationship: {general_customer_relation}

Cover positioning, channels, customer acquisition and retention, and a first-year campaign \
outline. Write in Markdown under the heading \"## Marketing Plan\".";

const OPERATING_PLAN_PROMPT: &str = "\
Write the operations chapter for {business_name}.

Material resources: {material_resources}
Intangible resources: {intangible_resources}
Key activities: {important_activities}
Done in-house: {inhouse_activities}
Outsourced: {outsourced_activities}
Company statements in place: {company_statements}
Strategic partners: {important_strategic_partners}
Partnership benefits: {partnership_benefits} {other_benefit}
Dependency on partners: {company_dependency}
Team: {team_members}

Describe how the company delivers day to day, who does what, which partners matter and \
the main operational risks. Write in Markdown under the heading \"## Operating Plan\".";

const FINANCIAL_PLAN_PROMPT: &str = "\
Write the financial chapter for {business_name}.

Direct income from customers: {direct_income}
Primary revenue streams: {primary_revenue}
One-time payments: {one_time_payments}
Ongoing payments: {ongoing_payments}
Payment characteristics: {payment_characteristics}
Package pricing: {package_price}; price negotiation: {price_negotiation}
Fixed prices: {fixed_prices}
Dynamic prices: {dynamic_prices}
Most cost-intensive components: {cost_intensive_components}
Funding sources: {financial_funding}
Funding needed: {funding_amount}
Use of funds: {funding_purpose}

Provide a revenue model, a cost structure, a three-year projection with stated assumptions \
and the funding plan. Write in Markdown under the heading \"## Financial Plan\".";

const CONSOLIDATE_PROMPT: &str = "\
Merge the chapters below into one complete business plan for {business_name}.

Start with \"# Business Plan: {business_name}\" and an executive summary, then keep every \
chapter in order. Remove repetition, resolve contradictions in favour of the most specific \
figures, and keep all numbers consistent between chapters. Return only the Markdown document.";

const EVALUATE_PROMPT: &str = "\
Review the business plan for {business_name} below.

Assess completeness, internal consistency, realism of the figures, clarity and how well \
the plan answers the founder's funding need of {funding_amount}. List concrete, actionable \
improvements ordered by impact.

End with exactly two lines:
Score: <0-10>/10
Verdict: PASS or FAIL";

const REFINE_PROMPT: &str = "\
Rewrite the business plan for {business_name} below, applying every improvement from the review.

Keep the structure and headings, keep figures that the review did not question, and do not \
mention the review itself. Return only the final Markdown document.";

fn content_stage(name: &str, persona: Persona, template: &str, earlier: &[&str]) -> Stage {
    Stage::new(name, persona, template)
        .with_dependencies(earlier.iter().copied())
        .with_provider(ProviderKind::Gemini)
}

/// The content and consolidation stages in registration order.
#[must_use]
pub fn content_stages() -> Vec<Stage> {
    let chapters: [(&str, Persona, &str); 6] = [
        (
            CREATE_BUSINESS_CONCEPT,
            Persona::new(
                "Business Designer",
                "Shape a clear, credible business concept from the founder's answers",
                "You have helped hundreds of founders turn rough ideas into fundable companies.",
            ),
            BUSINESS_CONCEPT_PROMPT,
        ),
        (
            CREATE_PRODUCT_DESIGN,
            Persona::new(
                "Product Designer",
                "Describe the offering so its value to each customer group is obvious",
                "You design products and services around real customer problems.",
            ),
            PRODUCT_DESIGN_PROMPT,
        ),
        (
            CREATE_MARKET_ANALYSIS,
            Persona::new(
                "Market Analyst",
                "Quantify the market and the competitive landscape",
                "You have written market studies for investors and banks.",
            ),
            MARKET_ANALYSIS_PROMPT,
        ),
        (
            CREATE_MARKETING_PLAN,
            Persona::new(
                "Marketing Expert",
                "Plan how the company reaches, wins and keeps customers",
                "You have launched brands in crowded markets on small budgets.",
            ),
            MARKETING_PLAN_PROMPT,
        ),
        (
            CREATE_OPERATING_PLAN,
            Persona::new(
                "Operations Specialist",
                "Lay out how the company runs day to day",
                "You have set up operations, supply chains and teams for young companies.",
            ),
            OPERATING_PLAN_PROMPT,
        ),
        (
            CREATE_FINANCIAL_PLAN,
            Persona::new(
                "Financial Expert",
                "Build a realistic revenue, cost and funding plan",
                "You have prepared financial plans that lenders and investors accepted.",
            ),
            FINANCIAL_PLAN_PROMPT,
        ),
    ];

    let mut stages = Vec::with_capacity(chapters.len() + 1);
    let mut earlier: Vec<&str> = Vec::new();
    for (name, persona, template) in chapters {
        stages.push(content_stage(name, persona, template, &earlier));
        earlier.push(name);
    }

    stages.push(
        content_stage(
            CONSOLIDATE_PLAN,
            Persona::new(
                "Business Plan Consolidator",
                "Merge every chapter into one coherent business plan",
                "You edit business plans into documents that read as if one author wrote them.",
            ),
            CONSOLIDATE_PROMPT,
            &earlier,
        )
        .with_kind(StageKind::Consolidate),
    );

    stages
}

/// The evaluation stage reviewing the consolidated plan.
#[must_use]
pub fn evaluate_stage() -> Stage {
    Stage::new(
        EVALUATE_PLAN,
        Persona::new(
            "Business Plan Evaluator",
            "Judge the plan the way a lender or investor would",
            "You have reviewed thousands of business plans for banks and funds.",
        ),
        EVALUATE_PROMPT,
    )
    .with_dependency(CONSOLIDATE_PLAN)
    .with_kind(StageKind::Evaluate)
    .with_provider(ProviderKind::Groq)
}

/// The refinement stage rewriting the plan from the review.
#[must_use]
pub fn refine_stage() -> Stage {
    Stage::new(
        REFINE_PLAN,
        Persona::new(
            "Business Plan Refiner",
            "Produce the final plan by applying the review",
            "You turn reviewer feedback into precise, well-argued edits.",
        ),
        REFINE_PROMPT,
    )
    .with_dependencies([CONSOLIDATE_PLAN, EVALUATE_PLAN])
    .with_kind(StageKind::Refine)
    .with_provider(ProviderKind::Groq)
}

/// Builds the full catalog: content stages, consolidation and the quality gate.
///
/// # Errors
///
/// Returns an error only if the stage definitions above are inconsistent.
pub fn catalog() -> Result<StageCatalog, CatalogError> {
    let mut catalog = StageCatalog::new();
    for stage in content_stages() {
        catalog.register_stage(stage)?;
    }
    QualityGate::business_plan().attach(&mut catalog)?;
    Ok(catalog)
}
