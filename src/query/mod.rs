//! Deterministic query construction
//!
//! Renders a customer profile into the natural-language description used as
//! the retrieval query. The template is fixed: equal profiles must produce
//! byte-identical output, since the rendered text drives both retrieval and
//! the generation prompt.

use crate::profile::CustomerProfile;

/// Render a profile into the retrieval query text
///
/// Income is formatted as a whole currency amount and the debt-to-income
/// ratio to two decimal places.
pub fn render_profile(profile: &CustomerProfile) -> String {
    format!(
        "Customer profile: \
         Age {}. \
         Income of ${:.0}. \
         Credit score is {}. \
         Debt-to-income ratio is {:.2}. \
         Holds {} products, including: {}. \
         Digital engagement score is {}. \
         Employment status: {}.",
        profile.age,
        profile.income,
        profile.credit_score,
        profile.debt_to_income_ratio,
        profile.product_count,
        profile.existing_products,
        profile.engagement_score,
        profile.employment_status,
    )
}
