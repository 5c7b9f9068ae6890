//! Categorical relabelling applied while merging.

use super::types::Category;

/// Account names that identify program students.
pub fn category_for_account(account_name: &str) -> Option<Category> {
    match account_name {
        "SFSU Students" => Some(Category::Metro),
        "SFSU Comparison Students" => Some(Category::Comp),
        _ => None,
    }
}

/// Collapses IPEDS race/ethnicity descriptions into short labels.
pub fn race_label(race: Option<&str>) -> String {
    match race {
        Some("Hispanic/Latino (any race)") => "Hispanic/Latino",
        Some("Asian Only (Asian) - Non-Hispanic") => "Asian",
        Some("Black or African American Only (Black) - Non-Hispanic") => "Black",
        Some("White Only (White) - Non-Hispanic") => "White",
        _ => "Other",
    }
    .to_string()
}

/// Household income bracket, 0 (lowest) to 3.
pub fn income_bracket(income: Option<&str>) -> Option<u8> {
    match income? {
        "Less than or equal to $30,000" => Some(0),
        "$30,001 - $50,000" => Some(1),
        "50,001 - $70,000" => Some(2),
        "$70,001 or higher" => Some(3),
        _ => None,
    }
}
