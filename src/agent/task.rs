use serde::{Deserialize, Serialize};
use std::fmt;

/// Search criteria the agent is asked to satisfy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTask {
    /// City or area to search in
    pub location: String,
    /// Number of listings to find
    pub count: u32,
    /// Maximum price, in `currency`
    pub max_price: Option<u64>,
    pub currency: Currency,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<u32>,
    /// Exact number of bedrooms
    pub bedrooms: Option<u32>,
    /// Exact number of bathrooms
    pub bathrooms: Option<u32>,
    /// Minimum size in square meters
    pub min_area_sqm: Option<u32>,
    /// Only listings posted within this many months
    pub posted_within_months: Option<u32>,
    /// Details to report per listing; when set, results are requested as JSON
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Egp,
}

impl Default for SearchTask {
    fn default() -> Self {
        Self::new_york()
    }
}

impl SearchTask {
    /// Three affordable, roomy apartments in New York City
    pub fn new_york() -> Self {
        Self {
            location: "New York City".to_string(),
            count: 3,
            max_price: Some(300_000),
            currency: Currency::Usd,
            min_bedrooms: Some(2),
            bedrooms: None,
            bathrooms: None,
            min_area_sqm: Some(120),
            posted_within_months: None,
            details: vec![
                "Price".to_string(),
                "Location".to_string(),
                "Number of bedrooms".to_string(),
                "Total area".to_string(),
                "Any additional relevant features".to_string(),
            ],
        }
    }

    /// Five recent 3-bedroom listings in New Cairo
    pub fn new_cairo() -> Self {
        Self {
            location: "New Cairo".to_string(),
            count: 5,
            max_price: Some(3_000_000),
            currency: Currency::Egp,
            min_bedrooms: None,
            bedrooms: Some(3),
            bathrooms: Some(2),
            min_area_sqm: None,
            posted_within_months: Some(3),
            details: Vec::new(),
        }
    }

    /// Render as the natural-language instruction handed to the agent
    pub fn describe(&self) -> String {
        let mut text = format!("Find {} apartments in {}", self.count, self.location);

        let mut criteria = Vec::new();
        if let Some(bedrooms) = self.bedrooms {
            criteria.push(format!("exactly {} bedrooms", bedrooms));
        }
        if let Some(min) = self.min_bedrooms {
            criteria.push(format!("at least {} bedrooms", min));
        }
        if let Some(bathrooms) = self.bathrooms {
            criteria.push(format!("{} bathrooms", bathrooms));
        }
        if let Some(min) = self.min_area_sqm {
            criteria.push(format!("a total area of at least {} square meters", min));
        }
        if let Some(max) = self.max_price {
            criteria.push(format!("priced under {}", self.currency.format(max)));
        }
        if let Some(months) = self.posted_within_months {
            criteria.push(format!("posted in the last {} months", months));
        }

        if !criteria.is_empty() {
            text.push_str(" with ");
            text.push_str(&join_criteria(&criteria));
        }
        text.push('.');

        if !self.details.is_empty() {
            text.push_str(
                "\nReturn the results in a structured JSON format, including the following details for each apartment:",
            );
            for detail in &self.details {
                text.push_str("\n- ");
                text.push_str(detail);
            }
        }

        text
    }
}

impl fmt::Display for SearchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Currency {
    fn format(self, amount: u64) -> String {
        let grouped = group_thousands(amount);
        match self {
            Currency::Usd => format!("${}", grouped),
            Currency::Egp => format!("{} EGP", grouped),
        }
    }
}

fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn join_criteria(criteria: &[String]) -> String {
    match criteria {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_york_preset_lists_criteria_and_details() {
        let text = SearchTask::new_york().describe();

        assert!(text.starts_with("Find 3 apartments in New York City with "));
        assert!(text.contains("at least 2 bedrooms"));
        assert!(text.contains("at least 120 square meters"));
        assert!(text.contains("priced under $300,000"));
        assert!(text.contains("structured JSON format"));
        assert!(text.ends_with("- Any additional relevant features"));
    }

    #[test]
    fn new_cairo_preset_has_no_detail_list() {
        let text = SearchTask::new_cairo().describe();

        assert_eq!(
            text,
            "Find 5 apartments in New Cairo with exactly 3 bedrooms, 2 bathrooms, \
             priced under 3,000,000 EGP and posted in the last 3 months."
        );
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }
}
