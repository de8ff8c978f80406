//! Conversion of raw filter-form state into canonical [`FilterCriteria`].
//!
//! Nothing here fails: input that cannot be interpreted is treated as "no
//! constraint".

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::filters::{FilterCriteria, SalaryRange};

/// Placeholder value the region selector submits when nothing is chosen.
const UNSET_REGION: &str = "unset";

/// Region as the form may submit it: nothing, a bare string, or an object
/// carrying the region name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRegion {
    #[default]
    Unset,
    Text(String),
    Structured { region: Option<String> },
}

/// Filter form state exactly as edited by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFilterForm {
    pub title: String,
    pub salary_min: String,
    pub salary_max: String,
    pub experience: Vec<String>,
    pub region: RawRegion,
    pub skills: Vec<String>,
    pub sources: Vec<String>,
}

impl RawFilterForm {
    pub fn normalize(&self) -> FilterCriteria {
        normalize_filters(self)
    }
}

pub fn normalize_filters(form: &RawFilterForm) -> FilterCriteria {
    FilterCriteria {
        title: normalize_text(&form.title),
        salary: SalaryRange {
            min: parse_amount(&form.salary_min),
            max: parse_amount(&form.salary_max),
        },
        experience: normalize_list(&form.experience),
        region: normalize_region(&form.region),
        skills: normalize_list(&form.skills),
        sources: normalize_list(&form.sources),
    }
}

pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses a non-negative amount. Digit-group separators (spaces, including
/// non-breaking ones, and underscores) are accepted.
pub fn parse_amount(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Trims entries, drops blanks and later duplicates. Order is preserved.
pub fn normalize_list(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|entry| normalize_text(entry))
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

pub fn normalize_region(raw: &RawRegion) -> Option<String> {
    let text = match raw {
        RawRegion::Unset => return None,
        RawRegion::Text(text) => text.as_str(),
        RawRegion::Structured { region } => region.as_deref()?,
    };
    normalize_text(text).filter(|region| !region.eq_ignore_ascii_case(UNSET_REGION))
}
