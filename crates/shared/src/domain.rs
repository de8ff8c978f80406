use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(VacancyId);
id_newtype!(ResumeId);

/// Salary as reported by the backend.
///
/// `value` is a fixed point number with two decimal places: `1` means `0.01`,
/// `15000000` means `150000.00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
}

impl Salary {
    pub fn amount(&self) -> Option<f64> {
        self.value.map(|v| v as f64 / 100.0)
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = self.value else {
            return write!(f, "not specified ({})", self.kind);
        };
        let sign = if value < 0 { "-" } else { "" };
        let magnitude = value.unsigned_abs();
        let cents = magnitude % 100;
        write!(f, "{sign}{}", group_thousands(magnitude / 100))?;
        if cents != 0 {
            write!(f, ".{cents:02}")?;
        }
        if let Some(currency) = &self.currency {
            write!(f, " {currency}")?;
        }
        write!(f, " ({})", self.kind)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub specialization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStamp {
    pub time_stamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyShort {
    pub id: VacancyId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub salary: Salary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeShort {
    pub id: ResumeId,
    pub title: String,
    pub salary: Salary,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
}

impl ResumeShort {
    pub fn full_name(&self) -> Option<String> {
        join_name(&[&self.last_name, &self.first_name, &self.middle_name])
    }
}

/// Complete vacancy record, fetched on demand by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub external_id: String,
    #[serde(default)]
    pub source: Option<Source>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<Company>,
    pub salary: Salary,
    #[serde(default)]
    pub experience_category: Option<ExperienceCategory>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub specialization: Option<Specialization>,
    #[serde(default)]
    pub employment_types: Vec<EmploymentType>,
    #[serde(default)]
    pub published_at: Option<TimeStamp>,
    #[serde(default)]
    pub contacts: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Complete résumé record, fetched on demand by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub external_id: String,
    #[serde(default)]
    pub source: Option<Source>,
    pub title: String,
    pub salary: Salary,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub experience_category: Option<ExperienceCategory>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub specialization: Option<Specialization>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub published_at: Option<TimeStamp>,
}

impl Resume {
    pub fn full_name(&self) -> Option<String> {
        join_name(&[&self.last_name, &self.first_name, &self.middle_name])
    }
}

fn join_name(parts: &[&Option<String>]) -> Option<String> {
    let joined = parts
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}
