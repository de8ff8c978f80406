use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Gender, ResumeShort, VacancyShort},
    filters::FilterCriteria,
};

/// Window into a result set: `offset` records skipped, at most `count` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub offset: u64,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub filter: &'a FilterCriteria,
    pub view: View,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyList {
    /// Total number of matches, not the length of `vacancies`.
    pub count: u64,
    #[serde(default)]
    pub vacancies: Vec<VacancyShort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeList {
    /// Total number of matches, not the length of `resumes`.
    pub count: u64,
    #[serde(default)]
    pub resumes: Vec<ResumeShort>,
}

/// One page of listings together with the size of the whole result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

impl From<VacancyList> for Page<VacancyShort> {
    fn from(value: VacancyList) -> Self {
        Self {
            items: value.vacancies,
            total_count: value.count,
        }
    }
}

impl From<ResumeList> for Page<ResumeShort> {
    fn from(value: ResumeList) -> Self {
        Self {
            items: value.resumes,
            total_count: value.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

/// Profile changes. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

impl UpdateMe {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
