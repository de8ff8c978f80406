use std::{fmt, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Resume, ResumeId, ResumeShort, Vacancy, VacancyId, VacancyShort},
    filters::FilterCriteria,
    protocol::{Page, ResumeList, SearchRequest, VacancyList, View},
};

use crate::{api::ApiClient, error::ClientResult};

/// A remote, filterable collection of listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;
    type Id: Copy + Send + fmt::Display + 'static;
    type Detail: Send + 'static;

    async fn search(&self, filters: &FilterCriteria, view: View) -> ClientResult<Page<Self::Item>>;

    /// Full record for one listing, fetched on demand.
    async fn detail(&self, id: Self::Id) -> ClientResult<Self::Detail>;
}

pub struct VacancySource {
    api: Arc<ApiClient>,
}

impl VacancySource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListingSource for VacancySource {
    type Item = VacancyShort;
    type Id = VacancyId;
    type Detail = Vacancy;

    async fn search(&self, filters: &FilterCriteria, view: View) -> ClientResult<Page<VacancyShort>> {
        let list: VacancyList = self
            .api
            .post_json(
                "vacancies",
                &SearchRequest {
                    filter: filters,
                    view,
                },
            )
            .await?;
        Ok(list.into())
    }

    async fn detail(&self, id: VacancyId) -> ClientResult<Vacancy> {
        self.api.get_json(&format!("vacancy/{id}")).await
    }
}

pub struct ResumeSource {
    api: Arc<ApiClient>,
}

impl ResumeSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListingSource for ResumeSource {
    type Item = ResumeShort;
    type Id = ResumeId;
    type Detail = Resume;

    async fn search(&self, filters: &FilterCriteria, view: View) -> ClientResult<Page<ResumeShort>> {
        let list: ResumeList = self
            .api
            .post_json(
                "resumes",
                &SearchRequest {
                    filter: filters,
                    view,
                },
            )
            .await?;
        Ok(list.into())
    }

    async fn detail(&self, id: ResumeId) -> ClientResult<Resume> {
        self.api.get_json(&format!("resume/{id}")).await
    }
}
