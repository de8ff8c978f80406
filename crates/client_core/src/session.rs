use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use shared::{
    domain::{ResumeId, ResumeShort, User, VacancyId, VacancyShort},
    protocol::{Page, ResumeList, Tokens, UpdateMe, VacancyList, View},
};
use tracing::info;

use crate::{
    api::ApiClient,
    error::ClientResult,
    validation::{self, LoginForm, RegisterForm},
};

/// Account-level operations: sign-in, profile and liked listings.
pub struct SessionClient {
    api: Arc<ApiClient>,
}

impl SessionClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.api.tokens().access_token().await?.is_some())
    }

    pub async fn login(&self, form: &LoginForm) -> ClientResult<()> {
        let request = form.validate()?;
        let tokens: Tokens = self.api.post_json_anonymous("login", &request).await?;
        self.api.tokens().set_tokens(&tokens).await?;
        info!("signed in");
        Ok(())
    }

    pub async fn register(&self, form: &RegisterForm) -> ClientResult<()> {
        let request = form.validate()?;
        let tokens: Tokens = self.api.post_json_anonymous("register", &request).await?;
        self.api.tokens().set_tokens(&tokens).await?;
        info!("account registered");
        Ok(())
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.api.tokens().clear().await?;
        info!("signed out");
        Ok(())
    }

    pub async fn get_me(&self) -> ClientResult<User> {
        self.api.post_empty("get_me").await
    }

    /// Sends profile changes; an empty change set is not sent.
    pub async fn update_me(&self, changes: &UpdateMe) -> ClientResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let url = self.api.endpoint("update_me")?;
        self.api
            .execute(|http| Ok(http.post(url.clone()).json(changes)))
            .await?;
        Ok(())
    }

    pub async fn update_profile_pic(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> ClientResult<()> {
        validation::validate_profile_pic(mime_type, bytes.len())?;
        let url = self.api.endpoint("update_profile_pic")?;
        self.api
            .execute(|http| {
                let part = Part::bytes(bytes.clone())
                    .file_name(filename.to_string())
                    .mime_str(mime_type)?;
                Ok(http.post(url.clone()).multipart(Form::new().part("file", part)))
            })
            .await?;
        info!(filename, "profile picture updated");
        Ok(())
    }

    pub async fn liked_vacancies(&self, view: View) -> ClientResult<Page<VacancyShort>> {
        let list: VacancyList = self.api.post_json("liked_vacancies", &view).await?;
        Ok(list.into())
    }

    pub async fn liked_resumes(&self, view: View) -> ClientResult<Page<ResumeShort>> {
        let list: ResumeList = self.api.post_json("liked_resumes", &view).await?;
        Ok(list.into())
    }

    pub async fn like_vacancy(&self, id: VacancyId) -> ClientResult<()> {
        self.get_ignoring_body(&format!("like_vacancy/{id}")).await
    }

    pub async fn unlike_vacancy(&self, id: VacancyId) -> ClientResult<()> {
        self.get_ignoring_body(&format!("unlike_vacancy/{id}")).await
    }

    pub async fn like_resume(&self, id: ResumeId) -> ClientResult<()> {
        self.get_ignoring_body(&format!("like_resume/{id}")).await
    }

    pub async fn unlike_resume(&self, id: ResumeId) -> ClientResult<()> {
        self.get_ignoring_body(&format!("unlike_resume/{id}")).await
    }

    async fn get_ignoring_body(&self, path: &str) -> ClientResult<()> {
        let url = self.api.endpoint(path)?;
        self.api.execute(|http| Ok(http.get(url.clone()))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
