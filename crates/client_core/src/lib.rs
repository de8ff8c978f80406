use std::sync::Arc;

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod listings;
pub mod normalize;
pub mod pagination;
pub mod session;
pub mod tokens;
pub mod validation;

pub use api::ApiClient;
pub use config::{load_settings, ClientSettings};
pub use controller::{FetchOutcome, ListingController, ListingSnapshot};
pub use error::{ClientError, ClientResult};
pub use listings::{ListingSource, ResumeSource, VacancySource};
pub use normalize::{RawFilterForm, RawRegion};
pub use session::SessionClient;
pub use tokens::{FileTokenStorage, MemoryTokenStorage, TokenService, TokenStorage};

/// Everything a front end needs, wired to one backend and one token store.
pub struct JobBoardClient {
    pub api: Arc<ApiClient>,
    pub session: SessionClient,
    pub vacancies: ListingController<VacancySource>,
    pub resumes: ListingController<ResumeSource>,
}

impl JobBoardClient {
    pub fn new(settings: &ClientSettings) -> ClientResult<Self> {
        let tokens = match &settings.token_store_path {
            Some(path) => TokenService::new(Arc::new(FileTokenStorage::new(path))),
            None => TokenService::in_memory(),
        };
        Self::with_tokens(settings, tokens)
    }

    pub fn with_tokens(settings: &ClientSettings, tokens: TokenService) -> ClientResult<Self> {
        let api = Arc::new(ApiClient::new(settings, tokens)?);
        Ok(Self {
            session: SessionClient::new(Arc::clone(&api)),
            vacancies: ListingController::new(
                Arc::new(VacancySource::new(Arc::clone(&api))),
                settings.page_size,
            ),
            resumes: ListingController::new(
                Arc::new(ResumeSource::new(Arc::clone(&api))),
                settings.page_size,
            ),
            api,
        })
    }
}
