//! HTTP access to the backend with bearer auth and one-shot token refresh.

use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::{AccessToken, RefreshTokenRequest};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    error::{ClientError, ClientResult},
    tokens::TokenService,
};

const REFRESH_PATH: &str = "refresh_token";

pub struct ApiClient {
    http: Client,
    /// Used for the refresh exchange and for anonymous calls. Never carries
    /// a bearer token.
    bare_http: Client,
    base_url: Url,
    tokens: TokenService,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings, tokens: TokenService) -> ClientResult<Self> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        let bare_http = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            http,
            bare_http,
            base_url: settings.base_url.clone(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        let response = self.execute(|http| Ok(http.get(url.clone()))).await?;
        decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .execute(|http| Ok(http.post(url.clone()).json(body)))
            .await?;
        decode(response).await
    }

    /// POST without a request body, e.g. `get_me`.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        let response = self.execute(|http| Ok(http.post(url.clone()))).await?;
        decode(response).await
    }

    /// Sends a request that never carries credentials and never triggers the
    /// refresh flow, e.g. login and registration.
    pub async fn post_json_anonymous<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.bare_http.post(url).json(body).send().await?;
        decode(check_status(response).await?).await
    }

    /// Sends an authenticated request built by `build`.
    ///
    /// `build` is invoked once per attempt so the body can be replayed. A 401
    /// triggers at most one refresh of the access token followed by a single
    /// replay; a failed refresh or a second 401 ends the session.
    pub async fn execute<F>(&self, build: F) -> ClientResult<Response>
    where
        F: Fn(&Client) -> ClientResult<RequestBuilder>,
    {
        let access_token = self.tokens.access_token().await?;
        let response = self.send_once(&build, access_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!(url = %response.url(), "access token rejected; refreshing");
        let access_token = match self.refresh_access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!("token refresh failed: {err}");
                self.expire_session().await;
                return Err(ClientError::SessionExpired);
            }
        };

        let retried = self.send_once(&build, Some(&access_token)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %retried.url(), "request rejected after token refresh");
            self.expire_session().await;
            return Err(ClientError::SessionExpired);
        }
        check_status(retried).await
    }

    async fn send_once<F>(&self, build: &F, access_token: Option<&str>) -> ClientResult<Response>
    where
        F: Fn(&Client) -> ClientResult<RequestBuilder>,
    {
        let mut request = build(&self.http)?;
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(request.send().await?)
    }

    async fn refresh_access_token(&self) -> ClientResult<String> {
        let Some(refresh_token) = self.tokens.refresh_token().await? else {
            return Err(ClientError::SessionExpired);
        };

        let response = self
            .bare_http
            .post(self.endpoint(REFRESH_PATH)?)
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await?;
        let body: AccessToken = decode(check_status(response).await?).await?;
        self.tokens.update_access_token(&body.access_token).await?;
        info!("access token refreshed");
        Ok(body.access_token)
    }

    async fn expire_session(&self) {
        if let Err(err) = self.tokens.clear().await {
            warn!("failed to clear tokens after session expiry: {err}");
        }
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
