use std::sync::Arc;

use super::*;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode as HttpStatus},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::protocol::{Tokens, VacancyList};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct AuthServerState {
    protected_calls: Arc<Mutex<u32>>,
    refresh_calls: Arc<Mutex<u32>>,
    seen_authorization: Arc<Mutex<Vec<Option<String>>>>,
    seen_bodies: Arc<Mutex<Vec<Value>>>,
    refresh_saw_bearer: Arc<Mutex<bool>>,
    fail_refresh: Arc<Mutex<bool>>,
    reject_everything: Arc<Mutex<bool>>,
}

impl AuthServerState {
    fn new() -> Self {
        Self {
            protected_calls: Arc::new(Mutex::new(0)),
            refresh_calls: Arc::new(Mutex::new(0)),
            seen_authorization: Arc::new(Mutex::new(Vec::new())),
            seen_bodies: Arc::new(Mutex::new(Vec::new())),
            refresh_saw_bearer: Arc::new(Mutex::new(false)),
            fail_refresh: Arc::new(Mutex::new(false)),
            reject_everything: Arc::new(Mutex::new(false)),
        }
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn protected_vacancies(
    State(state): State<AuthServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (HttpStatus, Json<Value>) {
    *state.protected_calls.lock().await += 1;
    state.seen_bodies.lock().await.push(body);
    let auth = authorization(&headers);
    state.seen_authorization.lock().await.push(auth.clone());

    if *state.reject_everything.lock().await || auth.as_deref() != Some("Bearer fresh") {
        return (
            HttpStatus::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        );
    }
    (
        HttpStatus::OK,
        Json(json!({
            "count": 41,
            "vacancies": [{"id": 7, "title": "Rust developer", "salary": {"type": "monthly"}}]
        })),
    )
}

async fn refresh_token(
    State(state): State<AuthServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (HttpStatus, Json<Value>) {
    *state.refresh_calls.lock().await += 1;
    if headers.contains_key("authorization") {
        *state.refresh_saw_bearer.lock().await = true;
    }
    if *state.fail_refresh.lock().await || body["refresh_token"] != "r-1" {
        return (
            HttpStatus::UNAUTHORIZED,
            Json(json!({"detail": "invalid refresh token"})),
        );
    }
    (HttpStatus::OK, Json(json!({"access_token": "fresh"})))
}

async fn missing_vacancy() -> (HttpStatus, Json<Value>) {
    (
        HttpStatus::NOT_FOUND,
        Json(json!({"detail": "vacancy not found"})),
    )
}

async fn spawn_auth_server(state: AuthServerState) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/v1/vacancies", post(protected_vacancies))
        .route("/api/v1/refresh_token", post(refresh_token))
        .route("/api/v1/vacancy/404", get(missing_vacancy))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/api/v1")
}

async fn client_with_tokens(base: &str, access: Option<&str>, refresh: Option<&str>) -> ApiClient {
    let settings = ClientSettings::new(base).expect("settings");
    let tokens = TokenService::in_memory();
    match (access, refresh) {
        (Some(access), Some(refresh)) => tokens
            .set_tokens(&Tokens {
                access_token: access.into(),
                refresh_token: refresh.into(),
            })
            .await
            .expect("set tokens"),
        (Some(access), None) => tokens.update_access_token(access).await.expect("set access"),
        _ => {}
    }
    ApiClient::new(&settings, tokens).expect("client")
}

fn search_body() -> Value {
    json!({"filter": {"title": "rust"}, "view": {"offset": 0, "count": 20}})
}

#[tokio::test]
async fn valid_token_is_attached_and_no_refresh_happens() {
    let state = AuthServerState::new();
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("fresh"), Some("r-1")).await;

    let list: VacancyList = client
        .post_json("vacancies", &search_body())
        .await
        .expect("search");

    assert_eq!(list.count, 41);
    assert_eq!(list.vacancies.len(), 1);
    assert_eq!(*state.protected_calls.lock().await, 1);
    assert_eq!(*state.refresh_calls.lock().await, 0);
}

#[tokio::test]
async fn single_401_refreshes_once_and_replays_request() {
    let state = AuthServerState::new();
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("stale"), Some("r-1")).await;

    let list: VacancyList = client
        .post_json("vacancies", &search_body())
        .await
        .expect("search after refresh");

    assert_eq!(list.count, 41);
    assert_eq!(*state.protected_calls.lock().await, 2);
    assert_eq!(*state.refresh_calls.lock().await, 1);
    assert!(!*state.refresh_saw_bearer.lock().await);
    assert_eq!(
        *state.seen_authorization.lock().await,
        vec![
            Some("Bearer stale".to_string()),
            Some("Bearer fresh".to_string())
        ]
    );
    let bodies = state.seen_bodies.lock().await;
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(
        client.tokens().access_token().await.expect("token").as_deref(),
        Some("fresh")
    );
    assert_eq!(
        client.tokens().refresh_token().await.expect("token").as_deref(),
        Some("r-1")
    );
}

#[tokio::test]
async fn second_401_expires_session_and_clears_tokens() {
    let state = AuthServerState::new();
    *state.reject_everything.lock().await = true;
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("stale"), Some("r-1")).await;

    let err = client
        .post_json::<_, VacancyList>("vacancies", &search_body())
        .await
        .expect_err("must expire");

    assert!(err.is_session_expired());
    assert_eq!(*state.protected_calls.lock().await, 2);
    assert_eq!(*state.refresh_calls.lock().await, 1);
    assert_eq!(client.tokens().access_token().await.expect("token"), None);
    assert_eq!(client.tokens().refresh_token().await.expect("token"), None);
}

#[tokio::test]
async fn missing_refresh_token_fails_without_calling_refresh() {
    let state = AuthServerState::new();
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("stale"), None).await;

    let err = client
        .post_json::<_, VacancyList>("vacancies", &search_body())
        .await
        .expect_err("must expire");

    assert!(err.is_session_expired());
    assert_eq!(*state.protected_calls.lock().await, 1);
    assert_eq!(*state.refresh_calls.lock().await, 0);
    assert_eq!(client.tokens().access_token().await.expect("token"), None);
}

#[tokio::test]
async fn rejected_refresh_expires_session() {
    let state = AuthServerState::new();
    *state.fail_refresh.lock().await = true;
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("stale"), Some("r-1")).await;

    let err = client
        .post_json::<_, VacancyList>("vacancies", &search_body())
        .await
        .expect_err("must expire");

    assert!(err.is_session_expired());
    assert_eq!(*state.protected_calls.lock().await, 1);
    assert_eq!(*state.refresh_calls.lock().await, 1);
    assert_eq!(client.tokens().refresh_token().await.expect("token"), None);
}

#[tokio::test]
async fn anonymous_request_omits_authorization_header() {
    let state = AuthServerState::new();
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, None, None).await;

    let err = client
        .post_json::<_, VacancyList>("vacancies", &search_body())
        .await
        .expect_err("unauthorized");

    assert!(err.is_session_expired());
    assert_eq!(*state.seen_authorization.lock().await, vec![None]);
    assert_eq!(*state.refresh_calls.lock().await, 0);
}

#[tokio::test]
async fn other_error_statuses_propagate_unchanged() {
    let state = AuthServerState::new();
    let base = spawn_auth_server(state.clone()).await;
    let client = client_with_tokens(&base, Some("fresh"), Some("r-1")).await;

    let err = client
        .get_json::<Value>("vacancy/404")
        .await
        .expect_err("not found");

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.detail().as_deref(), Some("vacancy not found"));
    assert!(!err.is_session_expired());
    assert_eq!(*state.refresh_calls.lock().await, 0);
    assert_eq!(
        client.tokens().access_token().await.expect("token").as_deref(),
        Some("fresh")
    );
}

#[tokio::test]
async fn endpoints_resolve_below_base_path() {
    let client = client_with_tokens("http://localhost:8000/api/v1", None, None).await;
    assert_eq!(
        client.endpoint("/vacancy/3").expect("url").as_str(),
        "http://localhost:8000/api/v1/vacancy/3"
    );
    assert_eq!(
        client.endpoint("get_me").expect("url").as_str(),
        "http://localhost:8000/api/v1/get_me"
    );
}
