use super::*;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::Gender;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    config::ClientSettings,
    error::ClientError,
    tokens::TokenService,
    validation::{PasswordChangeForm, ProfileForm},
};

#[derive(Clone)]
struct AccountServerState {
    login_bodies: Arc<Mutex<Vec<Value>>>,
    register_bodies: Arc<Mutex<Vec<Value>>>,
    update_bodies: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    liked_views: Arc<Mutex<Vec<Value>>>,
    like_calls: Arc<Mutex<Vec<String>>>,
}

impl AccountServerState {
    fn new() -> Self {
        Self {
            login_bodies: Arc::new(Mutex::new(Vec::new())),
            register_bodies: Arc::new(Mutex::new(Vec::new())),
            update_bodies: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            liked_views: Arc::new(Mutex::new(Vec::new())),
            like_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn is_signed_in(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer a-1")
}

async fn login(
    State(state): State<AccountServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    assert!(!headers.contains_key("authorization"));
    state.login_bodies.lock().await.push(body.clone());
    if body["password"] != "12345678" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "wrong credentials"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": "a-1", "refresh_token": "r-1"})),
    )
}

async fn register(
    State(state): State<AccountServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.register_bodies.lock().await.push(body);
    Json(json!({"access_token": "a-1", "refresh_token": "r-1"}))
}

async fn get_me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !is_signed_in(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "nope"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "first_name": "John",
            "last_name": "Doe",
            "email": "john_doe@example.com",
            "gender": "male",
            "birth_date": "1990-01-31"
        })),
    )
}

async fn update_me(
    State(state): State<AccountServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !is_signed_in(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(Value::Null));
    }
    state.update_bodies.lock().await.push(body);
    (StatusCode::OK, Json(Value::Null))
}

async fn update_profile_pic(
    State(state): State<AccountServerState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> StatusCode {
    if !is_signed_in(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        let filename = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        state.uploads.lock().await.push((filename, mime, size));
    }
    StatusCode::OK
}

async fn liked_vacancies(
    State(state): State<AccountServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.liked_views.lock().await.push(body);
    Json(json!({
        "count": 1,
        "vacancies": [{"id": 3, "title": "Programmer", "salary": {"type": "monthly"}}]
    }))
}

async fn like_vacancy(
    State(state): State<AccountServerState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    state.like_calls.lock().await.push(format!("like:{id}"));
    Json(Value::Null)
}

async fn unlike_resume(
    State(state): State<AccountServerState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    state.like_calls.lock().await.push(format!("unlike_resume:{id}"));
    Json(Value::Null)
}

async fn spawn_account_server() -> (String, AccountServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = AccountServerState::new();
    let app = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/get_me", post(get_me))
        .route("/update_me", post(update_me))
        .route("/update_profile_pic", post(update_profile_pic))
        .route("/liked_vacancies", post(liked_vacancies))
        .route("/like_vacancy/:id", get(like_vacancy))
        .route("/unlike_resume/:id", get(unlike_resume))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn session_for(base: &str) -> SessionClient {
    let settings = ClientSettings::new(base).expect("settings");
    let api = ApiClient::new(&settings, TokenService::in_memory()).expect("client");
    SessionClient::new(Arc::new(api))
}

fn login_form(password: &str) -> LoginForm {
    LoginForm {
        email: "john@gmail.com".into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_stores_tokens_and_unlocks_profile() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);
    assert!(!session.is_authenticated().await.expect("auth"));

    session.login(&login_form("12345678")).await.expect("login");

    assert!(session.is_authenticated().await.expect("auth"));
    assert_eq!(
        state.login_bodies.lock().await[0],
        json!({"email": "john@gmail.com", "password": "12345678"})
    );
    let me = session.get_me().await.expect("me");
    assert_eq!(me.first_name, "John");
    assert_eq!(me.gender, Some(Gender::Male));
}

#[tokio::test]
async fn wrong_credentials_do_not_trigger_refresh_or_store_tokens() {
    let (base, _state) = spawn_account_server().await;
    let session = session_for(&base);

    let err = session
        .login(&login_form("87654321"))
        .await
        .expect_err("rejected");

    assert!(!err.is_session_expired());
    assert_eq!(err.detail().as_deref(), Some("wrong credentials"));
    assert!(!session.is_authenticated().await.expect("auth"));
}

#[tokio::test]
async fn invalid_login_form_never_reaches_server() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);

    let err = session
        .login(&LoginForm {
            email: "john@unknown.example".into(),
            password: "12345678".into(),
        })
        .await
        .expect_err("invalid");

    assert!(matches!(err, ClientError::Validation(_)));
    assert!(state.login_bodies.lock().await.is_empty());
}

#[tokio::test]
async fn register_sends_typed_payload() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);

    session
        .register(&RegisterForm {
            first_name: "Anna".into(),
            last_name: "Petrova".into(),
            email: "anna@example.org".into(),
            password: "secret-pass".into(),
            confirm_password: "secret-pass".into(),
            birth_date: "1995-04-12".into(),
            gender: "female".into(),
        })
        .await
        .expect("register");

    assert!(session.is_authenticated().await.expect("auth"));
    let body = state.register_bodies.lock().await[0].clone();
    assert_eq!(body["birth_date"], "1995-04-12");
    assert_eq!(body["gender"], "female");
    assert!(body.get("confirm_password").is_none());
}

#[tokio::test]
async fn profile_updates_only_send_changed_fields() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);
    session.login(&login_form("12345678")).await.expect("login");

    let changes = ProfileForm {
        first_name: Some("Johnny".into()),
        ..ProfileForm::default()
    }
    .validate()
    .expect("valid");
    session.update_me(&changes).await.expect("update");

    let password = PasswordChangeForm {
        current_password: "12345678".into(),
        password: "N3w!password".into(),
        password_again: "N3w!password".into(),
    }
    .validate()
    .expect("valid");
    session.update_me(&password).await.expect("update password");

    session.update_me(&UpdateMe::default()).await.expect("noop");

    let bodies = state.update_bodies.lock().await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], json!({"first_name": "Johnny"}));
    assert_eq!(
        bodies[1],
        json!({"current_password": "12345678", "new_password": "N3w!password"})
    );
}

#[tokio::test]
async fn profile_picture_is_uploaded_as_multipart() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);
    session.login(&login_form("12345678")).await.expect("login");

    session
        .update_profile_pic(vec![7u8; 2048], "me.png", "image/png")
        .await
        .expect("upload");

    assert_eq!(
        *state.uploads.lock().await,
        vec![("me.png".to_string(), "image/png".to_string(), 2048)]
    );

    let err = session
        .update_profile_pic(vec![1u8; 10], "me.gif", "image/gif")
        .await
        .expect_err("gif rejected");
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn liked_listings_round_trip() {
    let (base, state) = spawn_account_server().await;
    let session = session_for(&base);
    session.login(&login_form("12345678")).await.expect("login");

    let page = session
        .liked_vacancies(View {
            offset: 0,
            count: 10,
        })
        .await
        .expect("liked");
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].id, VacancyId(3));

    session.like_vacancy(VacancyId(3)).await.expect("like");
    session.unlike_resume(ResumeId(9)).await.expect("unlike");

    assert_eq!(state.liked_views.lock().await[0], json!({"offset": 0, "count": 10}));
    assert_eq!(
        *state.like_calls.lock().await,
        vec!["like:3".to_string(), "unlike_resume:9".to_string()]
    );
}

#[tokio::test]
async fn logout_clears_tokens() {
    let (base, _state) = spawn_account_server().await;
    let session = session_for(&base);
    session.login(&login_form("12345678")).await.expect("login");

    session.logout().await.expect("logout");

    assert!(!session.is_authenticated().await.expect("auth"));
    let err = session.get_me().await.expect_err("signed out");
    assert!(err.is_session_expired());
}
