//! Shared test infrastructure: an isolated application per test plus
//! request helpers.

#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, App, ResponseError};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use formstack_server::config::AppConfig;
use formstack_server::database::Database;
use formstack_server::handlers::AppState;
use formstack_server::routes::configure_routes;

pub const PASSWORD: &str = "correct horse battery";

/// TestApp provides a fully configured application backed by its own
/// SQLite file in a temporary directory.
pub struct TestApp {
    pub app_state: web::Data<AppState>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create an application after adjusting the default test configuration
    pub fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.database.path = dir.path().join("formstack.db");
        config.auth.jwt_secret = "test_jwt_secret_key_for_api_tests".to_string();
        customize(&mut config);

        let database = Arc::new(Database::new(&config.database.path).unwrap());
        let app_state = web::Data::new(AppState::new(database, Arc::new(config)).unwrap());

        Self {
            app_state,
            _dir: dir,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.app_state.database
    }

    /// Build the service with the production route table
    pub async fn service(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
    {
        test::init_service(
            App::new()
                .app_data(self.app_state.clone())
                .configure(configure_routes),
        )
        .await
    }
}

/// A signed-in user
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request {
    let mut req = test::TestRequest::default().method(method).uri(uri);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    req.to_request()
}

/// Send a request and return its status and JSON body (`Null` when empty).
/// Errors raised by middleware are rendered the same way the server would.
pub async fn send<S, B>(service: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(service, req).await {
        Ok(response) => {
            let status = response.status();
            let bytes = test::read_body(response).await;
            (status, parse_body(&bytes))
        }
        Err(err) => {
            let response = err.as_response_error().error_response();
            let status = response.status();
            let bytes = actix_web::body::to_bytes(response.into_body())
                .await
                .unwrap_or_default();
            (status, parse_body(&bytes))
        }
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

pub async fn get<S, B>(service: &S, uri: &str, token: Option<&str>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(service, request(Method::GET, uri, token, None)).await
}

pub async fn post<S, B>(service: &S, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(service, request(Method::POST, uri, token, Some(body))).await
}

pub async fn put<S, B>(service: &S, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(service, request(Method::PUT, uri, token, Some(body))).await
}

pub async fn patch<S, B>(service: &S, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(service, request(Method::PATCH, uri, token, Some(body))).await
}

pub async fn delete<S, B>(service: &S, uri: &str, token: Option<&str>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(service, request(Method::DELETE, uri, token, None)).await
}

/// Register `username` (email `<username>@example.com`) and return its session.
pub async fn register<S, B>(service: &S, username: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post(
        service,
        "/api/auth/register",
        None,
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    Session {
        id: body["user"]["id"].as_i64().unwrap(),
        username: username.to_string(),
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Create a public template with the given questions and return its id.
pub async fn create_template<S, B>(
    service: &S,
    session: &Session,
    title: &str,
    questions: Value,
) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post(
        service,
        "/api/templates",
        Some(&session.access_token),
        json!({
            "title": title,
            "description": format!("{title} description"),
            "topic": "Other",
            "tags": ["test"],
            "questions": questions,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create template failed: {body}");

    body["template"]["id"].as_i64().unwrap()
}
