use crate::config::AppConfig;
use crate::database::Database;
use crate::error::AppError;
use crate::integrations::{JiraClient, SalesforceClient};
use actix_web::{web, HttpResponse, Result};
use formstack_models::{PageQuery, ServerStatus};
use std::sync::Arc;
use std::time::SystemTime;

pub struct AppState {
    pub database: Arc<Database>,
    pub config: Arc<AppConfig>,
    pub start_time: SystemTime,
    pub jira: Option<Arc<JiraClient>>,
    pub salesforce: Option<Arc<SalesforceClient>>,
}

impl AppState {
    /// Builds the state, constructing a client for each configured integration.
    pub fn new(database: Arc<Database>, config: Arc<AppConfig>) -> Result<Self, AppError> {
        let jira = config
            .jira
            .as_ref()
            .map(JiraClient::new)
            .transpose()?
            .map(Arc::new);
        let salesforce = config
            .salesforce
            .as_ref()
            .map(SalesforceClient::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            database,
            config,
            start_time: SystemTime::now(),
            jira,
            salesforce,
        })
    }
}

pub async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let uptime = data
        .start_time
        .elapsed()
        .map_err(|e| AppError::Internal(format!("Failed to calculate uptime: {e}")))?
        .as_secs();

    let status = ServerStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
    };

    Ok(HttpResponse::Ok().json(status))
}

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 20;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

/// Clamped `(limit, offset)` from an optional page query.
pub(crate) fn page_bounds(query: &PageQuery) -> (i64, i64) {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}
