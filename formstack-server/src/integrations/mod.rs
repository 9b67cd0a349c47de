//! Outbound clients for third-party services (Jira issue reporting and
//! Salesforce contact sync).

pub mod jira;
pub mod salesforce;

pub use jira::JiraClient;
pub use salesforce::SalesforceClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrationError {
    /// Credentials were rejected (HTTP 401/403)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Any other non-success response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// The integration has no configuration section
    #[error("{integration} integration is not configured")]
    NotConfigured { integration: String },
}

impl IntegrationError {
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn api_error<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn not_configured<S: Into<String>>(integration: S) -> Self {
        Self::NotConfigured {
            integration: integration.into(),
        }
    }
}

fn http_client() -> Result<reqwest::Client, IntegrationError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    Ok(client)
}

/// Turns a failed response into an error, keeping the body as the message.
async fn error_from_response(response: reqwest::Response) -> IntegrationError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            IntegrationError::authentication(error_text)
        }
        _ => IntegrationError::api_error(status.as_u16(), error_text),
    }
}
