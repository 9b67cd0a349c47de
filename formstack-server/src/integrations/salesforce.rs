use super::{error_from_response, http_client, IntegrationError};
use crate::config::SalesforceConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedContact {
    pub account_id: String,
    pub contact_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    id: String,
}

/// Salesforce REST client using the OAuth2 username-password flow
pub struct SalesforceClient {
    config: SalesforceConfig,
    http_client: reqwest::Client,
}

impl SalesforceClient {
    pub fn new(config: &SalesforceConfig) -> Result<Self, IntegrationError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(IntegrationError::authentication(
                "Salesforce client credentials cannot be empty",
            ));
        }

        Ok(Self {
            config: config.clone(),
            http_client: http_client()?,
        })
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.config.login_url = url.into();
        self
    }

    async fn authenticate(&self) -> Result<TokenResponse, IntegrationError> {
        let url = format!(
            "{}/services/oauth2/token",
            self.config.login_url.trim_end_matches('/')
        );

        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            // The token endpoint answers bad credentials with 400
            let error = error_from_response(response).await;
            return Err(match error {
                IntegrationError::Api { status: 400, message } => {
                    IntegrationError::authentication(message)
                }
                other => other,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_record(
        &self,
        token: &TokenResponse,
        object: &str,
        body: serde_json::Value,
    ) -> Result<String, IntegrationError> {
        let url = format!(
            "{}/services/data/v{}/sobjects/{object}",
            token.instance_url.trim_end_matches('/'),
            self.config.api_version
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await?;
        let created: CreateRecordResponse = serde_json::from_str(&text)?;
        Ok(created.id)
    }

    /// Creates an Account for the company, then a Contact linked to it.
    pub async fn create_contact(
        &self,
        request: &ContactRequest,
    ) -> Result<CreatedContact, IntegrationError> {
        let token = self.authenticate().await?;

        let account_id = self
            .create_record(&token, "Account", json!({ "Name": request.company }))
            .await?;

        let contact_id = self
            .create_record(
                &token,
                "Contact",
                json!({
                    "FirstName": request.first_name,
                    "LastName": request.last_name,
                    "Email": request.email,
                    "Phone": request.phone,
                    "AccountId": account_id,
                }),
            )
            .await?;

        tracing::info!(
            "Created Salesforce contact {} under account {}",
            contact_id,
            account_id
        );
        Ok(CreatedContact {
            account_id,
            contact_id,
        })
    }
}
