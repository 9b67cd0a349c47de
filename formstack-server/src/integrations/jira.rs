use super::{error_from_response, http_client, IntegrationError};
use crate::config::JiraConfig;
use formstack_models::TicketPriority;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A ticket to file on behalf of a user.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub summary: String,
    pub priority: TicketPriority,
    pub reporter_id: i64,
    pub reporter_email: String,
    pub link: String,
    pub template_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    /// Browser URL of the issue
    #[serde(default)]
    pub url: String,
}

/// Jira Cloud REST v2 client
pub struct JiraClient {
    base_url: String,
    email: String,
    api_token: String,
    project_key: String,
    http_client: reqwest::Client,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, IntegrationError> {
        if config.api_token.is_empty() {
            return Err(IntegrationError::authentication("Jira API token cannot be empty"));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            project_key: config.project_key.clone(),
            http_client: http_client()?,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Files a task in the configured project and returns its key and URL.
    pub async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedIssue, IntegrationError> {
        let url = format!("{}/rest/api/2/issue", self.base_url);

        let mut description = format!(
            "Reported by {} from {}",
            request.reporter_email, request.link
        );
        if let Some(title) = &request.template_title {
            description.push_str(&format!("\nTemplate: {title}"));
        }

        let body = json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": request.summary,
                "description": description,
                "issuetype": { "name": "Task" },
                "priority": { "name": request.priority.as_str() },
                "labels": [format!("formstack-user-{}", request.reporter_id)],
            }
        });

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await?;
        let mut issue: CreatedIssue = serde_json::from_str(&text)?;
        issue.url = format!("{}/browse/{}", self.base_url, issue.key);

        tracing::info!("Created Jira issue {}", issue.key);
        Ok(issue)
    }
}
