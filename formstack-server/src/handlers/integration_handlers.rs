use super::main_handlers::AppState;
use super::template_handlers::visible_template;
use crate::database::Viewer;
use crate::error::AppError;
use crate::integrations::jira::IssueRequest;
use crate::integrations::salesforce::ContactRequest;
use crate::integrations::IntegrationError;
use crate::middleware::current_user;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::Utc;
use formstack_models::{
    ContactResponse, CreateContactRequest, CreateTicketRequest, JiraTicket, JiraTicketListResponse,
    JiraTicketResponse,
};

/// Files a Jira issue for the caller and records it locally.
pub async fn create_jira_ticket(
    data: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let client = data
        .jira
        .clone()
        .ok_or_else(|| IntegrationError::not_configured("Jira"))?;

    let ticket_req = request.into_inner();
    let summary = ticket_req.summary.trim().to_string();
    if summary.is_empty() {
        return Err(AppError::InvalidRequest(
            "Ticket summary cannot be empty".to_string(),
        ));
    }

    let template_title = match ticket_req.template_id {
        Some(id) => {
            let template = visible_template(&data, id, &Viewer::from_user(Some(&user)))?;
            Some(template.summary.title)
        }
        None => None,
    };

    let issue = client
        .create_issue(&IssueRequest {
            summary: summary.clone(),
            priority: ticket_req.priority,
            reporter_id: user.id,
            reporter_email: user.email.clone(),
            link: ticket_req.link,
            template_title,
        })
        .await?;

    let mut ticket = JiraTicket {
        id: 0,
        user_id: user.id,
        issue_key: issue.key,
        url: issue.url,
        summary,
        priority: ticket_req.priority,
        template_id: ticket_req.template_id,
        created_at: Utc::now().timestamp(),
    };
    ticket.id = data.database.create_jira_ticket(&ticket)?;

    Ok(HttpResponse::Created().json(JiraTicketResponse { ticket }))
}

pub async fn list_jira_tickets(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let tickets = data.database.list_jira_tickets(user.id)?;

    Ok(HttpResponse::Ok().json(JiraTicketListResponse { tickets }))
}

/// Pushes the caller to Salesforce as a Contact under a new Account.
pub async fn create_salesforce_contact(
    data: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let client = data
        .salesforce
        .clone()
        .ok_or_else(|| IntegrationError::not_configured("Salesforce"))?;

    let contact_req = request.into_inner();
    if contact_req.last_name.trim().is_empty() || contact_req.company.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Last name and company are required".to_string(),
        ));
    }

    let created = client
        .create_contact(&ContactRequest {
            first_name: contact_req.first_name.trim().to_string(),
            last_name: contact_req.last_name.trim().to_string(),
            email: user.email,
            company: contact_req.company.trim().to_string(),
            phone: contact_req.phone.filter(|p| !p.trim().is_empty()),
        })
        .await?;

    Ok(HttpResponse::Created().json(ContactResponse {
        account_id: created.account_id,
        contact_id: created.contact_id,
    }))
}
