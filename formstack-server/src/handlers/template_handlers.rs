use super::main_handlers::{page_bounds, AppState, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::database::{StoredTemplate, TemplateDraft, Viewer};
use crate::error::AppError;
use crate::middleware::{current_user, optional_user};
use crate::search::{build_search_query, SearchDialect};
use crate::slots::{encode_question_row, overflowing_tags};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use formstack_models::{
    PageQuery, SearchQuery, TagListResponse, TemplateListResponse, TemplateRequest,
    TemplateResponse, UserInfo, SLOTS_PER_TYPE,
};

const POPULAR_LIMIT: i64 = 5;

fn draft_from_request(request: TemplateRequest) -> Result<TemplateDraft, AppError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::InvalidRequest(
            "Template title cannot be empty".to_string(),
        ));
    }

    let mut tags: Vec<String> = Vec::new();
    for tag in request.tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    // Questions beyond the slot capacity are dropped by the encoder
    for tag in overflowing_tags(request.questions.iter().map(|q| &q.kind)) {
        tracing::warn!(
            "Template '{}' has more than {} {} questions; the extra ones are not stored",
            title,
            SLOTS_PER_TYPE,
            tag.as_str()
        );
    }

    Ok(TemplateDraft {
        title,
        description: request.description,
        topic: request.topic,
        tags,
        mode: request.mode,
        slots: encode_question_row(&request.questions),
    })
}

/// Loads a template the caller may see; invisible templates read as missing.
pub(crate) fn visible_template(
    data: &AppState,
    id: i64,
    viewer: &Viewer,
) -> Result<StoredTemplate, AppError> {
    let template = data.database.get_template(id)?;
    if !template.is_visible_to(viewer) {
        return Err(AppError::NotFound(format!("Template not found: {id}")));
    }
    Ok(template)
}

/// Loads a template the caller may edit (its author or an admin).
pub(crate) fn managed_template(
    data: &AppState,
    id: i64,
    user: &UserInfo,
) -> Result<StoredTemplate, AppError> {
    let template = visible_template(data, id, &Viewer::from_user(Some(user)))?;
    if template.summary.author_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the author can manage this template".to_string(),
        ));
    }
    Ok(template)
}

pub async fn list_templates(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let viewer = Viewer::from_user(optional_user(&req).as_ref());
    let (limit, offset) = page_bounds(&query);

    let templates = data.database.list_templates(&viewer, limit, offset)?;
    Ok(HttpResponse::Ok().json(TemplateListResponse { templates }))
}

pub async fn latest_templates(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let viewer = Viewer::from_user(optional_user(&req).as_ref());
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let templates = data.database.list_templates(&viewer, limit, 0)?;
    Ok(HttpResponse::Ok().json(TemplateListResponse { templates }))
}

pub async fn popular_templates(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let templates = data.database.popular_templates(POPULAR_LIMIT)?;
    Ok(HttpResponse::Ok().json(TemplateListResponse { templates }))
}

pub async fn search_templates(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let expression = build_search_query(&query.q, SearchDialect::Sqlite);
    if expression.is_empty() {
        return Ok(HttpResponse::Ok().json(TemplateListResponse { templates: vec![] }));
    }

    let viewer = Viewer::from_user(optional_user(&req).as_ref());
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let templates = data.database.search_templates(&expression, &viewer, limit)?;
    Ok(HttpResponse::Ok().json(TemplateListResponse { templates }))
}

pub async fn get_template(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let viewer = Viewer::from_user(optional_user(&req).as_ref());
    let template = visible_template(&data, path.into_inner(), &viewer)?;

    Ok(HttpResponse::Ok().json(TemplateResponse {
        template: template.into_template(),
    }))
}

pub async fn create_template(
    data: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<TemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let draft = draft_from_request(request.into_inner())?;

    let id = data.database.create_template(user.id, &draft)?;
    let template = data.database.get_template(id)?.into_template();

    Ok(HttpResponse::Created().json(TemplateResponse { template }))
}

pub async fn update_template(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<TemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let id = path.into_inner();
    managed_template(&data, id, &user)?;

    let draft = draft_from_request(request.into_inner())?;
    data.database.update_template(id, &draft)?;
    let template = data.database.get_template(id)?.into_template();

    Ok(HttpResponse::Ok().json(TemplateResponse { template }))
}

pub async fn delete_template(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let id = path.into_inner();
    managed_template(&data, id, &user)?;

    data.database.delete_template(id)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_tags(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let tags = data.database.list_tags()?;
    Ok(HttpResponse::Ok().json(TagListResponse { tags }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstack_models::{Question, TemplateMode, TypeTag};

    fn request(title: &str, tags: &[&str], questions: Vec<Question>) -> TemplateRequest {
        TemplateRequest {
            title: title.to_string(),
            description: String::new(),
            topic: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            mode: TemplateMode::Public,
            questions,
        }
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let result = draft_from_request(request("   ", &[], vec![]));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_tags_are_normalised() {
        let draft = draft_from_request(request("T", &[" HR ", "hr", "", "Survey"], vec![])).unwrap();
        assert_eq!(draft.tags, vec!["hr".to_string(), "survey".to_string()]);
    }

    #[test]
    fn test_overflowing_questions_are_truncated_not_rejected() {
        let questions = (1..=6)
            .map(|i| Question::new(TypeTag::Text, format!("Q{i}"), ""))
            .collect();

        let draft = draft_from_request(request("Long", &[], questions)).unwrap();

        assert!(draft.slots.contains_key("customText4Question"));
        assert!(!draft.slots.contains_key("customText5Question"));
    }
}
