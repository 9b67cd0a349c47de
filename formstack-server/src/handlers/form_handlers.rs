use super::main_handlers::AppState;
use super::template_handlers::{managed_template, visible_template};
use crate::database::{StoredForm, Viewer};
use crate::error::AppError;
use crate::middleware::current_user;
use crate::slots::{encode_answer_row, merge, overflowing_tags};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use formstack_models::{
    Answer, FormListResponse, FormRequest, FormResponse, FormView, FormViewListResponse,
    Template, UserInfo,
};

fn validate_answers(answers: &[Answer]) -> Result<(), AppError> {
    for (position, answer) in answers.iter().enumerate() {
        if !answer.kind.accepts(&answer.answer) {
            return Err(AppError::InvalidRequest(format!(
                "Answer {} is not a valid {} value",
                position + 1,
                answer.kind.as_str()
            )));
        }
    }

    for tag in overflowing_tags(answers.iter().map(|a| &a.kind)) {
        tracing::warn!(
            "Submission has more {} answers than slots; the extra ones are not stored",
            tag.as_str()
        );
    }

    Ok(())
}

fn form_view(form: StoredForm, template: &Template) -> FormView {
    let entries = merge(&template.questions, &form.answers());
    FormView {
        summary: form.summary,
        entries,
    }
}

/// Loads a form and its template if `user` may read it: the submitter, the
/// template's author, or an admin.
fn readable_form(
    data: &AppState,
    id: i64,
    user: &UserInfo,
) -> Result<(StoredForm, Template), AppError> {
    let form = data.database.get_form(id)?;
    let template = data
        .database
        .get_template(form.summary.template_id)?
        .into_template();

    let allowed = form.summary.user_id == user.id
        || template.summary.author_id == user.id
        || user.is_admin();
    if !allowed {
        return Err(AppError::Forbidden(
            "You do not have access to this form".to_string(),
        ));
    }

    Ok((form, template))
}

/// Loads a form if `user` may change it: the submitter or an admin.
fn owned_form(data: &AppState, id: i64, user: &UserInfo) -> Result<StoredForm, AppError> {
    let form = data.database.get_form(id)?;
    if form.summary.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the submitter can change this form".to_string(),
        ));
    }
    Ok(form)
}

/// Submits the caller's answers to a template. Each user may submit once.
pub async fn submit_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<FormRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let template_id = path.into_inner();
    let template =
        visible_template(&data, template_id, &Viewer::from_user(Some(&user)))?.into_template();

    let answers = request.into_inner().answers;
    validate_answers(&answers)?;

    let id = data
        .database
        .create_form(template_id, user.id, &encode_answer_row(&answers))?;
    let form = data.database.get_form(id)?;

    Ok(HttpResponse::Created().json(FormResponse {
        form: form_view(form, &template),
    }))
}

/// All submissions of a template, for its author or an admin.
pub async fn list_template_forms(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let template_id = path.into_inner();
    let template = managed_template(&data, template_id, &user)?.into_template();

    let forms = data
        .database
        .list_forms_by_template(template_id)?
        .into_iter()
        .map(|form| form_view(form, &template))
        .collect();

    Ok(HttpResponse::Ok().json(FormViewListResponse { forms }))
}

pub async fn list_my_forms(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let forms = data.database.list_forms_by_user(user.id)?;

    Ok(HttpResponse::Ok().json(FormListResponse { forms }))
}

pub async fn get_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let (form, template) = readable_form(&data, path.into_inner(), &user)?;

    Ok(HttpResponse::Ok().json(FormResponse {
        form: form_view(form, &template),
    }))
}

/// Replaces every answer of a form.
pub async fn update_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<FormRequest>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let id = path.into_inner();
    owned_form(&data, id, &user)?;

    let answers = request.into_inner().answers;
    validate_answers(&answers)?;
    data.database.update_form(id, &encode_answer_row(&answers))?;

    let (form, template) = readable_form(&data, id, &user)?;
    Ok(HttpResponse::Ok().json(FormResponse {
        form: form_view(form, &template),
    }))
}

pub async fn delete_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&req)?;
    let id = path.into_inner();
    owned_form(&data, id, &user)?;

    data.database.delete_form(id)?;
    Ok(HttpResponse::NoContent().finish())
}
