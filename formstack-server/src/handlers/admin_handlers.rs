use super::main_handlers::{page_bounds, AppState};
use crate::error::AppError;
use actix_web::{web, HttpResponse, Result};
use formstack_models::{
    FormListResponse, PageQuery, Role, UpdateUserRequest, User, UserListResponse, UserResponse,
};

pub async fn list_users(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = data.database.get_all_users()?;
    Ok(HttpResponse::Ok().json(UserListResponse { users }))
}

/// Changes a user's role and/or blocked flag. Admins may change their own
/// role, but the last active admin can be neither demoted nor blocked.
pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let update_req = request.into_inner();
    let user = data.database.get_user_by_id(user_id)?;

    if let Some(role) = update_req.role {
        if role != Role::Admin && is_last_active_admin(&data, &user)? {
            return Err(AppError::Conflict(
                "Cannot demote the last remaining admin".to_string(),
            ));
        }
        if role != user.role {
            data.database.set_user_role(user_id, role)?;
        }
    }

    if let Some(is_blocked) = update_req.is_blocked {
        if is_blocked && is_last_active_admin(&data, &user)? {
            return Err(AppError::Conflict(
                "Cannot block the last remaining admin".to_string(),
            ));
        }
        if is_blocked != user.is_blocked {
            data.database.set_user_blocked(user_id, is_blocked)?;
        }
    }

    let user = data.database.get_user_by_id(user_id)?;
    Ok(HttpResponse::Ok().json(UserResponse { user }))
}

fn is_last_active_admin(data: &AppState, user: &User) -> Result<bool, AppError> {
    if user.role != Role::Admin || user.is_blocked {
        return Ok(false);
    }
    Ok(data.database.count_active_admins()? <= 1)
}

pub async fn delete_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let user = data.database.get_user_by_id(user_id)?;

    if is_last_active_admin(&data, &user)? {
        return Err(AppError::Conflict(
            "Cannot delete the last remaining admin".to_string(),
        ));
    }

    data.database.delete_user(user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Submission history across all users, newest first.
pub async fn list_all_forms(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (limit, offset) = page_bounds(&query);
    let forms = data.database.list_all_forms(limit, offset)?;

    Ok(HttpResponse::Ok().json(FormListResponse { forms }))
}
