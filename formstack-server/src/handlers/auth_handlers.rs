use super::main_handlers::AppState;
use crate::auth;
use crate::error::AppError;
use crate::middleware::current_user;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use formstack_models::{LoginRequest, RefreshRequest, RegisterRequest, User, UserResponse};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Creates an account and signs it in. The very first account becomes an admin.
pub async fn register(
    data: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let register_req = request.into_inner();
    let username = register_req.username.trim().to_string();
    let email = register_req.email.trim().to_string();

    if username.is_empty() {
        return Err(AppError::InvalidRequest(
            "Username cannot be empty".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidRequest(
            "A valid email address is required".to_string(),
        ));
    }
    if register_req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if data.database.get_user_by_name(&username)?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if data.database.get_user_by_email(&email)?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = auth::hash_password(&register_req.password)?;
    let mut user = User::new(username, email, password_hash);

    // Bootstrap: with no users yet, nobody could ever grant the admin role
    user.id = data.database.register_user(&mut user)?;
    data.database.record_login(user.id)?;

    let response = auth::issue_session(&data.database, &data.config.auth, &user, None)?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login(
    data: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let login_req = request.into_inner();

    let user = data
        .database
        .get_user_by_email(login_req.email.trim())?
        .ok_or_else(|| AppError::AuthenticationFailed("Invalid email or password".to_string()))?;

    if !auth::verify_password(&login_req.password, &user.password_hash)? {
        tracing::warn!("Failed login attempt for user {}", user.id);
        return Err(AppError::AuthenticationFailed(
            "Invalid email or password".to_string(),
        ));
    }

    if user.is_blocked {
        tracing::warn!("Blocked user {} attempted to log in", user.id);
        return Err(AppError::Forbidden("User is blocked".to_string()));
    }

    data.database.record_login(user.id)?;

    let response = auth::issue_session(&data.database, &data.config.auth, &user, None)?;
    Ok(HttpResponse::Ok().json(response))
}

/// Exchanges a refresh token for a new pair, revoking the presented one.
pub async fn refresh(
    data: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let record = auth::check_refresh_token(&data.database, &request.refresh_token)?;

    let user = data
        .database
        .get_user_by_id(record.user_id)
        .map_err(|_| AppError::Unauthorized("User no longer exists".to_string()))?;

    if user.is_blocked {
        return Err(AppError::Forbidden("User is blocked".to_string()));
    }

    let response = auth::issue_session(&data.database, &data.config.auth, &user, Some(&record))?;
    Ok(HttpResponse::Ok().json(response))
}

/// Revokes the presented refresh token. Unknown tokens are ignored.
pub async fn logout(
    data: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let token_hash = auth::hash_refresh_token(&request.refresh_token);

    if let Some(record) = data.database.get_refresh_token_by_hash(&token_hash)? {
        data.database.revoke_refresh_token(record.id)?;
        tracing::info!("User {} logged out", record.user_id);
    }

    Ok(HttpResponse::NoContent().finish())
}

pub async fn me(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user_info = current_user(&req)?;
    let user = data.database.get_user_by_id(user_info.id)?;

    Ok(HttpResponse::Ok().json(UserResponse { user }))
}
