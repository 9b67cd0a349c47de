use crate::auth::validate_token;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpRequest,
};
use formstack_models::{Role, UserInfo};
use futures_util::future::{ready, LocalBoxFuture, Ready};

/// Resolves a bearer token to a `UserInfo` request extension.
///
/// Requests without an `Authorization` header pass through anonymously;
/// handlers that need a user call [`current_user`]. A header that is present
/// but invalid, or that belongs to a deleted or blocked account, is rejected
/// here.
pub struct AuthenticationMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService { service }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let Some(auth_header) = auth_header else {
            return Box::pin(self.service.call(req));
        };

        match authenticate(&req, &auth_header) {
            Ok(user_info) => {
                tracing::debug!("Auth successful for user: {}", user_info.username);
                req.extensions_mut().insert(user_info);
                Box::pin(self.service.call(req))
            }
            Err(e) => {
                tracing::warn!("Auth failed for {} {}: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(Error::from(e)) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest, auth_header: &str) -> AppResult<UserInfo> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state not available".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized(
            "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
        )
    })?;

    let claims = validate_token(token, &state.config.auth.jwt_secret)?;

    // Role and blocked status come from storage so admin changes apply immediately
    let user = state
        .database
        .get_user_by_id(claims.user_id()?)
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("User no longer exists".to_string()),
            other => other,
        })?;

    if user.is_blocked {
        return Err(AppError::Forbidden("User is blocked".to_string()));
    }

    Ok(user.info())
}

/// The authenticated user, or 401 for anonymous requests.
pub fn current_user(req: &HttpRequest) -> AppResult<UserInfo> {
    req.extensions()
        .get::<UserInfo>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// The authenticated user, if any.
pub fn optional_user(req: &HttpRequest) -> Option<UserInfo> {
    req.extensions().get::<UserInfo>().cloned()
}

/// Rejects requests whose user does not hold at least `required` role.
/// Must be wrapped inside [`AuthenticationMiddleware`].
pub struct RoleMiddleware {
    required: Role,
}

impl RoleMiddleware {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RoleMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleMiddlewareService {
            service,
            required: self.required,
        }))
    }
}

pub struct RoleMiddlewareService<S> {
    service: S,
    required: Role,
}

impl<S, B> Service<ServiceRequest> for RoleMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<UserInfo>().map(|user| user.role);

        let denied = match role {
            None => Some(AppError::Unauthorized("Authentication required".to_string())),
            Some(role) if role < self.required => Some(AppError::Forbidden(format!(
                "Requires {} role",
                self.required.as_str()
            ))),
            Some(_) => None,
        };

        match denied {
            Some(e) => {
                tracing::warn!("Access denied for {} {}: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(Error::from(e)) })
            }
            None => Box::pin(self.service.call(req)),
        }
    }
}
