use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::error::{AppError, AppResult};
use crate::policy::{authorize_catalog, authorize_orders, Access};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth.map_err(|_| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })?;

    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Staff may write the catalog, everyone authenticated may read it
pub async fn require_catalog_access(request: Request, next: Next) -> AppResult<Response> {
    let access = Access::from_method(request.method());
    authorize_catalog(request.extensions().get::<Claims>(), access)?;

    Ok(next.run(request).await)
}

/// Any authenticated user
pub async fn require_authenticated(request: Request, next: Next) -> AppResult<Response> {
    authorize_orders(request.extensions().get::<Claims>())?;

    Ok(next.run(request).await)
}
