//! Access rules for catalog and order resources.
//!
//! The catalog (trains, stations, routes, journeys, ...) is readable by any
//! authenticated user and writable by staff only. Orders are open to every
//! authenticated user but always scoped to the caller by the handlers.

use axum::http::Method;

use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn from_method(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
            Access::Read
        } else {
            Access::Write
        }
    }
}

pub fn authorize_catalog(identity: Option<&Claims>, access: Access) -> AppResult<()> {
    let claims = identity.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })?;

    if claims.is_staff() || access == Access::Read {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

pub fn authorize_orders(identity: Option<&Claims>) -> AppResult<&Claims> {
    identity.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })
}
