//! Request extractors.
//!
//! - [`AuthUser`] - the signed-in user behind a bearer token
//! - [`ApiJson`] / [`ApiQuery`] - `Json` / `Query` whose rejections render
//!   the error envelope instead of axum's plain text
//! - [`ListParams`] - `?page=&limit=&search=` shared by list endpoints

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use mbg_core::{PageRequest, Role, User};
use mbg_db::ListQuery;
use serde::Deserialize;

use crate::auth::{extract_bearer_token, AuthError};
use crate::error::ApiError;
use crate::SharedState;

// =============================================================================
// Authentication
// =============================================================================

/// The account making the request.
///
/// The token only proves identity; the user row is loaded on every request
/// so that deactivation and role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// ADMIN passes every guard; anyone else needs one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        if self.0.role == Role::Admin || roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden { role: self.0.role }.into())
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require(&[])
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = state.jwt.verify_access_token(token)?;

        let user = match state.db.users().get(&claims.sub).await {
            Ok(user) => user,
            Err(mbg_db::DbError::NotFound { .. }) => return Err(AuthError::InvalidToken.into()),
            Err(e) => return Err(e.into()),
        };
        if !user.is_active {
            return Err(AuthError::Inactive.into());
        }
        if !user.is_approved {
            return Err(AuthError::NotApproved.into());
        }

        Ok(AuthUser(user))
    }
}

// =============================================================================
// Body / Query
// =============================================================================

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// =============================================================================
// Listing
// =============================================================================

/// Builds a page request, applying the defaults for absent values.
pub fn page_request(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(default.page),
        limit: limit.unwrap_or(default.limit),
    }
    .normalized()
}

/// Paging and search, for list endpoints without further filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn query(self) -> ListQuery {
        ListQuery::new(page_request(self.page, self.limit), self.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let page = page_request(None, None);
        assert_eq!((page.page, page.limit), (1, 20));

        let page = page_request(Some(0), Some(500));
        assert_eq!((page.page, page.limit), (1, 100));

        let page = page_request(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
    }
}
