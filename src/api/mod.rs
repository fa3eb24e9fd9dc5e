//! API handlers for Injoyplan REST endpoints

pub mod comments;
pub mod complaints;
pub mod events;
pub mod favorites;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use uuid::Uuid;

use crate::{error::AppError, models::user::UserClaims, AppState};

fn decode(token: &str, state: &AppState) -> Result<UserClaims, AppError> {
    UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

fn bad_header(rejection: TypedHeaderRejection) -> AppError {
    if rejection.is_missing() {
        AppError::Authentication("Missing authorization header".to_string())
    } else {
        AppError::Authentication("Invalid authorization header format".to_string())
    }
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(bad_header)?;

        Ok(AuthenticatedUser(decode(bearer.token(), state)?))
    }
}

/// Optional authentication: no header means anonymous, but a token that is
/// present and invalid is still rejected.
pub struct MaybeUser(pub Option<UserClaims>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(UserClaims::user_id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => {
                Ok(MaybeUser(Some(decode(bearer.token(), state)?)))
            }
            Err(rejection) if rejection.is_missing() => Ok(MaybeUser(None)),
            Err(rejection) => Err(bad_header(rejection)),
        }
    }
}
