use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Paper, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::quiz_validation::can_manage_paper;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// How the caller relates to a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaperAccess {
    Staff,
    Student,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

pub(crate) async fn load_paper(state: &AppState, paper_id: &str) -> Result<Paper, ApiError> {
    repositories::papers::find_by_id(state.db(), paper_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load paper"))?
        .ok_or_else(|| ApiError::NotFound("Paper not found".to_string()))
}

pub(crate) fn require_paper_staff(user: &User, paper: &Paper) -> Result<(), ApiError> {
    if can_manage_paper(user, paper) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the paper's assigned teacher can do this"))
    }
}

/// Staff of the paper, or a student enrolled in it.
pub(crate) async fn require_paper_access(
    state: &AppState,
    user: &User,
    paper: &Paper,
) -> Result<PaperAccess, ApiError> {
    if can_manage_paper(user, paper) {
        return Ok(PaperAccess::Staff);
    }

    if user.role != UserRole::Student {
        return Err(ApiError::forbidden("Not enough permissions for this paper"));
    }

    let enrolled = repositories::papers::is_enrolled(state.db(), &paper.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if enrolled {
        Ok(PaperAccess::Student)
    } else {
        Err(ApiError::forbidden("You are not enrolled in this paper"))
    }
}
