use crate::api::errors::ApiError;
use crate::api::guards::load_paper;
use crate::core::state::AppState;
use crate::db::models::{Paper, Quiz, User};
use crate::db::types::{Section, UserRole};
use crate::repositories;

pub(crate) async fn load_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

pub(crate) async fn load_quiz_with_paper(
    state: &AppState,
    quiz_id: &str,
) -> Result<(Quiz, Paper), ApiError> {
    let quiz = load_quiz(state, quiz_id).await?;
    let paper = load_paper(state, &quiz.paper_id).await?;
    Ok((quiz, paper))
}

/// Section filter for a quiz listing. Students always see their own section
/// plus quizzes open to every section.
pub(super) fn effective_section(user: &User, requested: Option<Section>) -> SectionFilter {
    if user.role != UserRole::Student {
        return match requested {
            Some(section) => SectionFilter::Section(section),
            None => SectionFilter::All,
        };
    }

    match user.section {
        Some(section) => SectionFilter::Section(section),
        None => SectionFilter::UnrestrictedOnly,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SectionFilter {
    All,
    Section(Section),
    UnrestrictedOnly,
}

pub(super) fn student_can_see(user: &User, quiz: &Quiz) -> bool {
    match quiz.section {
        Some(section) => user.section == Some(section),
        None => true,
    }
}
