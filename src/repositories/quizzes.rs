use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Question, Quiz};
use crate::db::types::Section;

pub(crate) const COLUMNS: &str = "\
    id, paper_id, title, description, section, questions, duration_minutes, \
    start_time, end_time, allow_retake, show_results, show_correct_answers, \
    total_marks, created_by, created_at, updated_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) paper_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) section: Option<Section>,
    pub(crate) questions: &'a [Question],
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) allow_retake: bool,
    pub(crate) show_results: bool,
    pub(crate) show_correct_answers: bool,
    pub(crate) total_marks: i32,
    pub(crate) created_by: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

/// Wholesale replacement of an existing definition.
pub(crate) struct UpdateQuiz<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) section: Option<Section>,
    pub(crate) questions: &'a [Question],
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) allow_retake: bool,
    pub(crate) show_results: bool,
    pub(crate) show_correct_answers: bool,
    pub(crate) total_marks: i32,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, paper_id, title, description, section, questions, duration_minutes,
            start_time, end_time, allow_retake, show_results, show_correct_answers,
            total_marks, created_by, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.paper_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.section)
    .bind(Json(params.questions))
    .bind(params.duration_minutes)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.allow_retake)
    .bind(params.show_results)
    .bind(params.show_correct_answers)
    .bind(params.total_marks)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuiz<'_>,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes
         SET title = $2,
             description = $3,
             section = $4,
             questions = $5,
             duration_minutes = $6,
             start_time = $7,
             end_time = $8,
             allow_retake = $9,
             show_results = $10,
             show_correct_answers = $11,
             total_marks = $12,
             updated_at = $13
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.section)
    .bind(Json(params.questions))
    .bind(params.duration_minutes)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.allow_retake)
    .bind(params.show_results)
    .bind(params.show_correct_answers)
    .bind(params.total_marks)
    .bind(params.updated_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Quizzes of a paper; a section filter keeps quizzes open to every section.
pub(crate) async fn list_by_paper(
    pool: &PgPool,
    paper_id: &str,
    section: Option<Section>,
) -> Result<Vec<Quiz>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM quizzes WHERE paper_id = "));
    builder.push_bind(paper_id);

    if let Some(section) = section {
        builder.push(" AND (section IS NULL OR section = ");
        builder.push_bind(section);
        builder.push(")");
    }

    builder.push(" ORDER BY start_time DESC, created_at DESC");

    builder.build_query_as::<Quiz>().fetch_all(pool).await
}

pub(crate) async fn list_ids_by_paper(
    pool: &PgPool,
    paper_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM quizzes WHERE paper_id = $1 ORDER BY start_time, id",
    )
    .bind(paper_id)
    .fetch_all(pool)
    .await
}

/// Returns `false` when no quiz had that id. Submissions go with it.
pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
