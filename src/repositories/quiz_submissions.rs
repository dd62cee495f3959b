use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::QuizSubmission;
use crate::db::types::Section;

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, student_id, answers, score, total_marks, submitted_at, \
    time_taken_seconds, attempt_number, auto_submitted, created_at, updated_at";

pub(crate) struct NewSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) answers: &'a [Option<i32>],
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) time_taken_seconds: i32,
    pub(crate) auto_submitted: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubmissionListingRow {
    pub(crate) student_id: String,
    pub(crate) roll_no: Option<String>,
    pub(crate) student_name: String,
    pub(crate) section: Option<Section>,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) time_taken_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) auto_submitted: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ScoreRow {
    pub(crate) student_id: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
}

pub(crate) async fn find_for_student(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
) -> Result<Option<QuizSubmission>, sqlx::Error> {
    sqlx::query_as::<_, QuizSubmission>(&format!(
        "SELECT {COLUMNS} FROM quiz_submissions WHERE quiz_id = $1 AND student_id = $2"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// First attempt. Returns `None` when the student already has a row, which
/// leaves the stored submission untouched.
pub(crate) async fn insert_if_absent(
    pool: &PgPool,
    params: NewSubmission<'_>,
) -> Result<Option<QuizSubmission>, sqlx::Error> {
    sqlx::query_as::<_, QuizSubmission>(&format!(
        "INSERT INTO quiz_submissions (
            id, quiz_id, student_id, answers, score, total_marks, submitted_at,
            time_taken_seconds, attempt_number, auto_submitted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $7, $7)
        ON CONFLICT (quiz_id, student_id) DO NOTHING
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.student_id)
    .bind(Json(params.answers))
    .bind(params.score)
    .bind(params.total_marks)
    .bind(params.submitted_at)
    .bind(params.time_taken_seconds)
    .bind(params.auto_submitted)
    .fetch_optional(pool)
    .await
}

/// Retake path: inserts attempt 1 or overwrites the existing row in place,
/// bumping `attempt_number` in the same statement.
pub(crate) async fn upsert_retake(
    pool: &PgPool,
    params: NewSubmission<'_>,
) -> Result<QuizSubmission, sqlx::Error> {
    sqlx::query_as::<_, QuizSubmission>(&format!(
        "INSERT INTO quiz_submissions (
            id, quiz_id, student_id, answers, score, total_marks, submitted_at,
            time_taken_seconds, attempt_number, auto_submitted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $7, $7)
        ON CONFLICT (quiz_id, student_id) DO UPDATE
            SET answers = EXCLUDED.answers,
                score = EXCLUDED.score,
                total_marks = EXCLUDED.total_marks,
                submitted_at = EXCLUDED.submitted_at,
                time_taken_seconds = EXCLUDED.time_taken_seconds,
                attempt_number = quiz_submissions.attempt_number + 1,
                auto_submitted = EXCLUDED.auto_submitted,
                updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.student_id)
    .bind(Json(params.answers))
    .bind(params.score)
    .bind(params.total_marks)
    .bind(params.submitted_at)
    .bind(params.time_taken_seconds)
    .bind(params.auto_submitted)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
    section: Option<Section>,
    skip: i64,
    limit: i64,
) -> Result<Vec<SubmissionListingRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT s.student_id,
                u.roll_no,
                u.full_name AS student_name,
                u.section,
                s.score,
                s.total_marks,
                s.submitted_at,
                s.time_taken_seconds,
                s.attempt_number,
                s.auto_submitted
         FROM quiz_submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.quiz_id = ",
    );
    builder.push_bind(quiz_id);

    if let Some(section) = section {
        builder.push(" AND u.section = ");
        builder.push_bind(section);
    }

    builder.push(" ORDER BY u.roll_no NULLS LAST, u.full_name OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<SubmissionListingRow>().fetch_all(pool).await
}

pub(crate) async fn count_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
    section: Option<Section>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*)
         FROM quiz_submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.quiz_id = ",
    );
    builder.push_bind(quiz_id);

    if let Some(section) = section {
        builder.push(" AND u.section = ");
        builder.push_bind(section);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_scores_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<ScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRow>(
        "SELECT student_id, score, total_marks FROM quiz_submissions WHERE quiz_id = $1",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}
