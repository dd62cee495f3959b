use sqlx::PgPool;

use crate::db::models::Paper;

const COLUMNS: &str = "id, code, title, department, teacher_id, sections, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Paper>, sqlx::Error> {
    sqlx::query_as::<_, Paper>(&format!("SELECT {COLUMNS} FROM papers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_department(
    pool: &PgPool,
    department: &str,
) -> Result<Vec<Paper>, sqlx::Error> {
    sqlx::query_as::<_, Paper>(&format!(
        "SELECT {COLUMNS} FROM papers WHERE department = $1 ORDER BY code"
    ))
    .bind(department)
    .fetch_all(pool)
    .await
}

pub(crate) async fn is_enrolled(
    pool: &PgPool,
    paper_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM paper_enrollments WHERE paper_id = $1 AND student_id = $2
         )",
    )
    .bind(paper_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}
