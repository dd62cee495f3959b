use axum::http::{Method, StatusCode};
use sqlx::types::Json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Paper, Quiz, User};
use crate::db::types::Section;
use crate::test_support::{self, QuizFixture, TestContext};

async fn record_score(pool: &PgPool, quiz: &Quiz, student: &User, score: i32, total_marks: i32) {
    let now = primitive_now_utc();
    sqlx::query(
        "INSERT INTO quiz_submissions (
            id, quiz_id, student_id, answers, score, total_marks, submitted_at,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&quiz.id)
    .bind(&student.id)
    .bind(Json(Vec::<Option<i32>>::new()))
    .bind(score)
    .bind(total_marks)
    .bind(now)
    .execute(pool)
    .await
    .expect("insert submission");
}

async fn fetch(ctx: &TestContext, token: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
        .await
        .expect("quiz marks");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn paper_with_quizzes(ctx: &TestContext, teacher: &User, code: &str) -> (Paper, Quiz, Quiz) {
    let db = ctx.state.db();
    let paper = test_support::insert_paper(db, code, "CSE", &teacher.id, &[Section::A]).await;
    let first = test_support::insert_quiz(db, &paper, QuizFixture::default()).await;
    let second = test_support::insert_quiz(db, &paper, QuizFixture::default()).await;
    (paper, first, second)
}

#[tokio::test]
async fn paper_marks_average_each_student() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher = test_support::insert_teacher(db, "teacher01").await;
    let (paper, first, second) = paper_with_quizzes(&ctx, &teacher, "CS301").await;
    let steady = test_support::insert_student(db, "student01", Section::A).await;
    let once = test_support::insert_student(db, "student02", Section::A).await;
    let absent = test_support::insert_student(db, "student03", Section::A).await;

    record_score(db, &first, &steady, 4, 10).await;
    record_score(db, &second, &steady, 6, 10).await;
    record_score(db, &second, &once, 7, 10).await;

    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let (status, body) =
        fetch(&ctx, &token, &format!("/api/v1/papers/{}/quiz-marks", paper.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz_count"], 2);
    assert_eq!(body["averages"][steady.id.as_str()], 5);
    assert_eq!(body["averages"][once.id.as_str()], 7);
    assert!(body["averages"].get(absent.id.as_str()).is_none());
    assert!(body["diagnostics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_quiz_is_skipped_with_diagnostic() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher = test_support::insert_teacher(db, "teacher01").await;
    let (paper, healthy, corrupt) = paper_with_quizzes(&ctx, &teacher, "CS301").await;
    let student = test_support::insert_student(db, "student01", Section::A).await;

    record_score(db, &healthy, &student, 3, 3).await;
    record_score(db, &corrupt, &student, -2, 3).await;

    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let (status, body) =
        fetch(&ctx, &token, &format!("/api/v1/papers/{}/quiz-marks", paper.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averages"][student.id.as_str()], 3);
    let diagnostics = body["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["quiz_id"], corrupt.id);
    assert!(diagnostics[0]["reason"].as_str().unwrap().contains("negative score"));
}

#[tokio::test]
async fn department_marks_are_admin_only() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher = test_support::insert_teacher(db, "teacher01").await;
    let admin = test_support::insert_admin(db, "admin01").await;
    let (paper, first, _) = paper_with_quizzes(&ctx, &teacher, "CS301").await;
    let (other_paper, _, _) = paper_with_quizzes(&ctx, &teacher, "CS302").await;
    let student = test_support::insert_student(db, "student01", Section::A).await;
    record_score(db, &first, &student, 2, 3).await;

    let teacher_token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let (status, _) = fetch(&ctx, &teacher_token, "/api/v1/departments/CSE/quiz-marks").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let (status, body) = fetch(&ctx, &admin_token, "/api/v1/departments/CSE/quiz-marks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], "CSE");

    let papers = body["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 2);
    let marked = papers.iter().find(|entry| entry["paper_id"] == paper.id).expect("paper entry");
    assert_eq!(marked["averages"][student.id.as_str()], 2);
    let empty = papers.iter().find(|entry| entry["paper_id"] == other_paper.id).expect("entry");
    assert!(empty["averages"].as_object().unwrap().is_empty());

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());
    let (status, _) =
        fetch(&ctx, &student_token, &format!("/api/v1/papers/{}/quiz-marks", paper.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
