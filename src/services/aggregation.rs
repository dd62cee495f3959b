//! Per-student quiz averages for the gradebook.
//!
//! A quiz with malformed stored data is skipped as a whole and reported back
//! as a diagnostic; the remaining quizzes still count.

use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::core::metrics;
use crate::db::models::Paper;
use crate::repositories;
use crate::repositories::quiz_submissions::ScoreRow;
use crate::schemas::marks::{DepartmentQuizMarks, PaperDiagnostic, PaperQuizMarks, QuizDiagnostic};
use crate::services::errors::QuizError;

#[derive(Debug, Default)]
struct Totals {
    sum: i64,
    count: i64,
}

#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    per_student: BTreeMap<String, Totals>,
}

impl Accumulator {
    pub(crate) fn add_quiz(&mut self, rows: &[ScoreRow]) {
        for row in rows {
            let totals = self.per_student.entry(row.student_id.clone()).or_default();
            totals.sum += i64::from(row.score);
            totals.count += 1;
        }
    }

    /// Students without any contributing quiz never appear in the output.
    pub(crate) fn finish(self) -> BTreeMap<String, i32> {
        self.per_student
            .into_iter()
            .filter(|(_, totals)| totals.count > 0)
            .map(|(student_id, totals)| {
                // f64::round rounds half away from zero.
                let average = (totals.sum as f64 / totals.count as f64).round();
                (student_id, average as i32)
            })
            .collect()
    }
}

/// Rejects a quiz whose stored scores fall outside `[0, total_marks]`.
pub(crate) fn check_quiz_scores(rows: &[ScoreRow]) -> Result<(), String> {
    for row in rows {
        if row.score < 0 {
            return Err(format!("negative score {} for student {}", row.score, row.student_id));
        }
        if row.score > row.total_marks {
            return Err(format!(
                "score {} exceeds total marks {} for student {}",
                row.score, row.total_marks, row.student_id
            ));
        }
    }
    Ok(())
}

/// Pure form of the adapter over already-loaded quiz score sets.
pub(crate) fn average_by_student(
    quizzes: &[(String, Vec<ScoreRow>)],
) -> (BTreeMap<String, i32>, Vec<QuizDiagnostic>) {
    let mut accumulator = Accumulator::default();
    let mut diagnostics = Vec::new();

    for (quiz_id, rows) in quizzes {
        match check_quiz_scores(rows) {
            Ok(()) => accumulator.add_quiz(rows),
            Err(reason) => diagnostics.push(QuizDiagnostic { quiz_id: quiz_id.clone(), reason }),
        }
    }

    (accumulator.finish(), diagnostics)
}

fn skip_quiz(paper_id: &str, quiz_id: &str, reason: String) -> QuizDiagnostic {
    metrics::record_aggregation_skip("quiz");
    tracing::warn!(%paper_id, %quiz_id, %reason, "Skipping quiz in mark aggregation");
    QuizDiagnostic { quiz_id: quiz_id.to_string(), reason }
}

/// Rounded average score per student over every quiz of the paper.
pub(crate) async fn paper_quiz_marks(
    pool: &PgPool,
    paper_id: &str,
) -> Result<PaperQuizMarks, QuizError> {
    let quiz_ids = repositories::quizzes::list_ids_by_paper(pool, paper_id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to list quizzes"))?;

    let mut accumulator = Accumulator::default();
    let mut diagnostics = Vec::new();

    for quiz_id in &quiz_ids {
        let rows = match repositories::quiz_submissions::list_scores_by_quiz(pool, quiz_id).await {
            Ok(rows) => rows,
            Err(err) => {
                diagnostics.push(skip_quiz(paper_id, quiz_id, format!("unreadable submissions: {err}")));
                continue;
            }
        };

        match check_quiz_scores(&rows) {
            Ok(()) => accumulator.add_quiz(&rows),
            Err(reason) => diagnostics.push(skip_quiz(paper_id, quiz_id, reason)),
        }
    }

    let averages = accumulator.finish();
    tracing::debug!(
        %paper_id,
        quiz_count = quiz_ids.len(),
        students = averages.len(),
        skipped = diagnostics.len(),
        "Aggregated quiz marks"
    );

    Ok(PaperQuizMarks {
        paper_id: paper_id.to_string(),
        quiz_count: quiz_ids.len(),
        averages,
        diagnostics,
    })
}

/// Runs [`paper_quiz_marks`] for every paper of a department. A paper that
/// fails is reported and the rest still come back.
pub(crate) async fn department_quiz_marks(
    pool: &PgPool,
    department: &str,
) -> Result<DepartmentQuizMarks, QuizError> {
    let papers: Vec<Paper> = repositories::papers::list_by_department(pool, department)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to list papers"))?;

    let mut results = Vec::with_capacity(papers.len());
    let mut diagnostics = Vec::new();

    for paper in papers {
        match paper_quiz_marks(pool, &paper.id).await {
            Ok(marks) => results.push(marks),
            Err(err) => {
                metrics::record_aggregation_skip("paper");
                tracing::warn!(paper_id = %paper.id, error = %err, "Skipping paper in mark aggregation");
                diagnostics.push(PaperDiagnostic { paper_id: paper.id, reason: err.to_string() });
            }
        }
    }

    Ok(DepartmentQuizMarks { department: department.to_string(), papers: results, diagnostics })
}
