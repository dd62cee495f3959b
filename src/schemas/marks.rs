use std::collections::BTreeMap;

use serde::Serialize;

/// A quiz left out of an aggregate, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct QuizDiagnostic {
    pub(crate) quiz_id: String,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PaperDiagnostic {
    pub(crate) paper_id: String,
    pub(crate) reason: String,
}

/// Gradebook feed: rounded average quiz score per student id.
#[derive(Debug, Serialize)]
pub(crate) struct PaperQuizMarks {
    pub(crate) paper_id: String,
    pub(crate) quiz_count: usize,
    pub(crate) averages: BTreeMap<String, i32>,
    pub(crate) diagnostics: Vec<QuizDiagnostic>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentQuizMarks {
    pub(crate) department: String,
    pub(crate) papers: Vec<PaperQuizMarks>,
    pub(crate) diagnostics: Vec<PaperDiagnostic>,
}
