//! Deterministic scoring of quiz answers.
//!
//! Grading is a pure function of the question list and the answer buffer. The
//! result is stored with the submission and never recomputed afterwards.

use serde::Serialize;

use crate::db::models::{Question, QuestionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum QuestionOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradeReport {
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) outcomes: Vec<QuestionOutcome>,
}

impl GradeReport {
    pub(crate) fn correct_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| **outcome == QuestionOutcome::Correct).count()
    }
}

pub(crate) fn total_marks(questions: &[Question]) -> i32 {
    questions.iter().fold(0i32, |total, question| total.saturating_add(question.marks.max(0)))
}

/// Scores `answers` against `questions`.
///
/// Missing trailing answers count as unanswered and entries past the last
/// question are ignored.
pub(crate) fn grade(questions: &[Question], answers: &[Option<i32>]) -> GradeReport {
    let mut score: i32 = 0;
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.get(index).copied().flatten();
            let outcome = grade_question(question, selected);
            if outcome == QuestionOutcome::Correct {
                score = score.saturating_add(question.marks.max(0));
            }
            outcome
        })
        .collect();

    GradeReport { score, total_marks: total_marks(questions), outcomes }
}

fn grade_question(question: &Question, selected: Option<i32>) -> QuestionOutcome {
    let Some(selected) = selected else {
        return QuestionOutcome::Unanswered;
    };

    match &question.kind {
        QuestionKind::SingleChoice { correct_answer_index, .. } => {
            if selected == *correct_answer_index {
                QuestionOutcome::Correct
            } else {
                QuestionOutcome::Incorrect
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn single_choice(options: &[&str], correct: i32, marks: i32) -> Question {
    Question {
        text: format!("Pick option {correct}"),
        marks,
        kind: QuestionKind::SingleChoice {
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_answer_index: correct,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_question_quiz() -> Vec<Question> {
        vec![single_choice(&["a", "b"], 1, 1), single_choice(&["c", "d", "e"], 0, 2)]
    }

    #[test]
    fn all_correct_answers_earn_total_marks() {
        let questions = two_question_quiz();
        let report = grade(&questions, &[Some(1), Some(0)]);
        assert_eq!(report.score, 3);
        assert_eq!(report.total_marks, 3);
        assert_eq!(report.correct_count(), 2);
    }

    #[test]
    fn unanswered_quiz_scores_zero() {
        let questions = two_question_quiz();
        let report = grade(&questions, &[None, None]);
        assert_eq!(report.score, 0);
        assert_eq!(
            report.outcomes,
            vec![QuestionOutcome::Unanswered, QuestionOutcome::Unanswered]
        );
        assert_eq!(grade(&questions, &[]).score, 0);
    }

    #[test]
    fn short_answer_buffer_treats_tail_as_unanswered() {
        let questions = two_question_quiz();
        let report = grade(&questions, &[Some(1)]);
        assert_eq!(report.score, 1);
        assert_eq!(report.outcomes, vec![QuestionOutcome::Correct, QuestionOutcome::Unanswered]);
    }

    #[test]
    fn partially_correct_answers_credit_only_matching_marks() {
        let questions = two_question_quiz();
        let report = grade(&questions, &[Some(0), Some(0)]);
        assert_eq!(report.score, 2);
        assert_eq!(report.outcomes[0], QuestionOutcome::Incorrect);
    }

    #[test]
    fn out_of_range_and_negative_selections_are_incorrect() {
        let questions = two_question_quiz();
        let report = grade(&questions, &[Some(7), Some(-1)]);
        assert_eq!(report.score, 0);
        assert_eq!(report.outcomes, vec![QuestionOutcome::Incorrect, QuestionOutcome::Incorrect]);
    }

    #[test]
    fn score_stays_within_bounds_for_every_answer_combination() {
        let questions = vec![
            single_choice(&["a", "b", "c"], 2, 4),
            single_choice(&["a", "b"], 0, 1),
            single_choice(&["a", "b", "c", "d"], 3, 5),
        ];
        let choices = [None, Some(0), Some(1), Some(2), Some(3)];
        let total = total_marks(&questions);

        for first in choices {
            for second in choices {
                for third in choices {
                    let report = grade(&questions, &[first, second, third]);
                    assert!((0..=total).contains(&report.score), "{report:?}");
                    assert_eq!(report, grade(&questions, &[first, second, third]));
                }
            }
        }
    }

    #[test]
    fn extra_answers_do_not_change_the_score() {
        let questions = two_question_quiz();
        assert_eq!(grade(&questions, &[Some(1), Some(0), Some(3)]).score, 3);
    }

    #[test]
    fn oversized_marks_saturate_instead_of_overflowing() {
        let questions =
            vec![single_choice(&["a", "b"], 0, i32::MAX), single_choice(&["a", "b"], 0, i32::MAX)];
        assert_eq!(total_marks(&questions), i32::MAX);
        assert_eq!(grade(&questions, &[Some(0), Some(0)]).score, i32::MAX);
    }
}
