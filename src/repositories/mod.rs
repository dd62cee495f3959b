pub(crate) mod health;
pub(crate) mod papers;
pub(crate) mod quiz_submissions;
pub(crate) mod quizzes;
pub(crate) mod users;
