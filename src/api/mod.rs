pub(crate) mod attempts;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod marks;
pub(crate) mod pagination;
pub(crate) mod quizzes;
pub(crate) mod router;
