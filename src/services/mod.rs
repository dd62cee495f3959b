pub(crate) mod aggregation;
pub(crate) mod errors;
pub(crate) mod grading;
pub(crate) mod ledger;
pub(crate) mod quiz_validation;
pub(crate) mod review;
