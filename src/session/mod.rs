//! Client side of the take-quiz flow: a timer-driven session that buffers
//! answers locally and submits them through a [`QuizGateway`].

mod driver;
mod gateway;
mod http;
mod machine;
mod types;

pub use driver::SessionDriver;
pub use gateway::{GatewayError, QuizGateway};
pub use http::HttpQuizGateway;
pub use machine::{
    Attempt, Completion, Notice, QuizSession, SessionCommand, SessionState, UserAction,
};
pub use types::{PaperQuestion, QuizPaper, SubmitRequest, SubmitResult};
