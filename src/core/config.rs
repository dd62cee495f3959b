mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{QuizSettings, Settings};

#[cfg(test)]
pub(crate) use types::{ConfigError, Environment};
