use mediatr_core::{ConfigError, DispatchError, RegistrationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
