//! Error taxonomy for registration and dispatch.
//!
//! Registration conflicts and dispatch failures are separate enums so that
//! setup code and request code can match on exactly what they can hit.
//! Every kind also maps to a stable numeric [`ErrorCode`].

use thiserror::Error;

use crate::config::ConfigError;

/// Error type returned by handler and behavior bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[repr(u16)]
pub enum ErrorCode {
    RequestHandlerAlreadyExists = 1,
    RequestPipelineBehaviorAlreadyExists = 2,
    RequestHandlerNotFound = 3,
    RequestHandlerNotValid = 4,
    NotificationHandlerNotValid = 5,
    NoHandlersProvided = 6,
    ResponseTypeMismatch = 7,
    HandlerFailed = 8,
    PipelineFailed = 9,
    NotificationHandlerFailed = 10,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("registered handler already exists in the registry for message {request}")]
    RequestHandlerAlreadyExists { request: &'static str },

    #[error("pipeline behavior {behavior} is already registered")]
    PipelineBehaviorAlreadyExists { behavior: &'static str },

    #[error("no handlers provided for notification {notification}")]
    NoHandlersProvided { notification: &'static str },
}

impl RegistrationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RequestHandlerAlreadyExists { .. } => ErrorCode::RequestHandlerAlreadyExists,
            Self::PipelineBehaviorAlreadyExists { .. } => {
                ErrorCode::RequestPipelineBehaviorAlreadyExists
            }
            Self::NoHandlersProvided { .. } => ErrorCode::NoHandlersProvided,
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no handlers for request {request}")]
    RequestHandlerNotFound { request: &'static str },

    #[error("handler registered for request {request} does not produce {response}")]
    RequestHandlerNotValid {
        request: &'static str,
        response: &'static str,
    },

    #[error("invalid handler type for notification {notification}")]
    NotificationHandlerNotValid { notification: &'static str },

    #[error("pipeline returned a response that is not {response} for request {request}")]
    ResponseTypeMismatch {
        request: &'static str,
        response: &'static str,
    },

    #[error("handler error for request {request}: {source}")]
    Handler {
        request: &'static str,
        source: BoxError,
    },

    #[error("pipeline error in {behavior}: {source}")]
    Pipeline {
        behavior: &'static str,
        source: BoxError,
    },

    #[error("notification handler failed for {notification}: {source}")]
    NotificationHandler {
        notification: &'static str,
        source: BoxError,
    },

    #[error("{count} notification handler(s) failed for {notification}", count = .failures.len())]
    NotificationHandlers {
        notification: &'static str,
        failures: Vec<DispatchError>,
    },
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RequestHandlerNotFound { .. } => ErrorCode::RequestHandlerNotFound,
            Self::RequestHandlerNotValid { .. } => ErrorCode::RequestHandlerNotValid,
            Self::NotificationHandlerNotValid { .. } => ErrorCode::NotificationHandlerNotValid,
            Self::ResponseTypeMismatch { .. } => ErrorCode::ResponseTypeMismatch,
            Self::Handler { .. } => ErrorCode::HandlerFailed,
            Self::Pipeline { .. } => ErrorCode::PipelineFailed,
            Self::NotificationHandler { .. } | Self::NotificationHandlers { .. } => {
                ErrorCode::NotificationHandlerFailed
            }
        }
    }

    /// True when the failure came out of a handler or behavior body rather
    /// than from resolution.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::Handler { .. }
                | Self::Pipeline { .. }
                | Self::NotificationHandler { .. }
                | Self::NotificationHandlers { .. }
        )
    }

    /// Keeps an already classified error as is, otherwise wraps it with `wrap`.
    pub(crate) fn classify(error: BoxError, wrap: impl FnOnce(BoxError) -> Self) -> Self {
        match error.downcast::<DispatchError>() {
            Ok(classified) => *classified,
            Err(other) => wrap(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum MediatorError {
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl MediatorError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Registration(e) => Some(e.code()),
            Self::Dispatch(e) => Some(e.code()),
            Self::Config(_) => None,
        }
    }
}

pub type MediatorResult<T> = Result<T, MediatorError>;
