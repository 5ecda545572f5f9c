//! The unified error handling system for the application.

// 1. Core Types
pub use types::{AppError, FieldError};

/// A unified `Result` type for the entire application.
///
/// All functions that can fail should return this type.
pub type Result<T> = std::result::Result<T, AppError>;

// 2. Module declarations
pub mod conversion;
pub mod macros;
pub mod types;

// 3. Context Trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let context_message = context().to_string();
                Err(AppError::Context {
                    context: context_message,
                    source: Box::new(error.into()),
                })
            }
        }
    }
}

// 4. Error Category for logging and response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Errors caused by the client (e.g., bad input, invalid credentials).
    /// Corresponds to 4xx HTTP status codes.
    Client,
    /// Errors caused by the server or its dependencies.
    /// Corresponds to 5xx HTTP status codes.
    Server,
}


/// 写库结果：唯一约束冲突转为业务冲突，其余错误附加上下文
pub trait WriteContext<T> {
    #[track_caller]
    fn write_context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;
}

impl<T> WriteContext<T> for std::result::Result<T, sea_orm::DbErr> {
    #[track_caller]
    fn write_context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => match conversion::unique_conflict(&err) {
                Some(conflict) => Err(conflict),
                None => Err(err).context(context),
            },
        }
    }
}
