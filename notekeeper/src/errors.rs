use std::{
    any::Any,
    sync::{Arc, OnceLock},
};

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{db, error_responses};

pub use response::ErrorResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not_found")]
    NotFound(String),
    #[error("method_not_allowed")]
    MethodNotAllowed,

    // validation
    #[error("validation")]
    Validation(String),
    #[error("validation")]
    JsonValidation(#[from] JsonRejection),

    #[error("{message}: {source}")]
    Store {
        message: String,
        #[source]
        source: db::Error,
    },

    // other
    #[error("unexpected")]
    Unexpected(String),
}

impl Error {
    /// Names the operation a store failure happened in.
    /// Other variants pass through untouched.
    pub fn context(self, message: impl Into<String>) -> Self {
        match self {
            Self::Store { source, .. } => Self::Store {
                message: message.into(),
                source,
            },
            error => error,
        }
    }
}

impl From<db::Error> for Error {
    fn from(error: db::Error) -> Self {
        match error {
            db::Error::NotFound(msg) => Self::NotFound(msg),
            error => Self::Store {
                message: "Store error".into(),
                source: error,
            },
        }
    }
}

// Response

error_responses! {
    not_found: 404,
    method_not_allowed: 405,
    validation: 400,
    store: 500,
    unexpected: 500
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let errors = errors();
        match error {
            Error::NotFound(message) => errors.not_found.with_message(message),
            Error::MethodNotAllowed => errors.method_not_allowed.with_message("Method not allowed"),
            Error::Validation(message) => errors.validation.with_message(message),
            Error::JsonValidation(rejection) => errors.validation.with_message(rejection.body_text()),
            Error::Store { message, source } => errors.store.with_message(message).with_error(source.detail()),
            Error::Unexpected(detail) => errors
                .unexpected
                .with_message("Something went wrong!")
                .with_error(detail),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let error = Arc::new(self);

        let error_res = ErrorResponse::from(error.as_ref());
        let status = error_res.status;

        let mut res = axum::Json(error_res).into_response();
        res.extensions_mut().insert(error);

        *res.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        res
    }
}

/// Logs every error that a handler turned into a response.
pub async fn on_error(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let error = response.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    if let Some(error) = error {
        if response.status().is_server_error() {
            tracing::error!(%method, %path, "{:?}", error);
        } else {
            tracing::warn!(%method, %path, "{:?}", error);
        }
    }

    response
}

/// Catch-all for panics raised inside handlers.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };

    Error::Unexpected(detail).into_response()
}

pub async fn route_not_found() -> Error {
    Error::NotFound("Route not found".into())
}

pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

mod response {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Clone, Default)]
    pub struct ErrorResponse {
        pub error: String,
        pub message: String,
        pub status: u16,
    }

    impl ErrorResponse {
        pub fn new(error: impl Into<String>, status: u16) -> Self {
            Self {
                error: error.into(),
                status,
                ..Default::default()
            }
        }

        pub fn with_message(&self, message: impl Into<String>) -> Self {
            let mut res = self.clone();
            res.message = message.into();
            res
        }

        /// Replaces the error kind with the underlying error detail.
        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = error.into();
            self
        }
    }

    /// Typed responses, one per error kind
    /// ```rust
    /// error_responses! {
    ///     not_found: 404,
    ///     unexpected: 500
    /// }
    ///
    /// impl From<&Error> for ErrorResponse {
    ///     fn from(error: &Error) -> Self {
    ///     let errors = errors(); // <- from macro
    ///     match error {
    ///         Error::NotFound(message) => errors.not_found.with_message(message),
    ///         Error::Unexpected(message) => errors.unexpected.with_message(message),
    ///     }
    /// }
    /// ```
    #[macro_export]
    macro_rules! error_responses {
        (
            $($name:ident: $code:expr),* $(,)?
        ) => {
            #[derive(Debug, Clone, Serialize)]
            struct Responses {
                $(
                    $name: ErrorResponse,
                )*
            }

            static ERRORS: OnceLock<Responses> = OnceLock::new();

            fn errors() -> &'static Responses {
                ERRORS.get_or_init(|| Responses {
                    $(
                        $name: ErrorResponse::new(stringify!($name), $code),
                    )*
                })
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_carries_operation_message_and_detail() {
        let error = Error::from(db::Error::Rusqlite(db::rusqlite::Error::InvalidQuery)).context("Error fetching notes");
        let res = ErrorResponse::from(&error);

        assert_eq!(res.status, 500);
        assert_eq!(res.message, "Error fetching notes");
        assert_eq!(res.error, db::rusqlite::Error::InvalidQuery.to_string());
    }

    #[test]
    fn store_error_detail_drops_wrapper_names() {
        let source = db::Error::TokioRusqlite(db::tokio_rusqlite::Error::Rusqlite(db::rusqlite::Error::InvalidQuery));
        let res = ErrorResponse::from(&Error::from(source).context("Error fetching note"));

        assert_eq!(res.error, db::rusqlite::Error::InvalidQuery.to_string());
        assert!(!res.error.contains("Rusqlite"));
    }

    #[test]
    fn not_found_passes_through_context() {
        let error = Error::from(db::Error::NotFound("Note not found".into())).context("Error fetching note");
        let res = ErrorResponse::from(&error);

        assert_eq!(res.status, 404);
        assert_eq!(res.error, "not_found");
        assert_eq!(res.message, "Note not found");
    }

    #[test]
    fn panic_becomes_generic_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let error = response.extensions().get::<Arc<Error>>().map(Arc::as_ref);
        assert!(matches!(error, Some(Error::Unexpected(detail)) if detail == "boom"));
    }
}
