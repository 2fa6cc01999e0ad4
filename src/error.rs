use std::{error, fmt, sync::Arc};

use serde::{Deserialize, Serialize, Serializer};
use specta::Type;

use crate::{schema::Issue, ValidationError};

pub(crate) const INTERNAL_MESSAGE: &str = "Internal server error";

/// The reason an [`Error`] was raised.
#[derive(Clone)]
pub enum Cause {
    /// An input or output value was rejected by the procedure's schema.
    Validation(ValidationError),
    /// Any other error. This is never sent over the wire.
    Other(Arc<dyn error::Error + Send + Sync>), // `Arc` so the error can be cloned
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => f.debug_tuple("Validation").field(err).finish(),
            Self::Other(err) => f.debug_tuple("Other").field(err).finish(),
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Other(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for Cause {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Other(err) => Some(err.as_ref()),
        }
    }
}

/// A structured error produced while dispatching a procedure.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{message}")]
pub struct Error {
    pub(crate) code: ErrorCode,
    pub(crate) message: String,
    #[source]
    pub(crate) cause: Option<Cause>,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message
    }
}

impl Eq for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<TErr>(code: ErrorCode, message: impl Into<String>, cause: TErr) -> Self
    where
        TErr: error::Error + Send + Sync + 'static,
    {
        Self {
            code,
            message: message.into(),
            cause: Some(Cause::Other(Arc::new(cause))),
        }
    }

    /// Wrap an unexpected error. The client only ever sees a generic message.
    pub fn internal<TErr>(cause: TErr) -> Self
    where
        TErr: error::Error + Send + Sync + 'static,
    {
        Self::with_cause(ErrorCode::InternalServerError, INTERNAL_MESSAGE, cause)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub(crate) fn validation(message: &str, err: ValidationError) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: message.into(),
            cause: Some(Cause::Validation(err)),
        }
    }

    pub(crate) fn input_validation(err: ValidationError) -> Self {
        Self::validation("Validation input failed", err)
    }

    pub(crate) fn output_validation(err: ValidationError) -> Self {
        Self::validation("Validation output failed", err)
    }

    pub(crate) fn panicked(message: String) -> Self {
        Self::with_cause(
            ErrorCode::InternalServerError,
            INTERNAL_MESSAGE,
            Panicked(message),
        )
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// The validation error this error was raised for, if any.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match &self.cause {
            Some(Cause::Validation(err)) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> u16 {
        self.code.to_status_code()
    }

    /// Rebuild an error from an HTTP status and response body.
    ///
    /// Bodies which don't look like a serialized [`Error`] become an `INTERNAL_SERVER_ERROR` with a
    /// generic message so upstream details are never passed on.
    pub fn from_response(status: u16, body: &serde_json::Value) -> Self {
        match serde_json::from_value::<ErrorBody>(body.clone()) {
            Ok(body) if body.status.map_or(true, |s| s == status) => Self {
                code: body.code,
                message: body.message,
                cause: body
                    .issues
                    .map(|issues| Cause::Validation(ValidationError::from_issues(issues))),
            },
            _ => Self::new(ErrorCode::InternalServerError, INTERNAL_MESSAGE),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::input_validation(err)
    }
}

#[derive(Serialize, Deserialize)]
struct ErrorBody {
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<Issue>>,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ErrorBody {
            code: self.code,
            status: Some(self.status()),
            message: self.message.clone(),
            issues: self.validation_error().map(|err| err.issues.clone()),
        }
        .serialize(serializer)
    }
}

#[derive(Debug)]
struct Panicked(String);

impl fmt::Display for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "procedure panicked: {}", self.0)
    }
}

impl error::Error for Panicked {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    ClientClosedRequest,
    InternalServerError,
}

impl ErrorCode {
    pub const fn to_status_code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotSupported => 405,
            Self::Timeout => 408,
            Self::Conflict => 409,
            Self::PreconditionFailed => 412,
            Self::PayloadTooLarge => 413,
            Self::ClientClosedRequest => 499,
            Self::InternalServerError => 500,
        }
    }

    pub const fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            405 => Some(Self::MethodNotSupported),
            408 => Some(Self::Timeout),
            409 => Some(Self::Conflict),
            412 => Some(Self::PreconditionFailed),
            413 => Some(Self::PayloadTooLarge),
            499 => Some(Self::ClientClosedRequest),
            500 => Some(Self::InternalServerError),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_response_is_internal() {
        let err = Error::from_response(400, &json!({}));
        assert_eq!(err.code(), ErrorCode::InternalServerError);
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn response_roundtrip() {
        let err = Error::input_validation(ValidationError::new("Expected string, received number"));
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["status"], 400);

        let restored = Error::from_response(400, &body);
        assert_eq!(restored, err);
        assert_eq!(
            restored.validation_error().map(|e| e.issues.len()),
            Some(1)
        );
    }

    #[test]
    fn mismatched_status_is_internal() {
        let body = serde_json::to_value(Error::not_found("nope")).unwrap();
        assert_eq!(
            Error::from_response(500, &body).code(),
            ErrorCode::InternalServerError
        );
    }

    #[test]
    fn internal_hides_cause() {
        let err = Error::internal(std::io::Error::other("database password is hunter2"));
        let body = serde_json::to_string(&err).unwrap();
        assert!(!body.contains("hunter2"));
        assert!(err.cause().is_some());
    }

    #[test]
    fn status_codes() {
        for code in [
            ErrorCode::BadRequest,
            ErrorCode::NotFound,
            ErrorCode::MethodNotSupported,
            ErrorCode::InternalServerError,
        ] {
            assert_eq!(ErrorCode::from_status_code(code.to_status_code()), Some(code));
        }
        assert_eq!(ErrorCode::from_status_code(418), None);
    }
}
