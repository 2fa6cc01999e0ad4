//! Serve a [`RouterHandler`] over HTTP.
//!
//! This is transport agnostic. A server integration turns its native request into a [`Request`]
//! and writes the returned [`Response`] back out.

pub mod bracket;

use std::borrow::Cow;

use crate::{
    coerce::CoerceOptions, error::INTERNAL_MESSAGE, standardize_path, CallOptions, Context, Error,
    ErrorCode, HttpMethod, Meta, RouterHandler, Value,
};

/// The body of a [`Request`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    /// `application/json`
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded`
    Form(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Body,
}

impl Request {
    /// Create a request. A query string in `url` is split off into [`Request::query`].
    pub fn new(method: impl Into<String>, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (url, None),
        };

        Self {
            method: method.into(),
            path: path.to_string(),
            query,
            body: Body::Empty,
        }
    }

    pub fn json(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Json(body.into());
        self
    }

    pub fn form(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Form(body.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Response {
    fn error(err: &Error) -> Self {
        let body = serde_json::to_value(err).unwrap_or_else(|_| {
            serde_json::json!({
                "code": "INTERNAL_SERVER_ERROR",
                "status": 500,
                "message": INTERNAL_MESSAGE,
            })
        });

        Self {
            status: err.status(),
            body,
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.body.to_string().into_bytes()
    }
}

/// Turns [`Request`]s into calls on a [`RouterHandler`].
#[derive(Debug, Clone)]
pub struct FetchHandler {
    handler: RouterHandler,
    prefix: Cow<'static, str>,
}

impl FetchHandler {
    pub fn new(handler: RouterHandler) -> Self {
        Self {
            handler,
            prefix: Cow::Borrowed(""),
        }
    }

    /// Only serve requests below `prefix`, for example `/api`.
    pub fn prefix(mut self, prefix: &str) -> Self {
        let prefix = standardize_path(prefix);
        self.prefix = match prefix.as_str() {
            "/" => Cow::Borrowed(""),
            _ => Cow::Owned(prefix),
        };
        self
    }

    pub async fn fetch(&self, request: Request, ctx: Context) -> Response {
        match self.dispatch(request, ctx).await {
            Ok(value) => Response {
                status: 200,
                body: value.to_json(),
            },
            Err(err) => Response::error(&err),
        }
    }

    async fn dispatch(&self, request: Request, ctx: Context) -> Result<Value, Error> {
        let method = request.method.parse::<HttpMethod>().map_err(|err| {
            Error::new(ErrorCode::MethodNotSupported, err.to_string())
        })?;

        let path = standardize_path(&request.path);
        let path = match path.strip_prefix(self.prefix.as_ref()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => standardize_path(rest),
            _ => return Err(Error::not_found("Not found")),
        };

        // Everything except a JSON body arrives as strings, including path parameters. Those are
        // coerced on their own when the body is JSON.
        let (input, coerce) = match request.body {
            Body::Json(body) if !body.is_empty() => {
                let body = serde_json::from_slice::<serde_json::Value>(&body).map_err(|err| {
                    Error::with_cause(ErrorCode::BadRequest, "Malformed JSON body", err)
                })?;
                (Value::from(body), None)
            }
            Body::Form(body) => (
                bracket::parse(&body),
                Some(CoerceOptions::bracket_notation()),
            ),
            Body::Json(_) | Body::Empty => match request.query.as_deref() {
                Some(query) if !query.is_empty() => (
                    bracket::parse(query.as_bytes()),
                    Some(CoerceOptions::bracket_notation()),
                ),
                _ => (Value::Undefined, Some(CoerceOptions::bracket_notation())),
            },
        };

        self.handler
            .handle(
                input,
                ctx,
                Meta::new(method, path),
                CallOptions {
                    internal: false,
                    coerce,
                    coerce_params: coerce.is_none(),
                },
            )
            .await
    }
}
