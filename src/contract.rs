use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use specta::Type;
use thiserror::Error;

use crate::Schema;

/// The HTTP methods a procedure can be exposed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// Normalise a path to have a single leading slash, no trailing slash and no empty segments.
///
/// ```rust
/// use rspc_contract::standardize_path;
///
/// assert_eq!(standardize_path("users//{id}/"), "/users/{id}");
/// assert_eq!(standardize_path(""), "/");
/// ```
pub fn standardize_path(path: &str) -> String {
    let segments = path.split('/').filter(|s| !s.is_empty());
    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }

    if out.is_empty() {
        out.push('/');
    }
    out
}

/// The declared shape of a procedure, independent of its implementation.
///
/// A contract is immutable, all the builder methods return a new value. A missing method or path
/// is resolved when the router is built: the method defaults to `POST` and the path to the
/// procedure's position in the router.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    input: Option<Schema>,
    output: Option<Schema>,
    method: Option<HttpMethod>,
    path: Option<Cow<'static, str>>,
}

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, schema: Schema) -> Self {
        self.input = Some(schema);
        self
    }

    pub fn output(mut self, schema: Schema) -> Self {
        self.output = Some(schema);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the HTTP path. Segments in braces like `/users/{id}` capture a parameter and a final
    /// `{name*}` or `*` captures the rest of the path.
    pub fn path(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Shorthand for [`Contract::method`] and [`Contract::path`].
    pub fn route(self, method: HttpMethod, path: impl Into<Cow<'static, str>>) -> Self {
        self.method(method).path(path)
    }

    /// Returns a new contract with `prefix` prepended to the path.
    ///
    /// Prefixes apply outside-in: `contract.prefix("/a").prefix("/b")` on a contract with the path
    /// `/p` has the path `/b/a/p`. A contract without a path gets `prefix` as its path.
    pub fn prefix(&self, prefix: &str) -> Self {
        let path = match &self.path {
            Some(path) => format!("{prefix}{path}"),
            None => prefix.to_string(),
        };

        Self {
            path: Some(path.into()),
            ..self.clone()
        }
    }

    pub fn input_schema(&self) -> Option<&Schema> {
        self.input.as_ref()
    }

    pub fn output_schema(&self) -> Option<&Schema> {
        self.output.as_ref()
    }

    pub fn http_method(&self) -> Option<HttpMethod> {
        self.method
    }

    pub fn http_path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardize() {
        assert_eq!(standardize_path("/"), "/");
        assert_eq!(standardize_path("a/b"), "/a/b");
        assert_eq!(standardize_path("//a///b//"), "/a/b");
    }

    #[test]
    fn prefix_composes_outside_in() {
        let contract = Contract::new().path("/p");
        assert_eq!(contract.prefix("/a").prefix("/b").http_path(), Some("/b/a/p"));
        assert_eq!(
            contract.prefix("/a").prefix("/b").http_path(),
            contract.prefix("/b/a").http_path()
        );
    }

    #[test]
    fn prefix_without_path() {
        let contract = Contract::new().method(HttpMethod::Get);
        let prefixed = contract.prefix("/api");

        assert_eq!(prefixed.http_path(), Some("/api"));
        assert_eq!(prefixed.http_method(), Some(HttpMethod::Get));
        assert_eq!(contract.http_path(), None);
    }

    #[test]
    fn method_from_str() {
        assert_eq!("get".parse(), Ok(HttpMethod::Get));
        assert_eq!(
            "TRACE".parse::<HttpMethod>(),
            Err(UnsupportedMethod("TRACE".into()))
        );
        assert_eq!(
            UnsupportedMethod("TRACE".into()).to_string(),
            "unsupported HTTP method 'TRACE'"
        );
    }
}
