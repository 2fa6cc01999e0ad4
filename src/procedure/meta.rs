use std::borrow::Cow;

use crate::HttpMethod;

/// Information about the current request which is given to middleware and handlers.
///
/// For HTTP requests `path` is the request path. For internal calls it's the router key path,
/// either dotted (`nested.ping`) or slashed (`/nested/ping`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub method: HttpMethod,
    pub path: Cow<'static, str>,
}

impl Meta {
    pub fn new(method: HttpMethod, path: impl Into<Cow<'static, str>>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Meta for an internal call to the procedure at `keys`.
    pub fn internal<S: AsRef<str>>(keys: &[S]) -> Self {
        let path = keys
            .iter()
            .map(|k| k.as_ref())
            .collect::<Vec<_>>()
            .join(".");
        Self::new(HttpMethod::Post, path)
    }

    /// The router keys named by `path`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(['/', '.']).filter(|s| !s.is_empty())
    }
}
