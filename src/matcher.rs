//! Resolve an HTTP method and path to a registered route.
//!
//! Two implementations are provided which always agree on the result:
//!  - [`CompiledMatcher`] builds a segment tree up front and suits long lived servers.
//!  - [`LinearMatcher`] just stores the routes and scans them, so it's cheap to build on every
//!    request in serverless environments.
//!
//! When more than one route matches a request, the route registered first wins.

mod compiled;
mod linear;
mod pattern;

use indexmap::IndexMap;

use crate::HttpMethod;

pub use compiled::CompiledMatcher;
pub use linear::LinearMatcher;
pub use pattern::{Pattern, PatternError};

pub(crate) use pattern::split_path;

/// Parameters captured from the request path, in the order they appear in the pattern.
pub type Params = IndexMap<String, String>;

pub trait Matcher<T>: Send + Sync {
    /// Register a route. Fails if `pattern` is not a valid path template.
    fn add(&mut self, method: HttpMethod, pattern: &str, value: T) -> Result<(), PatternError>;

    /// Find the first registered route which matches.
    fn find(&self, method: HttpMethod, path: &str) -> Option<(&T, Params)>;
}
