use crate::HttpMethod;

use super::{split_path, Matcher, Params, Pattern, PatternError};

/// Matches by trying every route in registration order.
pub struct LinearMatcher<T> {
    routes: Vec<(HttpMethod, Pattern, T)>,
}

impl<T> Default for LinearMatcher<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> std::fmt::Debug for LinearMatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMatcher")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl<T: Send + Sync> Matcher<T> for LinearMatcher<T> {
    fn add(&mut self, method: HttpMethod, pattern: &str, value: T) -> Result<(), PatternError> {
        self.routes.push((method, Pattern::parse(pattern)?, value));
        Ok(())
    }

    fn find(&self, method: HttpMethod, path: &str) -> Option<(&T, Params)> {
        let segments = split_path(path);

        self.routes
            .iter()
            .filter(|(m, _, _)| *m == method)
            .find_map(|(_, pattern, value)| pattern.matches(&segments).map(|p| (value, p)))
    }
}
