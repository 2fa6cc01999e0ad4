use std::collections::HashSet;

use thiserror::Error;

use crate::standardize_path;

use super::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
    /// Matches the rest of the path, which may be empty. Captured when named.
    Wildcard(Option<String>),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    #[error("the wildcard in '{0}' must be the last segment")]
    WildcardNotLast(String),
    #[error("the parameter '{param}' is used more than once in '{path}'")]
    DuplicateParam { path: String, param: String },
    #[error("the segment '{segment}' in '{path}' is not a literal or a '{{name}}' parameter")]
    InvalidSegment { path: String, segment: String },
}

/// A parsed path template like `/users/{id}/files/{rest*}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub(crate) segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(path: &str) -> Result<Self, PatternError> {
        let path = standardize_path(path);
        let mut segments = Vec::new();
        let mut names = HashSet::new();

        for raw in path.split('/').filter(|s| !s.is_empty()) {
            if matches!(segments.last(), Some(Segment::Wildcard(_))) {
                return Err(PatternError::WildcardNotLast(path.clone()));
            }

            let segment = if raw == "*" {
                Segment::Wildcard(None)
            } else if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (name, wildcard) = match name.strip_suffix('*') {
                    Some(name) => (name, true),
                    None => (name, false),
                };

                if name.is_empty() || name.contains(['{', '}', '*']) {
                    return Err(PatternError::InvalidSegment {
                        segment: raw.to_string(),
                        path: path.clone(),
                    });
                }

                if !names.insert(name.to_string()) {
                    return Err(PatternError::DuplicateParam {
                        param: name.to_string(),
                        path: path.clone(),
                    });
                }

                match wildcard {
                    true => Segment::Wildcard(Some(name.to_string())),
                    false => Segment::Param(name.to_string()),
                }
            } else if raw.contains(['{', '}', '*']) {
                return Err(PatternError::InvalidSegment {
                    segment: raw.to_string(),
                    path: path.clone(),
                });
            } else {
                Segment::Literal(raw.to_string())
            };

            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Match the segments of a request path, returning the captured parameters.
    pub(crate) fn matches(&self, path: &[&str]) -> Option<Params> {
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if path.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), path.get(i)?.to_string());
                }
                Segment::Wildcard(name) => {
                    if let Some(name) = name {
                        params.insert(name.clone(), path.get(i..).unwrap_or_default().join("/"));
                    }
                    return Some(params);
                }
            }
        }

        (path.len() == self.segments.len()).then_some(params)
    }
}

/// Split a request path into its non-empty segments.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        Pattern::parse(pattern)
            .unwrap()
            .matches(&split_path(path))
            .map(|p| p.into_iter().collect())
    }

    #[test]
    fn literal_and_params() {
        assert_eq!(params("/users", "/users/"), Some(vec![]));
        assert_eq!(params("/users", "/users/1"), None);
        assert_eq!(
            params("/users/{id}/posts/{post}", "/users/1/posts/abc"),
            Some(vec![
                ("id".into(), "1".into()),
                ("post".into(), "abc".into())
            ])
        );
        assert_eq!(params("/users/{id}", "/users"), None);
    }

    #[test]
    fn wildcards() {
        assert_eq!(
            params("/files/{rest*}", "/files/a/b/c"),
            Some(vec![("rest".into(), "a/b/c".into())])
        );
        assert_eq!(
            params("/files/{rest*}", "/files"),
            Some(vec![("rest".into(), "".into())])
        );
        assert_eq!(params("/files/*", "/files/a/b"), Some(vec![]));
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            Pattern::parse("/a/*/b"),
            Err(PatternError::WildcardNotLast(_))
        ));
        assert!(matches!(
            Pattern::parse("/{id}/{id}"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            Pattern::parse("/user-{id}"),
            Err(PatternError::InvalidSegment { .. })
        ));
        assert!(matches!(
            Pattern::parse("/{}"),
            Err(PatternError::InvalidSegment { .. })
        ));
    }
}
