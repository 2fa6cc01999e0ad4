use std::{borrow::Cow, fmt, panic::Location};

use thiserror::Error;

use crate::matcher::PatternError;

/// A problem with a router detected while it was being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub(crate) cause: BuildErrorCause,
    #[cfg(debug_assertions)]
    pub(crate) name: Cow<'static, str>,
    #[cfg(debug_assertions)]
    pub(crate) loc: &'static Location<'static>,
}

impl BuildError {
    #[track_caller]
    pub(crate) fn new(cause: BuildErrorCause, name: Cow<'static, str>) -> Self {
        #[cfg(not(debug_assertions))]
        let _ = name;

        Self {
            cause,
            #[cfg(debug_assertions)]
            name,
            #[cfg(debug_assertions)]
            loc: Location::caller(),
        }
    }

    pub fn cause(&self) -> &BuildErrorCause {
        &self.cause
    }

    /// Prefix the key path of this error with the name of the router it was nested into.
    pub(crate) fn nested(self, key: &str) -> Self {
        #[cfg(debug_assertions)]
        return Self {
            name: format!("{key}.{}", self.name).into(),
            ..self
        };

        #[cfg(not(debug_assertions))]
        {
            let _ = key;
            self
        }
    }

    /// DO NOT USE IT, it's for unit testing only and may change without a major version bump.
    #[doc(hidden)]
    #[cfg(debug_assertions)]
    pub fn expose(&self) -> (String, String) {
        (self.name.to_string(), self.cause.to_string())
    }
}

impl fmt::Display for BuildError {
    #[cfg(debug_assertions)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}: {}", self.name, self.loc, self.cause)
    }

    #[cfg(not(debug_assertions))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl std::error::Error for BuildError {}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildErrorCause {
    #[error(
        "a procedure or router name must be more than 1 character and less than 255 characters"
    )]
    InvalidName,
    #[error("a procedure or router name contains the character '{0}' which is not allowed. Names must be alphanumeric or have '_', '-' or '~'")]
    InvalidCharInName(char),
    #[error("a procedure or router with the name '{0}' has already been registered")]
    DuplicateName(String),
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PatternError),
}

pub(crate) fn is_valid_name(name: &str) -> Option<BuildErrorCause> {
    if name.is_empty() || name.len() > 255 {
        return Some(BuildErrorCause::InvalidName);
    }

    for c in name.chars() {
        if !(c.is_alphanumeric() || c == '_' || c == '-' || c == '~') {
            return Some(BuildErrorCause::InvalidCharInName(c));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(is_valid_name("ping"), None);
        assert_eq!(is_valid_name("get_user-v2~beta"), None);
        assert_eq!(is_valid_name(""), Some(BuildErrorCause::InvalidName));
        assert_eq!(
            is_valid_name(&"a".repeat(256)),
            Some(BuildErrorCause::InvalidName)
        );
        assert_eq!(
            is_valid_name("a.b"),
            Some(BuildErrorCause::InvalidCharInName('.'))
        );
        assert_eq!(
            is_valid_name("a/b"),
            Some(BuildErrorCause::InvalidCharInName('/'))
        );
    }
}
