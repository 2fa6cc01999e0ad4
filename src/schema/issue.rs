use std::{error, fmt};

use serde::{Deserialize, Serialize};

/// A location within a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A single reason a value failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    pub(crate) fn prefixed(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }

        let path = self
            .path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{path}: {}", self.message)
    }
}

/// The result of a failed validation. Always holds at least one [`Issue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(message)],
        }
    }

    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub(crate) fn prefixed(self, segment: PathSegment) -> Vec<Issue> {
        self.issues
            .into_iter()
            .map(|issue| issue.prefixed(segment.clone()))
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "{}", issues.join("; "))
    }
}

impl error::Error for ValidationError {}
