use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the location of an issue inside a value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => write!(f, "{}", key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single reason a value was rejected
///
/// Example:
/// ```json
/// { "path": ["items", 0, "price"], "message": "must be positive" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    pub message: String,
}

impl Issue {
    /// Create an issue about the value as a whole
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    /// Create an issue about a nested location
    pub fn at<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: Some(path.into_iter().map(Into::into).collect()),
            message: message.into(),
        }
    }

    /// Dotted rendering of the path, empty for root issues
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .flatten()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dotted_path().as_str() {
            "" => write!(f, "{}", self.message),
            path => write!(f, "{}: {}", path, self.message),
        }
    }
}

/// A value failed schema checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error")?;
        if !self.issues.is_empty() {
            write!(f, "\n  Issues:")?;
            for issue in &self.issues {
                write!(f, "\n    - {}", issue)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
