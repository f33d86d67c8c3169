use std::fmt;
use thiserror::Error;

pub type DslResult<T> = Result<T, DslError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DslError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("{0}")]
    Schema(SchemaErrors),
}

impl From<serde_json::Error> for DslError {
    fn from(err: serde_json::Error) -> Self {
        DslError::Json(err.to_string())
    }
}

impl From<SchemaErrors> for DslError {
    fn from(errors: SchemaErrors) -> Self {
        DslError::Schema(errors)
    }
}

/// Category of a single validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// `version` present but not the supported literal.
    VersionMismatch,
    /// `type` names no known node variant.
    UnknownType,
    /// Required field absent.
    Missing,
    /// Field has the wrong JSON type.
    InvalidType,
    /// String field outside its allowed set.
    InvalidEnum,
    /// Nesting exceeds the validator's depth bound.
    TooDeep,
}

/// One step of a path into the raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Location of an issue, e.g. `root.children.1.content`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePath(pub Vec<PathSegment>);

impl IssuePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(document)");
        }
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    pub path: IssuePath,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found in one validation pass, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaErrors(pub Vec<SchemaIssue>);

impl SchemaErrors {
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_version_mismatch(&self) -> bool {
        self.0.iter().any(|i| i.kind == IssueKind::VersionMismatch)
    }

    /// `path: message` pairs, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|i| i.to_string()).collect()
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for SchemaErrors {}
