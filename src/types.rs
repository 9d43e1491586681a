use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source artifact a qualified name points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    Class,
    Method,
    Expression,
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactType::Class => "CLASS",
            ArtifactType::Method => "METHOD",
            ArtifactType::Expression => "EXPRESSION",
        };
        f.write_str(name)
    }
}

/// A language-specific fully qualified name, valid at one commit
///
/// The same identifier may refer to different code, or to nothing, at other commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactQualifiedName {
    /// Fully qualified identifier (e.g. `GetterMethod.getStr()`)
    pub identifier: String,
    /// Commit hash the identifier is valid at
    pub commit_id: String,
    /// Kind of artifact
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
}

impl ArtifactQualifiedName {
    pub fn new(
        identifier: impl Into<String>,
        commit_id: impl Into<String>,
        artifact_type: ArtifactType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            commit_id: commit_id.into(),
            artifact_type,
        }
    }

    /// Shorthand for a METHOD name
    pub fn method(identifier: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self::new(identifier, commit_id, ArtifactType::Method)
    }

    /// The same identifier re-stamped at another commit
    pub fn at_commit(&self, commit_id: impl Into<String>) -> Self {
        Self {
            identifier: self.identifier.clone(),
            commit_id: commit_id.into(),
            artifact_type: self.artifact_type,
        }
    }

    /// Last dotted segment with the parameter list stripped
    ///
    /// `GetterMethod.getStr(int)` -> `getStr`
    pub fn simple_name(&self) -> &str {
        simple_name(&self.identifier)
    }

    /// Identifier segments outside the parameter list, split on `.` and `::`
    pub fn path_segments(&self) -> Vec<&str> {
        let head = match self.identifier.find('(') {
            Some(idx) => &self.identifier[..idx],
            None => self.identifier.as_str(),
        };
        head.split(['.', ':'])
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

impl fmt::Display for ArtifactQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identifier, self.commit_id)
    }
}

/// Simple name of a qualified identifier
pub fn simple_name(identifier: &str) -> &str {
    let head = match identifier.find('(') {
        Some(idx) => &identifier[..idx],
        None => identifier,
    };
    head.rsplit(['.', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(head)
}

/// One method as produced by a tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedMethod {
    /// Qualified name; the commit id is stamped by whoever read the source
    pub qualified_name: ArtifactQualifiedName,
    /// Leaf-level lexical tokens of the body, in source order
    pub tokens: Vec<String>,
}

impl TokenizedMethod {
    /// Create a method that is not yet bound to a commit
    pub fn new(identifier: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            qualified_name: ArtifactQualifiedName::method(identifier, ""),
            tokens,
        }
    }

    /// Bind to the commit its source was read from
    pub fn with_commit(mut self, commit_id: &str) -> Self {
        self.qualified_name.commit_id = commit_id.to_string();
        self
    }

    pub fn identifier(&self) -> &str {
        &self.qualified_name.identifier
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name.simple_name()
    }

    /// True when the body has no extractable tokens (empty or `[""]`)
    pub fn is_degenerate(&self) -> bool {
        self.tokens.iter().all(|token| token.is_empty())
    }
}
