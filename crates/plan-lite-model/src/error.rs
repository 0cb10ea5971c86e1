// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph construction and source reading

use std::fmt;
use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Which id namespace a duplicate was detected in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Level,
    Space,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Level => write!(f, "level"),
            EntityKind::Space => write!(f, "space"),
        }
    }
}

/// The attribute holding an unresolved reference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceSite {
    /// `Space.level_id`
    SpaceLevel,
    /// `Relationship.source_id`
    RelationshipSource,
    /// `Relationship.target_id`
    RelationshipTarget,
}

/// A single unresolved reference found by integrity validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingRef {
    /// Id of the space, or `type:source->target` of the relationship
    pub owner: String,
    /// The id that could not be resolved
    pub missing: String,
    pub site: ReferenceSite,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.site {
            ReferenceSite::SpaceLevel => {
                write!(f, "space '{}' references unknown level '{}'", self.owner, self.missing)
            }
            ReferenceSite::RelationshipSource => write!(
                f,
                "relationship {} has unknown source '{}'",
                self.owner, self.missing
            ),
            ReferenceSite::RelationshipTarget => write!(
                f,
                "relationship {} has unknown target '{}'",
                self.owner, self.missing
            ),
        }
    }
}

fn join_dangling(refs: &[DanglingRef]) -> String {
    refs.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Graph invariant violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An id was inserted twice into the same namespace
    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId { kind: EntityKind, id: String },

    /// One or more references do not resolve (all violations are reported)
    #[error("Dangling references ({}): {}", .0.len(), join_dangling(.0))]
    DanglingReference(Vec<DanglingRef>),
}

impl GraphError {
    /// Create a duplicate-id error
    pub fn duplicate(kind: EntityKind, id: impl Into<String>) -> Self {
        GraphError::DuplicateId {
            kind,
            id: id.into(),
        }
    }
}

/// Errors raised by format readers while decoding a payload
#[derive(Error, Debug)]
pub enum ParseError {
    /// Payload is not in the expected format at all
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Failed to parse the header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to parse an individual record
    #[error("Failed to parse record at line {line}: {message}")]
    Record { line: usize, message: String },

    /// Payload is not valid UTF-8 text
    #[error("Payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new record error
    pub fn record(line: usize, msg: impl Into<String>) -> Self {
        ParseError::Record {
            line,
            message: msg.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ParseError::Other(msg.into())
    }
}

/// Errors raised while re-hydrating a serialized graph
#[derive(Error, Debug)]
pub enum SerializeError {
    /// The value does not have the `{levels, spaces, relationships}` shape
    #[error("Invalid graph document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The decoded graph violates an invariant
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_message_lists_every_violation() {
        let err = GraphError::DanglingReference(vec![
            DanglingRef {
                owner: "s1".into(),
                missing: "L9".into(),
                site: ReferenceSite::SpaceLevel,
            },
            DanglingRef {
                owner: "contains:L1->s2".into(),
                missing: "s2".into(),
                site: ReferenceSite::RelationshipTarget,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Dangling references (2)"));
        assert!(msg.contains("unknown level 'L9'"));
        assert!(msg.contains("unknown target 's2'"));
    }

    #[test]
    fn test_duplicate_message() {
        let err = GraphError::duplicate(EntityKind::Level, "L1");
        assert_eq!(err.to_string(), "Duplicate level id 'L1'");
    }
}
