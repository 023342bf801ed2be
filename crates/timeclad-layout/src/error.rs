use serde::Serialize;
use std::fmt;

/// What kind of record a dangling name was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    Parent,
    Domain,
    ConnectorEndpoint,
    Slice,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parent => "parent",
            Self::Domain => "domain node",
            Self::ConnectorEndpoint => "connector endpoint",
            Self::Slice => "slice node",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to find {kind} `{name}` (referenced by {referrer})")]
    Reference {
        kind: ReferenceKind,
        name: String,
        referrer: String,
    },

    #[error("{name} {violation}")]
    Chronology { name: String, violation: String },

    #[error("{name} has the same name as its parent")]
    SelfReference { name: String },

    #[error("{name} descends from itself")]
    Cycle { name: String },

    #[error("{name} (entry {second}) is already listed at position {first}")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("lane assignment for tree `{root}` placed {actual} nodes, expected {expected}")]
    InternalConsistency {
        root: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid layout option {option}: `{value}`")]
    InvalidOption { option: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
