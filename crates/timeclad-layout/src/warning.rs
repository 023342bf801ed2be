use serde::Serialize;
use std::fmt;

/// A non-fatal finding. The affected record is skipped or left as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    NodeAfterEndOfTime { name: String },
    DuplicateName { name: String, first: usize, second: usize },
    StartsAfterParentStops { name: String, parent: String },
    DomainDropped { node: String },
    ConnectorAfterEndOfTime { from: String, to: String },
    ConnectorDropped { from: String, to: String },
    SmallDomain { node: String, size: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeAfterEndOfTime { name } => {
                write!(f, "ignoring {name}: starts after the end of time")
            }
            Self::DuplicateName {
                name,
                first,
                second,
            } => write!(
                f,
                "{name} (entry {second}) is already listed at position {first}"
            ),
            Self::StartsAfterParentStops { name, parent } => {
                write!(f, "{name} starts after its parent ({parent}) stops")
            }
            Self::DomainDropped { node } => write!(f, "unable to assign domain to {node}"),
            Self::ConnectorAfterEndOfTime { from, to } => {
                write!(f, "ignoring connector {from} -> {to}: reaches after the end of time")
            }
            Self::ConnectorDropped { from, to } => {
                write!(f, "unable to assign connector {from} -> {to}")
            }
            Self::SmallDomain { node, size } => write!(
                f,
                "domain of {node} will not get spaced and may overlap others: its tree has only \
                 {size} nodes (lower treeSpacingBiggerThan)"
            ),
        }
    }
}

pub(crate) fn emit(warnings: &mut Vec<Warning>, warning: Warning) {
    tracing::warn!("{warning}");
    warnings.push(warning);
}
