//! Resolving flat records into an arena-backed forest.

use crate::annotate::{PlacedConnector, PlacedDomain};
use crate::error::{Error, ReferenceKind, Result};
use crate::options::{LayoutOptions, SortKey};
use crate::warning::{self, Warning};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::path::PathBuf;
use timeclad_core::{Calendar, Cladogram, Date, DuplicateNames, Image, Node};

/// A node record together with its place in the forest.
///
/// `parent`, `children` and `root` are indices into [`Forest::nodes`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneNode {
    #[serde(flatten)]
    pub node: Node,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub root: usize,
    /// This node plus all of its descendants.
    pub size: usize,
    pub lane: i32,
}

impl LaneNode {
    fn new(node: Node) -> Self {
        Self {
            node,
            parent: None,
            children: Vec::new(),
            root: 0,
            size: 1,
            lane: 0,
        }
    }
}

/// Validated records, ready for lane assignment.
#[derive(Debug, Clone)]
pub struct Forest {
    pub nodes: Vec<LaneNode>,
    pub connectors: Vec<PlacedConnector>,
    pub domains: Vec<PlacedDomain>,
    pub images: Vec<Image>,
    pub base_dir: Option<PathBuf>,
    pub beginning_of_time: Date,
    pub end_of_time: Date,
    /// Dates are compared only after rolling overflow over this calendar.
    pub calendar: Calendar,
    pub warnings: Vec<Warning>,
}

impl Forest {
    /// Checks the records and links them up.
    ///
    /// Stops are clamped to the end of time, zero months and days become `1`, nodes starting
    /// after the end of time are dropped, and names are resolved into indices.
    pub fn build(cladogram: &Cladogram, options: &LayoutOptions) -> Result<Self> {
        let calendar = options.calendar;
        let resolved = |d: Date| d.normalized().resolve_overflow(calendar);
        let end = options.end_of_time.normalized();
        let in_vitro = options.in_vitro || cladogram.in_vitro;
        let mut warnings = Vec::new();

        let mut records: Vec<&Node> = cladogram.nodes.iter().collect();
        match options.sort_key {
            SortKey::Input => {}
            SortKey::Name => records.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Start => records.sort_by_key(|n| resolved(n.start)),
        }
        let known: FxHashSet<&str> = records.iter().map(|n| n.name.as_str()).collect();

        let mut nodes = Vec::with_capacity(records.len());
        for record in records {
            let mut node = record.clone();
            node.start = node.start.normalized();
            if resolved(end) < resolved(node.start) {
                warning::emit(
                    &mut warnings,
                    Warning::NodeAfterEndOfTime { name: node.name },
                );
                continue;
            }
            if node.stop.is_unset() || resolved(end) < resolved(node.stop) {
                node.stop = end;
            }
            node.stop = node.stop.normalized();

            if resolved(node.stop) < resolved(node.start) {
                return Err(Error::Chronology {
                    name: node.name,
                    violation: "stops before it starts".to_string(),
                });
            }
            if node.name == node.parent_name {
                return Err(Error::SelfReference { name: node.name });
            }
            nodes.push(LaneNode::new(node));
        }

        check_duplicates(&nodes, options.duplicate_names, &mut warnings)?;
        link_parents(&mut nodes, calendar, in_vitro, &mut warnings)?;
        check_acyclic(&nodes)?;

        let mut beginning_of_time = nodes
            .iter()
            .map(|n| n.node.start)
            .min_by_key(|&d| resolved(d))
            .unwrap_or(end);

        if let Some(slice) = options.slice.as_deref() {
            let Some(at) = nodes.iter().rposition(|n| n.node.name == slice) else {
                return Err(Error::Reference {
                    kind: ReferenceKind::Slice,
                    name: slice.to_string(),
                    referrer: "the slice option".to_string(),
                });
            };
            let keep: Vec<bool> = (0..nodes.len())
                .map(|i| i == at || descends_from(&nodes, i, at))
                .collect();
            nodes[at].parent = None;
            nodes[at].node.parent_name.clear();
            beginning_of_time = nodes[at].node.start;
            nodes = retain(nodes, &keep);
            tracing::debug!(slice, kept = nodes.len(), "sliced forest");
        }

        finish_tree_links(&mut nodes);

        let by_name: FxHashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node.name.as_str(), i))
            .collect();

        let mut domains = Vec::new();
        for domain in &cladogram.domains {
            let name = domain.node_name.as_str();
            match by_name.get(name) {
                Some(&node) => domains.push(PlacedDomain::new(domain.clone(), node)),
                None if known.contains(name) => warning::emit(
                    &mut warnings,
                    Warning::DomainDropped {
                        node: name.to_string(),
                    },
                ),
                None => {
                    return Err(Error::Reference {
                        kind: ReferenceKind::Domain,
                        name: name.to_string(),
                        referrer: format!("domain of {name}"),
                    });
                }
            }
        }

        let mut connectors = Vec::new();
        for record in &cladogram.connectors {
            let mut connector = record.clone();
            connector.from_when = connector.from_when.normalized();
            connector.to_when = connector.to_when.normalized();
            let from = connector.from_name.clone();
            let to = connector.to_name.clone();

            if resolved(end) < resolved(connector.from_when)
                || resolved(end) < resolved(connector.to_when)
            {
                warning::emit(
                    &mut warnings,
                    Warning::ConnectorAfterEndOfTime { from, to },
                );
                continue;
            }
            for endpoint in [&from, &to] {
                if !known.contains(endpoint.as_str()) {
                    return Err(Error::Reference {
                        kind: ReferenceKind::ConnectorEndpoint,
                        name: endpoint.clone(),
                        referrer: format!("connector {from} -> {to}"),
                    });
                }
            }
            match (by_name.get(from.as_str()), by_name.get(to.as_str())) {
                (Some(&a), Some(&b)) => connectors.push(PlacedConnector::new(connector, a, b)),
                _ => warning::emit(&mut warnings, Warning::ConnectorDropped { from, to }),
            }
        }

        Ok(Self {
            nodes,
            connectors,
            domains,
            images: cladogram.images.clone(),
            base_dir: cladogram.base_dir.clone(),
            beginning_of_time,
            end_of_time: end,
            calendar,
            warnings,
        })
    }

    /// Root indices in node order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parent.is_none())
            .collect()
    }

    pub fn lanes(&self) -> Vec<i32> {
        self.nodes.iter().map(|n| n.lane).collect()
    }

    /// Start of `node` with day and month overflow rolled over.
    pub fn start_of(&self, node: usize) -> Date {
        self.nodes[node].node.start.resolve_overflow(self.calendar)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().rposition(|n| n.node.name == name)
    }

    /// `true` if `ancestor` is a strict ancestor of `node`.
    pub fn descends_from(&self, node: usize, ancestor: usize) -> bool {
        descends_from(&self.nodes, node, ancestor)
    }
}

pub(crate) fn descends_from(nodes: &[LaneNode], node: usize, ancestor: usize) -> bool {
    let mut cursor = nodes[node].parent;
    let mut steps = 0;
    while let Some(p) = cursor {
        if p == ancestor {
            return true;
        }
        steps += 1;
        if steps > nodes.len() {
            return false;
        }
        cursor = nodes[p].parent;
    }
    false
}

fn check_duplicates(
    nodes: &[LaneNode],
    policy: DuplicateNames,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let mut first_seen: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, n) in nodes.iter().enumerate() {
        let name = n.node.name.as_str();
        let Some(&first) = first_seen.get(name) else {
            first_seen.insert(name, i);
            continue;
        };
        let (first, second) = (first + 1, i + 1);
        match policy {
            DuplicateNames::Error => {
                return Err(Error::DuplicateName {
                    name: name.to_string(),
                    first,
                    second,
                });
            }
            DuplicateNames::Warn => warning::emit(
                warnings,
                Warning::DuplicateName {
                    name: name.to_string(),
                    first,
                    second,
                },
            ),
        }
    }
    Ok(())
}

/// Resolves parent names. With duplicate names the last listed node wins.
fn link_parents(
    nodes: &mut [LaneNode],
    calendar: Calendar,
    in_vitro: bool,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let by_name: FxHashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.node.name.clone(), i))
        .collect();

    for i in 0..nodes.len() {
        let parent_name = &nodes[i].node.parent_name;
        if parent_name.is_empty() {
            continue;
        }
        let Some(&p) = by_name.get(parent_name) else {
            return Err(Error::Reference {
                kind: ReferenceKind::Parent,
                name: parent_name.clone(),
                referrer: nodes[i].node.name.clone(),
            });
        };

        let (child, parent) = (&nodes[i].node, &nodes[p].node);
        let (child_start, parent_start) = (
            child.start.resolve_overflow(calendar),
            parent.start.resolve_overflow(calendar),
        );
        if child_start < parent_start {
            return Err(Error::Chronology {
                name: child.name.clone(),
                violation: format!("starts before its parent {}", parent.name),
            });
        }
        if !in_vitro && parent.stop.resolve_overflow(calendar) < child_start {
            warning::emit(
                warnings,
                Warning::StartsAfterParentStops {
                    name: child.name.clone(),
                    parent: parent.name.clone(),
                },
            );
        }
        nodes[i].parent = Some(p);
    }
    Ok(())
}

fn check_acyclic(nodes: &[LaneNode]) -> Result<()> {
    for (i, n) in nodes.iter().enumerate() {
        let mut cursor = n.parent;
        let mut steps = 0;
        while let Some(p) = cursor {
            steps += 1;
            if p == i || steps > nodes.len() {
                return Err(Error::Cycle {
                    name: n.node.name.clone(),
                });
            }
            cursor = nodes[p].parent;
        }
    }
    Ok(())
}

fn retain(nodes: Vec<LaneNode>, keep: &[bool]) -> Vec<LaneNode> {
    let mut remap = vec![None; nodes.len()];
    let mut kept = Vec::new();
    for (i, node) in nodes.into_iter().enumerate() {
        if keep[i] {
            remap[i] = Some(kept.len());
            kept.push(node);
        }
    }
    for node in &mut kept {
        node.parent = node.parent.and_then(|p| remap[p]);
    }
    kept
}

/// Fills in children, subtree sizes and roots from the parent links.
fn finish_tree_links(nodes: &mut [LaneNode]) {
    for n in nodes.iter_mut() {
        n.children.clear();
        n.size = 1;
    }
    for i in 0..nodes.len() {
        if let Some(p) = nodes[i].parent {
            nodes[p].children.push(i);
        }
        let mut root = i;
        let mut cursor = nodes[i].parent;
        while let Some(p) = cursor {
            nodes[p].size += 1;
            root = p;
            cursor = nodes[p].parent;
        }
        nodes[i].root = root;
    }
}
