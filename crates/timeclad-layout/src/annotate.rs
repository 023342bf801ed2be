//! Lane spans of domains and connectors, derived once the lanes are final.

use crate::forest::{Forest, LaneNode, descends_from};
use crate::options::LayoutOptions;
use crate::warning::{self, Warning};
use serde::Serialize;
use std::path::PathBuf;
use timeclad_core::{Connector, Date, Domain, Image};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedConnector {
    #[serde(flatten)]
    pub connector: Connector,
    pub from: usize,
    pub to: usize,
    /// Lane of the `from` node.
    pub offset_a: i32,
    /// Lane of the `to` node.
    pub offset_b: i32,
}

impl PlacedConnector {
    pub(crate) fn new(connector: Connector, from: usize, to: usize) -> Self {
        Self {
            connector,
            from,
            to,
            offset_a: 0,
            offset_b: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedDomain {
    #[serde(flatten)]
    pub domain: Domain,
    pub node: usize,
    /// Lowest lane of the node and its descendants.
    pub offset_a: i32,
    /// Highest lane of the node and its descendants.
    pub offset_b: i32,
}

impl PlacedDomain {
    pub(crate) fn new(domain: Domain, node: usize) -> Self {
        Self {
            domain,
            node,
            offset_a: 0,
            offset_b: 0,
        }
    }
}

/// The engine's output: records with their lanes, plus what a renderer needs to size a canvas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub nodes: Vec<LaneNode>,
    pub connectors: Vec<PlacedConnector>,
    pub domains: Vec<PlacedDomain>,
    pub images: Vec<Image>,
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
    pub beginning_of_time: Date,
    pub end_of_time: Date,
    /// Highest lane in use.
    pub maximum_offset: i32,
    pub warnings: Vec<Warning>,
}

impl Layout {
    /// Last node with this name.
    pub fn node(&self, name: &str) -> Option<&LaneNode> {
        self.nodes.iter().rev().find(|n| n.node.name == name)
    }

    pub fn lane_of(&self, name: &str) -> Option<i32> {
        self.node(name).map(|n| n.lane)
    }

    pub fn domain_of(&self, name: &str) -> Option<&PlacedDomain> {
        self.domains.iter().find(|d| d.domain.node_name == name)
    }

    pub fn descends_from(&self, node: usize, ancestor: usize) -> bool {
        descends_from(&self.nodes, node, ancestor)
    }
}

impl Forest {
    /// Resolves domain spans and connector lanes and hands the result over.
    pub fn into_layout(mut self, options: &LayoutOptions) -> Layout {
        for i in 0..self.domains.len() {
            let anchor = self.domains[i].node;
            let size = self.nodes[anchor].size;
            if (size as i64) < i64::from(options.tree_spacing_bigger_than) {
                warning::emit(
                    &mut self.warnings,
                    Warning::SmallDomain {
                        node: self.nodes[anchor].node.name.clone(),
                        size,
                    },
                );
            }

            let own = self.nodes[anchor].lane;
            let (low, high) = (0..self.nodes.len())
                .filter(|&n| self.descends_from(n, anchor))
                .map(|n| self.nodes[n].lane)
                .fold((own, own), |(lo, hi), lane| (lo.min(lane), hi.max(lane)));
            self.domains[i].offset_a = low;
            self.domains[i].offset_b = high;
        }

        for connector in &mut self.connectors {
            connector.offset_a = self.nodes[connector.from].lane;
            connector.offset_b = self.nodes[connector.to].lane;
        }

        let maximum_offset = self.nodes.iter().map(|n| n.lane).max().unwrap_or(0);

        if options.debug {
            for n in &self.nodes {
                let marker = if n.parent.is_none() { " *" } else { "" };
                tracing::debug!("{}{marker}\tsize: {}\tlane: {}", n.node.name, n.size, n.lane);
            }
            for c in &self.connectors {
                tracing::debug!(
                    "{} => {}\t({},{})",
                    c.connector.from_name,
                    c.connector.to_name,
                    c.offset_a,
                    c.offset_b
                );
            }
            for d in &self.domains {
                tracing::debug!("domain {}\t({},{})", d.domain.node_name, d.offset_a, d.offset_b);
            }
            tracing::debug!(
                "from {} to {}\ttotal size: {}",
                self.beginning_of_time,
                self.end_of_time,
                maximum_offset + 1
            );
        }

        Layout {
            nodes: self.nodes,
            connectors: self.connectors,
            domains: self.domains,
            images: self.images,
            base_dir: self.base_dir,
            beginning_of_time: self.beginning_of_time,
            end_of_time: self.end_of_time,
            maximum_offset,
            warnings: self.warnings,
        }
    }
}
