//! Input records of a cladogram, as produced by the parsers.
//!
//! Records only carry names; resolving them into a forest is the layout engine's job.

use crate::color::Color;
use crate::date::Date;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An in-place rename of a lineage. Only used for label placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameChange {
    pub new_name: String,
    pub date: Date,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Empty for roots.
    pub parent_name: String,
    pub start: Date,
    /// Unset means "still alive"; the builder replaces it with the end of time.
    pub stop: Date,
    pub color: Color,
    pub icon: String,
    pub description: String,
    pub name_changes: Vec<NameChange>,
    /// Label shown instead of `name` (directory input uses bare file names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
            start: Date::default(),
            stop: Date::default(),
            color: Color::default(),
            icon: String::new(),
            description: String::new(),
            name_changes: Vec::new(),
            label: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = parent.into();
        self
    }

    pub fn with_span(mut self, start: Date, stop: Date) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn add_name_change(&mut self, new_name: String, date: Date, description: String) {
        self.name_changes.push(NameChange {
            new_name,
            date,
            description,
        });
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A dated cross-reference between two lineages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub from_name: String,
    pub from_when: Date,
    pub to_name: String,
    pub to_when: Date,
    pub thickness: i32,
    pub color: Color,
}

impl Connector {
    pub fn new(
        from_name: impl Into<String>,
        from_when: Date,
        to_name: impl Into<String>,
        to_when: Date,
    ) -> Self {
        Self {
            from_name: from_name.into(),
            from_when,
            to_name: to_name.into(),
            to_when,
            thickness: 1,
            color: Color::default(),
        }
    }
}

/// A shaded band covering one lineage and all of its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub node_name: String,
    pub color: Color,
    /// Opacity at the far end of the band, in percent.
    pub intensity: i32,
}

impl Domain {
    pub fn new(node_name: impl Into<String>, color: Color) -> Self {
        Self {
            node_name: node_name.into(),
            color,
            intensity: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Svg,
    Png,
}

/// An external image pasted onto the canvas at a fixed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub kind: ImageKind,
    pub path: String,
    pub x: i32,
    pub y: i32,
}

/// All records read from one input, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cladogram {
    pub nodes: Vec<Node>,
    pub connectors: Vec<Connector>,
    pub domains: Vec<Domain>,
    pub images: Vec<Image>,
    /// Directory that relative icon/image paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Children may outlive their parents without a warning (directory trees).
    #[serde(default)]
    pub in_vitro: bool,
}

impl Cladogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connectors.push(connector);
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domains.push(domain);
        self
    }
}
