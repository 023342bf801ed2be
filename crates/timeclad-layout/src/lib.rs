#![forbid(unsafe_code)]

//! Headless lane layout for cladograms.
//!
//! Every lineage gets an integer lane (a row of the timeline). Lanes are first handed out one
//! tree at a time, then compacted by heuristics that only ever move a node onto a lane it fits
//! into, so two nodes share a lane only when their spacing-widened intervals are disjoint.
//!
//! ```no_run
//! use timeclad_core::{Cladogram, Date, Node};
//! use timeclad_layout::{LayoutOptions, layout};
//!
//! let clad = Cladogram::new()
//!     .with_node(Node::new("A").with_span(Date::year(1990), Date::year(2000)))
//!     .with_node(Node::new("B").with_span(Date::year(2001), Date::year(2005)));
//! let opts = LayoutOptions::default().with_end_of_time(Date::year(2010));
//! let out = layout(&clad, &opts).unwrap();
//! assert_eq!(out.lane_of("A"), out.lane_of("B"));
//! ```

pub mod annotate;
pub mod error;
pub mod forest;
mod lanes;
mod optimize;
pub mod options;
pub mod warning;

pub use annotate::{Layout, PlacedConnector, PlacedDomain};
pub use error::{Error, ReferenceKind, Result};
pub use forest::{Forest, LaneNode};
pub use options::{Aggressiveness, DerivationStyle, LayoutOptions, SortKey, TreeMode};
pub use warning::Warning;

use timeclad_core::Cladogram;

/// Builds the forest, assigns and compacts lanes, and derives the annotation spans.
pub fn layout(cladogram: &Cladogram, options: &LayoutOptions) -> Result<Layout> {
    tracing::info!(
        "computing cladogram for {} nodes, {} connectors and {} domains",
        cladogram.nodes.len(),
        cladogram.connectors.len(),
        cladogram.domains.len()
    );
    let mut forest = Forest::build(cladogram, options)?;
    forest.assign_lanes(options.tree_mode)?;
    forest.compact(options);
    forest.space_trees(options);
    forest.pad_fat_lines(options);
    Ok(forest.into_layout(options))
}
