#![forbid(unsafe_code)]

//! `timeclad` lays out cladograms, forests of dated lineages, on a shared timeline.
//!
//! The headless pipeline is: read records ([`read_input`]), assign lanes
//! ([`layout_with_config`]), then hand the [`Layout`] to a generator.
//!
//! # Features
//!
//! - `render`: SVG, CSV, conf and JSON output (`timeclad::render`)
//! - `raster`: PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use timeclad_core::*;
pub use timeclad_layout::Error as LayoutError;
pub use timeclad_layout::{
    Aggressiveness, DerivationStyle, LaneNode, Layout, LayoutOptions, PlacedConnector,
    PlacedDomain, ReferenceKind, SortKey, TreeMode, Warning, layout,
};

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Input(#[from] timeclad_core::Error),
    #[error(transparent)]
    Layout(#[from] timeclad_layout::Error),
    #[cfg(feature = "render")]
    #[error(transparent)]
    Render(#[from] timeclad_render::Error),
}

pub type HeadlessResult<T> = std::result::Result<T, HeadlessError>;

/// Reads a CSV file, or the tree below a directory.
///
/// Directory input switches `config` to the options that suit file trees.
pub fn read_input(path: &Path, config: &mut Config) -> HeadlessResult<Cladogram> {
    let cladogram = if path.is_dir() {
        parser::parse_dir(path, config)?
    } else {
        parser::read_csv(path)?
    };
    Ok(cladogram)
}

/// Lays out `cladogram` with the layout-relevant subset of `config`.
pub fn layout_with_config(cladogram: &Cladogram, config: &Config) -> HeadlessResult<Layout> {
    let options = LayoutOptions::from_config(config)?;
    Ok(layout(cladogram, &options)?)
}

#[cfg(feature = "render")]
pub mod render {
    pub use timeclad_render::{
        Orientation, OutputFormat, render, render_conf, render_csv, render_json, render_svg,
    };

    use super::{Config, HeadlessResult};
    use std::path::Path;

    #[cfg(feature = "raster")]
    pub mod raster;

    /// Reads `input`, lays it out and renders it in `format`.
    pub fn render_path(
        input: &Path,
        config: &mut Config,
        format: OutputFormat,
    ) -> HeadlessResult<String> {
        let cladogram = super::read_input(input, config)?;
        let layout = super::layout_with_config(&cladogram, config)?;
        Ok(render(format, &layout, config)?)
    }
}
