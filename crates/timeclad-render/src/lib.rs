#![forbid(unsafe_code)]

//! Output generators for computed timeclad layouts.
//!
//! Every generator returns the whole document as a `String`; writing it anywhere is up to the
//! caller.

mod assets;
pub mod conf;
pub mod csv;
pub mod error;
pub mod json;
pub mod svg;
mod util;

pub use conf::render_conf;
pub use csv::render_csv;
pub use error::{Error, Result};
pub use json::render_json;
pub use svg::{Orientation, render_svg};

use std::fmt;
use std::str::FromStr;
use timeclad_core::Config;
use timeclad_layout::Layout;

/// The text formats this crate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Svg,
    Csv,
    Conf,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Svg, Self::Csv, Self::Conf, Self::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Csv => "csv",
            Self::Conf => "conf",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| format!("unknown output format `{s}`"))
    }
}

/// Renders `layout` in `format`. `config` supplies the drawing options (and is the whole
/// payload of the conf format).
pub fn render(format: OutputFormat, layout: &Layout, config: &Config) -> Result<String> {
    tracing::debug!(%format, "generating output");
    match format {
        OutputFormat::Svg => render_svg(layout, config),
        OutputFormat::Csv => Ok(render_csv(layout)),
        OutputFormat::Conf => render_conf(config),
        OutputFormat::Json => render_json(layout),
    }
}
