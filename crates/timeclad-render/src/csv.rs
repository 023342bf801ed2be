//! Writes a layout back as comma separated records, in the format the CSV parser reads.

use std::fmt::Write as _;
use timeclad_core::ImageKind;
use timeclad_layout::Layout;

const NODE_FIELDS: usize = 8;
const CONNECTOR_FIELDS: usize = 7;
const DOMAIN_FIELDS: usize = 4;
const IMAGE_FIELDS: usize = 4;

/// Every row is padded with empty fields to the widest node row, so spreadsheets see a grid.
pub fn render_csv(layout: &Layout) -> String {
    let width = layout
        .nodes
        .iter()
        .map(|n| NODE_FIELDS + 3 * n.node.name_changes.len())
        .max()
        .unwrap_or(NODE_FIELDS)
        .max(NODE_FIELDS);
    let pad = |used: usize| ",".repeat(width.saturating_sub(used));
    let mut out = String::new();

    for note in [
        (
            "//",
            "Open/save this file as a standard CSV: comma (,) separated, double quotes (\"\") as text delimiter.",
        ),
        ("//", "You can safely insert commas or double quotes into data fields."),
        (
            "//",
            "EXCEPTION: Don't insert a comma right after a double quote, since this terminates the field.",
        ),
        (
            "//",
            "Spreadsheets may convert three-number dates; prefix them with a single quote (').",
        ),
        ("//!", "Lines may appear in any order."),
        (
            "//!",
            "Empty lines are ignored, the first column controls the rest of the line:",
        ),
        ("//!", "# = comment, N = node, C = connector, D = domain"),
        ("//!", "SVG = SVG image to include, PNG = PNG image to include"),
    ] {
        let _ = writeln!(out, "\"{}\",\"{}\"{}", note.0, note.1, pad(2));
    }
    let _ = writeln!(out, "{}", pad(1));

    let _ = writeln!(out, "\"#\",\"Nodes\"{}", pad(2));
    let _ = writeln!(
        out,
        "\"#\",\"Name\",\"Color\",\"Parent\",\"Start\",\"Stop\",\"Icon\",\"Description\",\
         \"[Namechange\",\"When\",\"Description\",\". . . ]\"{}",
        pad(12)
    );
    for n in &layout.nodes {
        let node = &n.node;
        // Lineages alive at the end of time are written without a stop.
        let stop = if node.stop < layout.end_of_time {
            node.stop.to_string()
        } else {
            String::new()
        };
        let _ = write!(
            out,
            "\"N\",\"{}\",\"{}\",\"{}\",\"{}\",\"{stop}\",\"{}\",\"{}\"",
            node.name, node.color, node.parent_name, node.start, node.icon, node.description
        );
        for change in &node.name_changes {
            let _ = write!(
                out,
                ",\"{}\",\"{}\",\"{}\"",
                change.new_name, change.date, change.description
            );
        }
        let _ = writeln!(out, "{}", pad(NODE_FIELDS + 3 * node.name_changes.len()));
    }
    let _ = writeln!(out, "{}", pad(1));

    let _ = writeln!(out, "\"#\",\"Connectors\"{}", pad(2));
    let _ = writeln!(
        out,
        "\"#\",\"Leaving 'To When' empty will result in using 'From When' as this value\"{}",
        pad(2)
    );
    let _ = writeln!(
        out,
        "\"#\",\"From When\",\"From\",\"To When\",\"To\",\"Thickness\",\"Color\"{}",
        pad(CONNECTOR_FIELDS)
    );
    for pc in &layout.connectors {
        let c = &pc.connector;
        let to_when = if c.to_when == c.from_when {
            String::new()
        } else {
            c.to_when.to_string()
        };
        let _ = writeln!(
            out,
            "\"C\",\"{}\",\"{}\",\"{to_when}\",\"{}\",\"{}\",\"{}\"{}",
            c.from_when,
            c.from_name,
            c.to_name,
            c.thickness,
            c.color,
            pad(CONNECTOR_FIELDS)
        );
    }
    let _ = writeln!(out, "{}", pad(1));

    let _ = writeln!(out, "\"#\",\"Domains\"{}", pad(2));
    let _ = writeln!(
        out,
        "\"#\",\"Node\",\"Color\",\"Intensity\"{}",
        pad(DOMAIN_FIELDS)
    );
    for pd in &layout.domains {
        let d = &pd.domain;
        let _ = writeln!(
            out,
            "\"D\",\"{}\",\"{}\",\"{}\"{}",
            d.node_name,
            d.color,
            d.intensity,
            pad(DOMAIN_FIELDS)
        );
    }
    let _ = writeln!(out, "{}", pad(1));

    let _ = writeln!(out, "\"#\",\"Images\"{}", pad(2));
    let _ = writeln!(
        out,
        "\"#\",\"File Path\",\"x Position\",\"y Position\"{}",
        pad(IMAGE_FIELDS)
    );
    for img in &layout.images {
        let kind = match img.kind {
            ImageKind::Svg => "SVG",
            ImageKind::Png => "PNG",
        };
        let _ = writeln!(
            out,
            "\"{kind}\",\"{}\",\"{}\",\"{}\"{}",
            img.path,
            img.x,
            img.y,
            pad(IMAGE_FIELDS)
        );
    }
    out
}
