//! The comma separated record format.
//!
//! Each row starts with a kind column:
//!
//! ```text
//! N,name,color,parent,start,stop,icon,description[,newName,date,description]...
//! C,fromWhen,from,toWhen,to,thickness,color
//! D,node,color,intensity
//! SVG,file,x,y
//! PNG,file,x,y
//! ```
//!
//! Empty rows and rows whose first column starts with `#` or `//` are comments.

use crate::color::Color;
use crate::date::Date;
use crate::error::{Error, Result};
use crate::model::{Cladogram, Connector, Domain, Image, ImageKind, Node};
use std::path::Path;

const NODE_FIELDS: usize = 8;
const CONNECTOR_FIELDS: usize = 7;
const DOMAIN_FIELDS: usize = 4;
const IMAGE_FIELDS: usize = 4;

/// Splits `line` at `delimiter`, except inside `toggle`-quoted runs.
///
/// A quote only closes a run when it is directly followed by the delimiter, so quotes inside
/// a field survive: `abc|*de*f|ghi*|jkl` splits into `abc`, `*de*f|ghi*` and `jkl`.
pub fn explode_safely(line: &str, delimiter: char, toggle: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == toggle {
            quoted = !(chars.peek() == Some(&delimiter));
        }
        if c == delimiter && !quoted {
            out.push(std::mem::take(&mut buf));
        } else {
            buf.push(c);
        }
    }
    if !buf.is_empty() || line.ends_with(delimiter) {
        out.push(buf);
    }
    out
}

fn unquote(field: &str) -> String {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field).to_string()
}

/// Reads a CSV file; icon and image paths resolve against its folder.
pub fn read_csv(path: &Path) -> Result<Cladogram> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_csv(&text, path.parent())
}

pub fn parse_csv(text: &str, base_dir: Option<&Path>) -> Result<Cladogram> {
    let mut clad = Cladogram::new();
    clad.base_dir = base_dir.map(Path::to_path_buf);

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        let fields: Vec<String> = explode_safely(line, ',', '"')
            .iter()
            .map(|f| unquote(f))
            .collect();
        let Some(kind) = fields.first().map(String::as_str) else {
            continue;
        };
        if kind.is_empty() || kind.starts_with('#') || kind.starts_with("//") {
            continue;
        }

        let what = match kind {
            "N" => format!("node {}", field(&fields, 1)),
            "C" => format!("connector at {}", field(&fields, 1)),
            "D" => format!("domain of {}", field(&fields, 1)),
            "SVG" | "PNG" => format!("{kind} include {}", field(&fields, 1)),
            other => other.to_string(),
        };
        let fail = |message: String| Error::InvalidRecord {
            line: line_no,
            what: what.clone(),
            message,
        };

        match kind {
            "N" => {
                let node = parse_node(&fields).map_err(fail)?;
                clad.nodes.push(node);
            }
            "C" => {
                let connector = parse_connector(&fields).map_err(fail)?;
                clad.connectors.push(connector);
            }
            "D" => {
                let domain = parse_domain(&fields).map_err(fail)?;
                clad.domains.push(domain);
            }
            "SVG" | "PNG" => {
                let kind = if kind == "SVG" {
                    ImageKind::Svg
                } else {
                    ImageKind::Png
                };
                let image = parse_image(kind, &fields).map_err(fail)?;
                clad.images.push(image);
            }
            _ => return Err(fail("unknown record kind".to_string())),
        }
    }

    tracing::debug!(
        nodes = clad.nodes.len(),
        connectors = clad.connectors.len(),
        domains = clad.domains.len(),
        images = clad.images.len(),
        "parsed CSV input"
    );
    Ok(clad)
}

fn field(fields: &[String], i: usize) -> &str {
    fields.get(i).map(String::as_str).unwrap_or("")
}

fn require(fields: &[String], count: usize) -> std::result::Result<(), String> {
    if fields.len() < count {
        return Err(format!("expected {count} fields, found {}", fields.len()));
    }
    Ok(())
}

fn date(raw: &str) -> std::result::Result<Date, String> {
    raw.parse().map_err(|e: Error| e.to_string())
}

fn color(raw: &str) -> std::result::Result<Color, String> {
    if raw.trim().is_empty() {
        return Ok(Color::default());
    }
    raw.parse().map_err(|e: Error| e.to_string())
}

fn int_or(raw: &str, default: i32) -> std::result::Result<i32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse()
        .map_err(|_| format!("`{raw}` is not an integer"))
}

fn parse_node(fields: &[String]) -> std::result::Result<Node, String> {
    require(fields, NODE_FIELDS)?;
    let mut node = Node::new(field(fields, 1));
    node.color = color(field(fields, 2))?;
    node.parent_name = field(fields, 3).to_string();
    node.start = date(field(fields, 4))?;
    node.stop = date(field(fields, 5))?;
    node.icon = field(fields, 6).to_string();
    node.description = field(fields, 7).to_string();

    for change in fields[NODE_FIELDS..].chunks(3) {
        let new_name = field(change, 0);
        let when = field(change, 1);
        if new_name.is_empty() || when.is_empty() {
            continue;
        }
        node.add_name_change(
            new_name.to_string(),
            date(when)?,
            field(change, 2).to_string(),
        );
    }
    Ok(node)
}

fn parse_connector(fields: &[String]) -> std::result::Result<Connector, String> {
    require(fields, CONNECTOR_FIELDS)?;
    let from_when = date(field(fields, 1))?;
    let to_when = match field(fields, 3) {
        "" => from_when,
        raw => date(raw)?,
    };
    let mut connector = Connector::new(field(fields, 2), from_when, field(fields, 4), to_when);
    connector.thickness = int_or(field(fields, 5), 1)?;
    connector.color = color(field(fields, 6))?;
    Ok(connector)
}

fn parse_domain(fields: &[String]) -> std::result::Result<Domain, String> {
    require(fields, DOMAIN_FIELDS)?;
    let mut domain = Domain::new(field(fields, 1), color(field(fields, 2))?);
    domain.intensity = int_or(field(fields, 3), 50)?;
    Ok(domain)
}

fn parse_image(kind: ImageKind, fields: &[String]) -> std::result::Result<Image, String> {
    require(fields, IMAGE_FIELDS)?;
    Ok(Image {
        kind,
        path: field(fields, 1).to_string(),
        x: int_or(field(fields, 2), 0)?,
        y: int_or(field(fields, 3), 0)?,
    })
}
