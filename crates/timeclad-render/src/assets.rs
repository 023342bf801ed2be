//! External images referenced by records: node icons and included pictures.

use crate::error::{Error, Result};
use base64::Engine as _;
use std::path::{Path, PathBuf};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Splices of an SVG file: what goes into our `<defs>` and what gets drawn.
#[derive(Debug, Clone, Default)]
pub(crate) struct SvgAsset {
    pub defs: String,
    pub body: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct PngAsset {
    pub base64: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone)]
pub(crate) enum Asset {
    Svg(SvgAsset),
    Png(PngAsset),
}

impl Asset {
    pub(crate) fn size(&self) -> (i32, i32) {
        match self {
            Asset::Svg(svg) => (svg.width, svg.height),
            Asset::Png(png) => (png.width, png.height),
        }
    }
}

pub(crate) fn resolve(base_dir: Option<&Path>, file: &str) -> PathBuf {
    let path = Path::new(file);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Loads an icon, picking the decoder from the file extension.
pub(crate) fn load_icon(base_dir: Option<&Path>, file: &str) -> Result<Asset> {
    let path = resolve(base_dir, file);
    let format = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match format.as_str() {
        "svg" => Ok(Asset::Svg(load_svg(&path)?)),
        "png" => Ok(Asset::Png(load_png(&path)?)),
        _ => Err(Error::UnsupportedIcon {
            path: path.display().to_string(),
            format,
        }),
    }
}

pub(crate) fn load_svg(path: &Path) -> Result<SvgAsset> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Asset {
        path: path.display().to_string(),
        source,
    })?;
    parse_svg(&path.display().to_string(), &text)
}

pub(crate) fn load_png(path: &Path) -> Result<PngAsset> {
    let bytes = std::fs::read(path).map_err(|source| Error::Asset {
        path: path.display().to_string(),
        source,
    })?;
    parse_png(&path.display().to_string(), &bytes)
}

pub(crate) fn parse_svg(path: &str, text: &str) -> Result<SvgAsset> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, opts).map_err(|e| {
        Error::InvalidSvg {
            path: path.to_string(),
            message: e.to_string(),
        }
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(Error::InvalidSvg {
            path: path.to_string(),
            message: format!("root element is <{}>", root.tag_name().name()),
        });
    }

    let mut asset = SvgAsset {
        width: root.attribute("width").map(leading_number).unwrap_or(0),
        height: root.attribute("height").map(leading_number).unwrap_or(0),
        ..Default::default()
    };

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "defs" => {
                if let (Some(first), Some(last)) = (child.first_child(), child.last_child()) {
                    asset
                        .defs
                        .push_str(&text[first.range().start..last.range().end]);
                    asset.defs.push('\n');
                }
            }
            // Editor state, never drawn.
            "metadata" | "namedview" => {}
            _ => {
                asset.body.push_str(&text[child.range()]);
                asset.body.push('\n');
            }
        }
    }
    Ok(asset)
}

/// Encodes a PNG file and reads its size from the IHDR chunk.
pub(crate) fn parse_png(path: &str, bytes: &[u8]) -> Result<PngAsset> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return Err(Error::InvalidPng {
            path: path.to_string(),
        });
    }
    let dim = |at: usize| {
        let raw = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        i32::try_from(raw).map_err(|_| Error::InvalidPng {
            path: path.to_string(),
        })
    };
    Ok(PngAsset {
        base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        width: dim(16)?,
        height: dim(20)?,
    })
}

/// `"48px"` -> 48, `"12.5"` -> 12.
fn leading_number(raw: &str) -> i32 {
    let raw = raw.trim();
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    raw[..end].parse::<f64>().map(|v| v as i32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    #[test]
    fn png_size_comes_from_ihdr() {
        let png = parse_png("icon.png", &png_header(300, 17)).unwrap();
        assert_eq!((png.width, png.height), (300, 17));
        assert!(png.base64.starts_with("iVBORw0KGgo"));
    }

    #[test]
    fn non_png_bytes_are_rejected() {
        let err = parse_png("icon.png", b"GIF89a not a png at all....").unwrap_err();
        assert!(matches!(err, Error::InvalidPng { .. }));
    }

    #[test]
    fn svg_is_split_into_defs_and_body() {
        let text = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="32px" height="24">
  <defs><linearGradient id="g"/></defs>
  <metadata>ignored</metadata>
  <rect width="32" height="24" fill="url(#g)"/>
  <circle r="3"/>
</svg>"#;
        let svg = parse_svg("icon.svg", text).unwrap();
        assert_eq!((svg.width, svg.height), (32, 24));
        assert_eq!(svg.defs.trim(), r#"<linearGradient id="g"/>"#);
        assert!(svg.body.contains("<rect"));
        assert!(svg.body.contains("<circle"));
        assert!(!svg.body.contains("ignored"));
    }

    #[test]
    fn unknown_icon_formats_are_refused() {
        let err = load_icon(None, "icon.gif").unwrap_err();
        assert!(matches!(err, Error::UnsupportedIcon { ref format, .. } if format == "gif"));
    }
}
