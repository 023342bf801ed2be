use crate::error::Result;
use timeclad_layout::Layout;

/// Pretty-printed JSON of the computed layout: lanes, spans, time bounds and warnings.
pub fn render_json(layout: &Layout) -> Result<String> {
    let mut text = serde_json::to_string_pretty(layout)?;
    text.push('\n');
    Ok(text)
}
