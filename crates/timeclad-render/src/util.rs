use std::fmt::Write as _;

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        out.push_str(&text[start..i]);
        out.push_str(esc);
        start = i + 1;
    }
    out.push_str(&text[start..]);
}

/// Turns a node name into an XML id fragment.
///
/// ASCII letters, digits and `-` are kept, a space becomes `__`, and every other byte becomes
/// `_` followed by its three-digit decimal code, so distinct names keep distinct ids.
pub(crate) fn xml_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => out.push(b as char),
            b' ' => out.push_str("__"),
            _ => {
                let _ = write!(out, "_{b:03}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_only_keep_safe_characters() {
        assert_eq!(xml_id("Debian"), "Debian");
        assert_eq!(xml_id("Red Hat"), "Red__Hat");
        assert_eq!(xml_id("a_b"), "a_095b");
        assert_eq!(xml_id("x.y/z"), "x_046y_047z");
        assert_ne!(xml_id("a b"), xml_id("a__b"));
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_xml("R&D <\"x\">"), "R&amp;D &lt;&quot;x&quot;&gt;");
        assert_eq!(escape_xml("plain"), "plain");
    }
}
