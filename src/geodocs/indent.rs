//! Best-effort pretty printing of XML documents before they are stored.
//!
//! Indentation is cosmetic: anything that does not parse as a well-formed XML
//! document comes back unchanged.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use tracing::debug;

const INDENT_WIDTH: usize = 2;

/// Reformat `content` with two-space indentation, or `None` if it is not well-formed XML.
pub fn indent(content: &str) -> Option<String> {
    if let Err(e) = crate::xml::parse(content) {
        debug!(error = %e, "content is not well-formed XML, skipping indentation");
        return None;
    }

    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => {
                if let Err(e) = writer.write_event(event) {
                    debug!(error = %e, "failed to write indented XML");
                    return None;
                }
            }
            Err(e) => {
                debug!(error = %e, "failed to re-read XML for indentation");
                return None;
            }
        }
    }

    let mut out = String::from_utf8(writer.into_inner()).ok()?;
    out.push('\n');
    Some(out)
}

/// Indented content, or the original when indentation is not possible.
pub fn indent_or_raw(content: &str) -> String {
    indent(content).unwrap_or_else(|| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_nested_elements() {
        let out = indent("<root><a>1</a><b/></root>").unwrap();
        assert_eq!(out, "<root>\n  <a>1</a>\n  <b/>\n</root>\n");
    }

    #[test]
    fn keeps_declaration_and_attributes() {
        let out = indent(r#"<?xml version="1.0" encoding="UTF-8"?><c x="1"><d y="a &amp; b"/></c>"#)
            .unwrap();
        assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(out.contains(r#"<d y="a &amp; b"/>"#));
    }

    #[test]
    fn reindenting_is_stable() {
        let once = indent("<root>\n\n   <a>1</a>   <b>two</b></root>").unwrap();
        let twice = indent(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_content_is_returned_unchanged() {
        let raw = "<root><a></root>";
        assert!(indent(raw).is_none());
        assert_eq!(indent_or_raw(raw), raw);
    }

    #[test]
    fn non_xml_is_returned_unchanged() {
        let raw = "name,lat,lon\nHQ,45.1,5.7\n";
        assert_eq!(indent_or_raw(raw), raw);
    }
}
