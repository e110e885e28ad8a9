//! Small helpers over `roxmltree` shared by the indenter, validator and formats.

use roxmltree::{Document, Node, ParsingOptions};

pub fn parse(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// First element child whose local name is `name`.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Follow a path of local names from `node`, taking the first match at each step.
pub fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().try_fold(node, |current, name| child(current, name))
}

/// Trimmed text of the element at `names` under `node`, if present and non-empty.
pub fn path_text(node: Node<'_, '_>, names: &[&str]) -> Option<String> {
    let text = path(node, names)?.text()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Number of descendant elements (including `node` itself) named `name`.
pub fn count_descendants(node: Node<'_, '_>, name: &str) -> usize {
    node.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2">
        <Document><name> Trails </name><Placemark/><Folder><Placemark/></Folder></Document>
    </kml>"#;

    #[test]
    fn path_text_ignores_namespace_and_trims() {
        let doc = parse(DOC).unwrap();
        assert_eq!(
            path_text(doc.root_element(), &["Document", "name"]),
            Some("Trails".to_string())
        );
    }

    #[test]
    fn missing_path_is_none() {
        let doc = parse(DOC).unwrap();
        assert!(path(doc.root_element(), &["Document", "description"]).is_none());
    }

    #[test]
    fn counts_nested_descendants() {
        let doc = parse(DOC).unwrap();
        assert_eq!(count_descendants(doc.root_element(), "Placemark"), 2);
    }

    #[test]
    fn doctype_is_accepted() {
        let text = r#"<?xml version="1.0"?><!DOCTYPE note [<!ELEMENT note (#PCDATA)>]><note>x</note>"#;
        assert!(parse(text).is_ok());
    }
}
