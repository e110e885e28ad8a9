//! Keyhole Markup Language documents (`kml` root).

use super::{
    extract_from_root, file_stem, DocumentFormat, FieldExtractor, PostLoadHook, PreSaveHook,
    SchemaCheck,
};
use crate::error::Result;
use crate::model::{FieldMap, LoadedDocument};
use crate::xml::{count_descendants, parse, path_text};
use serde_json::json;
use std::io::Read;

pub struct Kml {
    schema: SchemaCheck,
}

impl Kml {
    pub fn new(schema: SchemaCheck) -> Self {
        Self { schema }
    }
}

/// `Document/name`, falling back to a top-level `Folder/name`.
fn document_name(root: roxmltree::Node<'_, '_>) -> Option<String> {
    path_text(root, &["Document", "name"]).or_else(|| path_text(root, &["Folder", "name"]))
}

impl DocumentFormat for Kml {
    fn extension(&self) -> &str {
        ".kml"
    }

    fn mime_type(&self) -> &str {
        "application/vnd.google-earth.kml+xml"
    }
}

impl PreSaveHook for Kml {
    fn pre_save(&self, content: &str) -> Result<()> {
        self.schema.run(content)
    }
}

impl PostLoadHook for Kml {
    fn post_load(&self, doc: &mut LoadedDocument) -> Result<()> {
        let name = match parse(&doc.content) {
            Ok(parsed) => document_name(parsed.root_element()),
            Err(_) => None,
        };
        if let Some(name) = name.map(|n| file_stem(&n)).filter(|n| !n.is_empty()) {
            doc.name = format!("{}{}", name, self.extension());
        }
        Ok(())
    }
}

impl FieldExtractor for Kml {
    fn extract_fields(&self, raw: &mut dyn Read) -> Result<FieldMap> {
        extract_from_root(raw, "kml", |root| {
            let mut fields = FieldMap::new();
            if let Some(title) = document_name(root) {
                fields.insert("title".into(), json!(title));
            }
            fields.insert(
                "placemark_count".into(),
                json!(count_descendants(root, "Placemark")),
            );
            fields
        })
    }
}
