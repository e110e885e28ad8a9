//! OGC Web Map Context documents (`ViewContext` root).

use super::{
    extract_from_root, DocumentFormat, FieldExtractor, PostLoadHook, PreSaveHook, SchemaCheck,
};
use crate::error::Result;
use crate::model::FieldMap;
use crate::xml::{count_descendants, path, path_text};
use serde_json::json;
use std::io::Read;

pub struct Wmc {
    schema: SchemaCheck,
}

impl Wmc {
    pub fn new(schema: SchemaCheck) -> Self {
        Self { schema }
    }
}

impl DocumentFormat for Wmc {
    fn extension(&self) -> &str {
        ".wmc"
    }

    fn mime_type(&self) -> &str {
        "application/vnd.ogc.context+xml"
    }
}

impl PreSaveHook for Wmc {
    fn pre_save(&self, content: &str) -> Result<()> {
        self.schema.run(content)
    }
}

impl PostLoadHook for Wmc {}

impl FieldExtractor for Wmc {
    fn extract_fields(&self, raw: &mut dyn Read) -> Result<FieldMap> {
        extract_from_root(raw, "ViewContext", |root| {
            let mut fields = FieldMap::new();
            if let Some(title) = path_text(root, &["General", "Title"]) {
                fields.insert("title".into(), json!(title));
            }
            if let Some(abstract_) = path_text(root, &["General", "Abstract"]) {
                fields.insert("abstract".into(), json!(abstract_));
            }
            let bbox = path(root, &["General", "BoundingBox"]);
            if let Some(srs) = bbox.and_then(|b| b.attribute("SRS")) {
                fields.insert("srs".into(), json!(srs));
            }
            let layers = path(root, &["LayerList"])
                .map(|list| count_descendants(list, "Layer"))
                .unwrap_or(0);
            fields.insert("layer_count".into(), json!(layers));
            fields
        })
    }
}
