//! Styled Layer Descriptor documents (`StyledLayerDescriptor` root), SLD 1.0 and 1.1.

use super::{
    extract_from_root, DocumentFormat, FieldExtractor, PostLoadHook, PreSaveHook, SchemaCheck,
};
use crate::error::Result;
use crate::model::FieldMap;
use crate::xml::path_text;
use serde_json::json;
use std::io::Read;

pub struct Sld {
    schema: SchemaCheck,
}

impl Sld {
    pub fn new(schema: SchemaCheck) -> Self {
        Self { schema }
    }
}

impl DocumentFormat for Sld {
    fn extension(&self) -> &str {
        ".sld"
    }

    fn mime_type(&self) -> &str {
        "application/vnd.ogc.sld+xml"
    }
}

impl PreSaveHook for Sld {
    fn pre_save(&self, content: &str) -> Result<()> {
        self.schema.run(content)
    }
}

impl PostLoadHook for Sld {}

impl FieldExtractor for Sld {
    fn extract_fields(&self, raw: &mut dyn Read) -> Result<FieldMap> {
        extract_from_root(raw, "StyledLayerDescriptor", |root| {
            let mut fields = FieldMap::new();
            let layer = ["NamedLayer", "UserLayer"]
                .iter()
                .find_map(|kind| path_text(root, &[*kind, "Name"]));
            if let Some(layer) = layer {
                fields.insert("layer".into(), json!(layer));
            }
            // 1.0 titles the style, 1.1 moves it under Description
            let title = [
                &["NamedLayer", "UserStyle", "Title"][..],
                &["NamedLayer", "UserStyle", "Description", "Title"][..],
                &["UserLayer", "UserStyle", "Title"][..],
                &["UserLayer", "UserStyle", "Description", "Title"][..],
            ]
            .iter()
            .find_map(|names| path_text(root, names));
            if let Some(title) = title {
                fields.insert("title".into(), json!(title));
            }
            fields
        })
    }
}
