//! GPS Exchange Format documents (`gpx` root).

use super::{
    extract_from_root, file_stem, DocumentFormat, FieldExtractor, PostLoadHook, PreSaveHook,
    SchemaCheck,
};
use crate::error::Result;
use crate::model::{FieldMap, LoadedDocument};
use crate::xml::{child, count_descendants, parse, path_text};
use serde_json::json;
use std::io::Read;

pub struct Gpx {
    schema: SchemaCheck,
}

impl Gpx {
    pub fn new(schema: SchemaCheck) -> Self {
        Self { schema }
    }
}

/// GPX 1.1 keeps the name under `metadata`; 1.0 has it on the root.
fn metadata_name(root: roxmltree::Node<'_, '_>) -> Option<String> {
    path_text(root, &["metadata", "name"]).or_else(|| {
        child(root, "name")
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

impl DocumentFormat for Gpx {
    fn extension(&self) -> &str {
        ".gpx"
    }

    fn mime_type(&self) -> &str {
        "application/gpx+xml"
    }
}

impl PreSaveHook for Gpx {
    fn pre_save(&self, content: &str) -> Result<()> {
        self.schema.run(content)
    }
}

impl PostLoadHook for Gpx {
    fn post_load(&self, doc: &mut LoadedDocument) -> Result<()> {
        let name = match parse(&doc.content) {
            Ok(parsed) => metadata_name(parsed.root_element()),
            Err(_) => None,
        };
        if let Some(name) = name.map(|n| file_stem(&n)).filter(|n| !n.is_empty()) {
            doc.name = format!("{}{}", name, self.extension());
        }
        Ok(())
    }
}

impl FieldExtractor for Gpx {
    fn extract_fields(&self, raw: &mut dyn Read) -> Result<FieldMap> {
        extract_from_root(raw, "gpx", |root| {
            let mut fields = FieldMap::new();
            if let Some(title) = metadata_name(root) {
                fields.insert("title".into(), json!(title));
            }
            let waypoints = root
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "wpt")
                .count();
            fields.insert("waypoint_count".into(), json!(waypoints));
            fields.insert("track_count".into(), json!(count_descendants(root, "trk")));
            fields
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaValidator, ValidatorOptions};
    use std::sync::Arc;

    const RIDE: &str = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="test">
  <metadata><name>Morning ride</name></metadata>
  <wpt lat="45.1" lon="5.7"><name>Bridge</name></wpt>
  <wpt lat="45.2" lon="5.8"><name>Cafe</name></wpt>
  <trk><name>Loop</name><trkseg><trkpt lat="45.1" lon="5.7"/></trkseg></trk>
</gpx>"#;

    fn gpx() -> Gpx {
        let validator = Arc::new(SchemaValidator::new(ValidatorOptions::default()).unwrap());
        Gpx::new(SchemaCheck::new(validator, None))
    }

    #[test]
    fn extracts_counts_and_title() {
        let fields = gpx().extract_fields(&mut RIDE.as_bytes()).unwrap();
        assert_eq!(fields["title"], json!("Morning ride"));
        assert_eq!(fields["waypoint_count"], json!(2));
        assert_eq!(fields["track_count"], json!(1));
    }

    #[test]
    fn gpx_1_0_name_on_root() {
        let doc = r#"<gpx version="1.0"><name>Old trip</name></gpx>"#;
        let fields = gpx().extract_fields(&mut doc.as_bytes()).unwrap();
        assert_eq!(fields["title"], json!("Old trip"));
        assert_eq!(fields["track_count"], json!(0));
    }

    #[test]
    fn post_load_names_after_metadata() {
        let mut doc = LoadedDocument {
            name: "ride.gpx".into(),
            content: RIDE.into(),
            standard: "gpx".into(),
            mime_type: "application/gpx+xml".into(),
        };
        gpx().post_load(&mut doc).unwrap();
        assert_eq!(doc.name(), "Morning_ride.gpx");
    }

    #[test]
    fn kml_is_not_gpx() {
        assert!(gpx().extract_fields(&mut "<kml/>".as_bytes()).is_err());
    }
}
