//! # Document Formats
//!
//! Each supported document standard is a [`DocumentFormat`]: a file extension, a
//! MIME type, and three hooks the store calls around its operations.
//!
//! - [`PreSaveHook`]: runs on the (indented) content before it is persisted.
//!   Failing aborts the save.
//! - [`PostLoadHook`]: runs on a freshly loaded document, e.g. to derive a
//!   friendlier name from its content.
//! - [`FieldExtractor`]: parses stored content into the extra fields shown in
//!   listings. Failing only drops that entry from the listing.
//!
//! All hooks have no-op defaults. Formats are looked up by tag (the extension
//! without its leading dot) through a [`FormatRegistry`].

use crate::error::{GeodocError, Result};
use crate::model::{FieldMap, LoadedDocument};
use crate::schema::SchemaValidator;
use roxmltree::Node;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

pub mod gpx;
pub mod kml;
pub mod sld;
pub mod wmc;

pub trait PreSaveHook {
    fn pre_save(&self, _content: &str) -> Result<()> {
        Ok(())
    }
}

pub trait PostLoadHook {
    fn post_load(&self, _doc: &mut LoadedDocument) -> Result<()> {
        Ok(())
    }
}

pub trait FieldExtractor {
    fn extract_fields(&self, _raw: &mut dyn Read) -> Result<FieldMap> {
        Ok(FieldMap::new())
    }
}

pub trait DocumentFormat: PreSaveHook + PostLoadHook + FieldExtractor + Send + Sync {
    /// File extension including the leading dot, e.g. `.wmc`.
    fn extension(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Standard tag stored alongside each record: the extension without its dot.
    fn tag(&self) -> &str {
        let ext = self.extension();
        ext.strip_prefix('.').unwrap_or(ext)
    }
}

/// Schema validation settings shared by the XML formats.
#[derive(Clone)]
pub struct SchemaCheck {
    pub validator: Arc<SchemaValidator>,
    pub location: Option<String>,
}

impl SchemaCheck {
    pub fn new(validator: Arc<SchemaValidator>, location: Option<String>) -> Self {
        Self {
            validator,
            location,
        }
    }

    /// Validate when a schema location is configured; accept everything otherwise.
    pub fn run(&self, content: &str) -> Result<()> {
        match &self.location {
            Some(location) => self.validator.validate(content, location),
            None => Ok(()),
        }
    }
}

/// Read an extractor's input, check its root element and hand the root to `extract`.
pub(crate) fn extract_from_root<F>(
    raw: &mut dyn Read,
    expected_root: &str,
    extract: F,
) -> Result<FieldMap>
where
    F: FnOnce(Node<'_, '_>) -> FieldMap,
{
    let mut text = String::new();
    raw.read_to_string(&mut text)?;
    let doc = crate::xml::parse(&text)
        .map_err(|e| GeodocError::Invalid(format!("document is not well-formed: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != expected_root {
        return Err(GeodocError::Invalid(format!(
            "expected root element '{}', found '{}'",
            expected_root,
            root.tag_name().name()
        )));
    }
    Ok(extract(root))
}

/// File-name friendly form of a document title.
pub(crate) fn file_stem(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Box<dyn DocumentFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format, validating against `schemas`.
    pub fn builtin(validator: Arc<SchemaValidator>, schemas: &SchemaLocations) -> Self {
        let check =
            |location: &Option<String>| SchemaCheck::new(validator.clone(), location.clone());
        let mut registry = Self::new();
        registry.register(Box::new(wmc::Wmc::new(check(&schemas.wmc))));
        registry.register(Box::new(sld::Sld::new(check(&schemas.sld))));
        registry.register(Box::new(kml::Kml::new(check(&schemas.kml))));
        registry.register(Box::new(gpx::Gpx::new(check(&schemas.gpx))));
        registry
    }

    pub fn register(&mut self, format: Box<dyn DocumentFormat>) {
        self.formats.insert(format.tag().to_string(), format);
    }

    pub fn get(&self, tag: &str) -> Result<&dyn DocumentFormat> {
        let tag = tag.strip_prefix('.').unwrap_or(tag);
        self.formats
            .get(tag)
            .map(|f| f.as_ref())
            .ok_or_else(|| GeodocError::UnknownFormat(tag.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DocumentFormat> {
        self.formats.values().map(|f| f.as_ref())
    }
}

/// Schema location per built-in format; `None` disables validation for that format.
#[derive(Debug, Clone, Default)]
pub struct SchemaLocations {
    pub wmc: Option<String>,
    pub sld: Option<String>,
    pub kml: Option<String>,
    pub gpx: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidatorOptions;

    fn registry() -> FormatRegistry {
        let validator = Arc::new(SchemaValidator::new(ValidatorOptions::default()).unwrap());
        FormatRegistry::builtin(validator, &SchemaLocations::default())
    }

    #[test]
    fn lookup_by_tag_or_extension() {
        let registry = registry();
        assert_eq!(registry.get("wmc").unwrap().extension(), ".wmc");
        assert_eq!(registry.get(".kml").unwrap().tag(), "kml");
    }

    #[test]
    fn unknown_tag_fails() {
        assert!(matches!(
            registry().get("shp"),
            Err(GeodocError::UnknownFormat(_))
        ));
    }

    #[test]
    fn builtin_tags_are_sorted() {
        let registry = registry();
        let tags: Vec<&str> = registry.iter().map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["gpx", "kml", "sld", "wmc"]);
    }

    #[test]
    fn unconfigured_schema_accepts_anything() {
        let validator = Arc::new(SchemaValidator::new(ValidatorOptions::default()).unwrap());
        let check = SchemaCheck::new(validator, None);
        assert!(check.run("not even xml").is_ok());
    }

    #[test]
    fn extraction_rejects_other_roots() {
        let mut raw = "<kml/>".as_bytes();
        assert!(matches!(
            extract_from_root(&mut raw, "gpx", |_| FieldMap::new()),
            Err(GeodocError::Invalid(_))
        ));
    }

    #[test]
    fn extraction_rejects_non_xml() {
        let mut raw = "title: nope".as_bytes();
        assert!(extract_from_root(&mut raw, "gpx", |_| FieldMap::new()).is_err());
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem(" Hiking / day 2 "), "Hiking___day_2");
    }
}
