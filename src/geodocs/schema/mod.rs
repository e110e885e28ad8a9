//! # Schema Validation
//!
//! [`SchemaValidator`] checks document content against an XML Schema fetched
//! from a location: an `http(s)://` URL, a `file://` URL or a plain path.
//!
//! ## Verdicts
//!
//! - `Ok(())`: the document conforms.
//! - [`GeodocError::Invalid`]: the document is malformed or breaks the schema.
//!   Client-visible (unsupported media type).
//! - [`GeodocError::SchemaUnavailable`]: the schema could not be fetched or
//!   compiled. Server-side, logged; says nothing about the document.
//!
//! ## Caching
//!
//! Compiled schemas are kept in memory per location for `cache_ttl`. A schema
//! changed at its source is therefore picked up at most `cache_ttl` later. A
//! zero TTL fetches on every call.
//!
//! ## Supported subset
//!
//! See [`check`] for matching rules. Element, attribute and type
//! declarations, model groups, wildcards, derivations, list and union types,
//! all facets, `xsi:type`, `xsi:nil` and identity constraints are checked.
//! Content from imported namespaces is accepted as is. A schema using a
//! construct outside this subset (`xs:redefine`, assertions, Unicode block
//! escapes in patterns) is reported as [`GeodocError::SchemaUnavailable`]
//! rather than applied partially.

pub mod check;
pub mod compile;
pub mod identity;
pub mod lexical;
pub mod model;

use crate::error::{GeodocError, Result};
use compile::SchemaCompiler;
use model::Schema;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct ValidatorOptions {
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

struct CachedSchema {
    schema: Arc<Schema>,
    fetched_at: Instant,
}

pub struct SchemaValidator {
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<String, CachedSchema>>,
    cache_ttl: Duration,
}

impl SchemaValidator {
    pub fn new(options: ValidatorOptions) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.fetch_timeout)
            .build()
            .map_err(|e| GeodocError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: options.cache_ttl,
        })
    }

    /// Validate `content` against the schema at `location`.
    pub fn validate(&self, content: &str, location: &str) -> Result<()> {
        let schema = self.schema(location).inspect_err(|e| {
            error!(location, error = %e, "error while checking validity of the document");
        })?;

        let doc = crate::xml::parse(content)
            .map_err(|e| GeodocError::Invalid(format!("document is not well-formed: {}", e)))?;
        check::Checker::new(&schema)
            .check_document(&doc)
            .map_err(GeodocError::Invalid)
    }

    /// Compiled schema for `location`, from cache when fresh.
    pub fn schema(&self, location: &str) -> Result<Arc<Schema>> {
        if !self.cache_ttl.is_zero() {
            let cache = self.cache.lock();
            if let Some(cached) = cache.get(location) {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    debug!(location, "schema cache hit");
                    return Ok(Arc::clone(&cached.schema));
                }
            }
        }

        let text = self.fetch(location)?;
        let loader = |loc: &str| self.fetch(loc);
        let compiled = SchemaCompiler::new(&loader, resolve_location).compile(location, &text)?;
        let schema = Arc::new(compiled);

        if !self.cache_ttl.is_zero() {
            self.cache.lock().insert(
                location.to_string(),
                CachedSchema {
                    schema: Arc::clone(&schema),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(schema)
    }

    #[cfg(test)]
    fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn fetch(&self, location: &str) -> Result<String> {
        debug!(location, "fetching schema");
        let unavailable = |reason: String| GeodocError::SchemaUnavailable {
            location: location.to_string(),
            reason,
        };

        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self
                .client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.text())
                .map_err(|e| unavailable(e.to_string())),
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| unavailable("invalid file URL".to_string()))?;
                std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))
            }
            _ => std::fs::read_to_string(location).map_err(|e| unavailable(e.to_string())),
        }
    }
}

/// Resolve `relative` against the location of the schema that references it.
pub fn resolve_location(base: &str, relative: &str) -> String {
    if Url::parse(relative).is_ok() || Path::new(relative).is_absolute() {
        return relative.to_string();
    }
    match Url::parse(base) {
        Ok(url) if url.scheme().len() > 1 => url
            .join(relative)
            .map(String::from)
            .unwrap_or_else(|_| relative.to_string()),
        _ => Path::new(base)
            .parent()
            .map(|dir| dir.join(relative))
            .unwrap_or_else(|| PathBuf::from(relative))
            .to_string_lossy()
            .into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONTEXT_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:ctx="http://www.opengis.net/context"
           targetNamespace="http://www.opengis.net/context"
           elementFormDefault="qualified">
  <xs:include schemaLocation="general.xsd"/>
  <xs:element name="ViewContext" type="ctx:ViewContextType"/>
  <xs:complexType name="ViewContextType">
    <xs:sequence>
      <xs:element name="General" type="ctx:GeneralType"/>
      <xs:element name="LayerList" minOccurs="0">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Layer" maxOccurs="unbounded">
              <xs:complexType>
                <xs:sequence>
                  <xs:element name="Name" type="xs:string"/>
                </xs:sequence>
                <xs:attribute name="queryable" type="xs:boolean" use="required"/>
                <xs:attribute name="hidden" type="xs:boolean"/>
              </xs:complexType>
            </xs:element>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:sequence>
    <xs:attribute name="version" type="ctx:VersionType" use="required"/>
    <xs:attribute name="id" type="xs:string" use="required"/>
  </xs:complexType>
  <xs:simpleType name="VersionType">
    <xs:restriction base="xs:string">
      <xs:enumeration value="1.0.0"/>
      <xs:enumeration value="1.1.0"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    const GENERAL_XSD: &str = r###"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:ctx="http://www.opengis.net/context"
           targetNamespace="http://www.opengis.net/context"
           elementFormDefault="qualified">
  <xs:complexType name="GeneralType">
    <xs:sequence>
      <xs:element name="Title" type="xs:string"/>
      <xs:element name="Abstract" type="xs:string" minOccurs="0"/>
      <xs:any namespace="##other" minOccurs="0" maxOccurs="unbounded" processContents="lax"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"###;

    fn fixture() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("context.xsd"), CONTEXT_XSD).unwrap();
        fs::write(dir.path().join("general.xsd"), GENERAL_XSD).unwrap();
        let location = dir.path().join("context.xsd").to_string_lossy().into_owned();
        (dir, location)
    }

    fn validator() -> SchemaValidator {
        SchemaValidator::new(ValidatorOptions::default()).unwrap()
    }

    const VALID: &str = r#"<ViewContext xmlns="http://www.opengis.net/context" version="1.1.0" id="ctx">
  <General><Title>Parcels</Title><Abstract>Cadastre</Abstract></General>
  <LayerList>
    <Layer queryable="1"><Name>parcels</Name></Layer>
    <Layer queryable="false" hidden="true"><Name>roads</Name></Layer>
  </LayerList>
</ViewContext>"#;

    #[test]
    fn valid_document_passes() {
        let (_dir, location) = fixture();
        validator().validate(VALID, &location).unwrap();
    }

    #[test]
    fn missing_required_element_is_invalid() {
        let (_dir, location) = fixture();
        let doc = r#"<ViewContext xmlns="http://www.opengis.net/context" version="1.1.0" id="c">
            <General><Abstract>no title</Abstract></General></ViewContext>"#;
        let err = validator().validate(doc, &location).unwrap_err();
        match err {
            GeodocError::Invalid(msg) => assert!(msg.contains("Abstract"), "{}", msg),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn enumeration_and_required_attributes_are_checked() {
        let (_dir, location) = fixture();
        let v = validator();
        let bad_version = VALID.replace("version=\"1.1.0\"", "version=\"2.0\"");
        assert!(matches!(
            v.validate(&bad_version, &location),
            Err(GeodocError::Invalid(_))
        ));
        let no_queryable = VALID.replace(" queryable=\"1\"", "");
        assert!(matches!(
            v.validate(&no_queryable, &location),
            Err(GeodocError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_namespace_is_invalid() {
        let (_dir, location) = fixture();
        let doc = VALID.replace("http://www.opengis.net/context", "urn:other");
        assert!(matches!(
            validator().validate(&doc, &location),
            Err(GeodocError::Invalid(_))
        ));
    }

    #[test]
    fn foreign_extension_content_is_accepted() {
        let (_dir, location) = fixture();
        let doc = VALID.replace(
            "<Abstract>Cadastre</Abstract>",
            "<Abstract>Cadastre</Abstract><ol:maxExtent xmlns:ol=\"http://openlayers.org/context\" minx=\"1\"/>",
        );
        validator().validate(&doc, &location).unwrap();
    }

    #[test]
    fn malformed_document_is_invalid() {
        let (_dir, location) = fixture();
        assert!(matches!(
            validator().validate("<ViewContext>", &location),
            Err(GeodocError::Invalid(_))
        ));
    }

    #[test]
    fn missing_schema_is_unavailable_not_invalid() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("nope.xsd").to_string_lossy().into_owned();
        assert!(matches!(
            validator().validate(VALID, &location),
            Err(GeodocError::SchemaUnavailable { .. })
        ));
    }

    #[test]
    fn cached_schema_survives_source_removal() {
        let (dir, location) = fixture();
        let v = validator();
        v.validate(VALID, &location).unwrap();
        fs::remove_file(dir.path().join("context.xsd")).unwrap();
        v.validate(VALID, &location).unwrap();

        v.clear_cache();
        assert!(v.validate(VALID, &location).is_err());
    }

    #[test]
    fn zero_ttl_refetches_every_call() {
        let (dir, location) = fixture();
        let v = SchemaValidator::new(ValidatorOptions {
            cache_ttl: Duration::ZERO,
            ..ValidatorOptions::default()
        })
        .unwrap();
        v.validate(VALID, &location).unwrap();
        fs::remove_file(dir.path().join("context.xsd")).unwrap();
        assert!(matches!(
            v.validate(VALID, &location),
            Err(GeodocError::SchemaUnavailable { .. })
        ));
    }

    const STYLED_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="ViewContext">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Code" type="Code"/>
        <xs:element name="Opacity" type="Opacity"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:simpleType name="Code">
    <xs:restriction base="xs:string">
      <xs:pattern value="[A-Z]{3}"/>
      <xs:maxLength value="3"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Opacity">
    <xs:restriction base="xs:decimal">
      <xs:minInclusive value="0"/>
      <xs:maxInclusive value="1"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn write_schema(dir: &TempDir, name: &str, xsd: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, xsd).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn restricted_values_are_checked() {
        let dir = TempDir::new().unwrap();
        let location = write_schema(&dir, "styled.xsd", STYLED_XSD);
        let v = validator();
        let doc = |code: &str, opacity: &str| {
            format!(
                "<ViewContext><Code>{}</Code><Opacity>{}</Opacity></ViewContext>",
                code, opacity
            )
        };

        v.validate(&doc("EPS", "0.5"), &location).unwrap();
        for (code, opacity) in [("not-a-code-at-all", "0.5"), ("EPS", "42"), ("EPSG", "1")] {
            match v.validate(&doc(code, opacity), &location) {
                Err(GeodocError::Invalid(_)) => {}
                other => panic!("{} / {}: expected Invalid, got {:?}", code, opacity, other),
            }
        }
    }

    #[test]
    fn unsupported_schema_constructs_are_unavailable() {
        let dir = TempDir::new().unwrap();
        let location = write_schema(
            &dir,
            "latin.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Name">
                  <xs:simpleType>
                    <xs:restriction base="xs:string">
                      <xs:pattern value="\p{IsBasicLatin}+"/>
                    </xs:restriction>
                  </xs:simpleType>
                </xs:element>
              </xs:schema>"#,
        );
        match validator().validate("<Name>abc</Name>", &location) {
            Err(GeodocError::SchemaUnavailable { reason, .. }) => {
                assert!(reason.contains("IsBasicLatin"), "{}", reason)
            }
            other => panic!("expected SchemaUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn resolves_relative_locations() {
        assert_eq!(
            resolve_location("http://schemas.example.org/context/1.1.0/context.xsd", "general.xsd"),
            "http://schemas.example.org/context/1.1.0/general.xsd"
        );
        assert_eq!(
            resolve_location("http://schemas.example.org/a/b.xsd", "../xlink/xlinks.xsd"),
            "http://schemas.example.org/xlink/xlinks.xsd"
        );
        assert_eq!(
            resolve_location("/srv/schemas/context.xsd", "general.xsd"),
            "/srv/schemas/general.xsd"
        );
    }
}
