use geodocs::address::Address;
use geodocs::api::DocumentStore;
use geodocs::config::GeodocsConfig;
use geodocs::error::{ErrorKind, GeodocError};
use geodocs::model::ANONYMOUS_USER;
use geodocs::store::{RecordBackend, SqliteBackend};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const CONTEXT_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.opengis.net/context"
           xmlns:ctx="http://www.opengis.net/context"
           elementFormDefault="qualified">
  <xs:element name="ViewContext">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="General">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="Title" type="xs:string"/>
            </xs:sequence>
          </xs:complexType>
        </xs:element>
      </xs:sequence>
      <xs:attribute name="version" type="xs:string" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

fn setup() -> (TempDir, DocumentStore<SqliteBackend>) {
    let dir = TempDir::new().unwrap();
    let config = GeodocsConfig {
        database: dir.path().join("db").join("geodocs.db"),
        legacy_dir: dir.path().join("legacy"),
        ..GeodocsConfig::default()
    };
    let store = DocumentStore::open(&config).unwrap();
    (dir, store)
}

fn hash_of(store: &DocumentStore<SqliteBackend>, tag: &str, name: &str) -> String {
    match store.format(tag).unwrap().scheme().resolve(name) {
        Address::Relational { hash } => hash,
        other => panic!("expected relational address, got {other:?}"),
    }
}

#[test]
fn scenario_save_and_load_wmc() {
    let (_dir, store) = setup();
    let wmc = store.format("wmc").unwrap();

    let name = wmc.save("<root><a>1</a></root>", "alice").unwrap();
    let hash = &name["geodoc".len()..name.len() - ".wmc".len()];
    assert!(name.starts_with("geodoc") && name.ends_with(".wmc"));
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    let doc = wmc.load(&name).unwrap();
    assert_eq!(doc.content(), "<root>\n  <a>1</a>\n</root>\n");
    assert_eq!(doc.mime_type(), "application/vnd.ogc.context+xml");
}

#[test]
fn loads_track_access_statistics() {
    let (_dir, store) = setup();
    let wmc = store.format("wmc").unwrap();
    let name = wmc.save("<ViewContext/>", "alice").unwrap();
    let hash = hash_of(&store, "wmc", &name);

    let before = store.backend().get(&hash).unwrap().unwrap();
    assert_eq!(before.access_count, 0);
    assert!(before.last_access.is_none());

    let mut previous = None;
    for expected in 1..=3 {
        wmc.load(&name).unwrap();
        let record = store.backend().get(&hash).unwrap().unwrap();
        assert_eq!(record.access_count, expected);
        assert!(record.last_access >= previous);
        previous = record.last_access;
    }
}

#[test]
fn identical_saves_get_distinct_names() {
    let (_dir, store) = setup();
    let wmc = store.format("wmc").unwrap();
    let names: HashSet<String> = (0..200)
        .map(|_| wmc.save("<ViewContext/>", ANONYMOUS_USER).unwrap())
        .collect();
    assert_eq!(names.len(), 200);
}

#[test]
fn listing_is_scoped_and_newest_first() {
    let (_dir, store) = setup();
    let wmc = store.format("wmc").unwrap();
    let first = wmc
        .save("<ViewContext><General><Title>First</Title></General></ViewContext>", "alice")
        .unwrap();
    let second = wmc
        .save("<ViewContext><General><Title>Second</Title></General></ViewContext>", "alice")
        .unwrap();
    wmc.save("<ViewContext/>", "bob").unwrap();
    store.format("sld").unwrap().save("<StyledLayerDescriptor/>", "alice").unwrap();
    wmc.save("<broken", "alice").unwrap();

    let entries = wmc.list("alice");
    let hashes: Vec<&str> = entries.iter().map(|e| e.hash.as_str()).collect();
    assert_eq!(
        hashes,
        vec![
            hash_of(&store, "wmc", &second).as_str(),
            hash_of(&store, "wmc", &first).as_str()
        ]
    );
    assert_eq!(entries[0].fields["title"], "Second");
}

#[test]
fn delete_checks_owner() {
    let (_dir, store) = setup();
    let wmc = store.format("wmc").unwrap();
    let name = wmc.save("<ViewContext/>", "alice").unwrap();
    let hash = hash_of(&store, "wmc", &name);

    let err = wmc.delete(&hash, "bob").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.status_code(), 403);
    assert!(wmc.load(&name).is_ok());

    wmc.delete(&hash, "alice").unwrap();
    let err = wmc.load(&name).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn legacy_documents_are_served_from_the_directory() {
    let (dir, store) = setup();
    std::fs::write(
        dir.path().join("legacy").join("map-2011.kml"),
        "<kml><Document><name>Old map</name></Document></kml>",
    )
    .unwrap();

    let doc = store.format("kml").unwrap().load("map-2011.kml").unwrap();
    assert_eq!(doc.name(), "Old_map.kml");
    assert_eq!(
        store.format("kml").unwrap().load("../geodocs.db").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn configured_schema_rejects_invalid_documents() {
    let dir = TempDir::new().unwrap();
    let xsd = dir.path().join("context.xsd");
    std::fs::write(&xsd, CONTEXT_XSD).unwrap();
    let config = GeodocsConfig {
        database: dir.path().join("geodocs.db"),
        legacy_dir: dir.path().join("legacy"),
        wmc_schema: Some(xsd.display().to_string()),
        ..GeodocsConfig::default()
    };
    let store = DocumentStore::open(&config).unwrap();
    let wmc = store.format("wmc").unwrap();

    let valid = r#"<ViewContext xmlns="http://www.opengis.net/context" version="1.1.0"><General><Title>Ok</Title></General></ViewContext>"#;
    assert!(wmc.save(valid, "alice").is_ok());

    let invalid = r#"<ViewContext xmlns="http://www.opengis.net/context"><General><Title>No version</Title></General></ViewContext>"#;
    let err = wmc.save(invalid, "alice").unwrap_err();
    assert!(matches!(err, GeodocError::Invalid(_)));
    assert_eq!(err.status_code(), 415);
    assert_eq!(wmc.list("alice").len(), 1);
}

#[test]
fn unreachable_schema_aborts_save() {
    let dir = TempDir::new().unwrap();
    let config = GeodocsConfig {
        database: dir.path().join("geodocs.db"),
        legacy_dir: dir.path().join("legacy"),
        gpx_schema: Some(dir.path().join("missing.xsd").display().to_string()),
        ..GeodocsConfig::default()
    };
    let store = DocumentStore::open(&config).unwrap();

    let err = store.format("gpx").unwrap().save("<gpx/>", "alice").unwrap_err();
    assert!(matches!(err, GeodocError::SchemaUnavailable { .. }));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn concurrent_saves_and_loads() {
    let (_dir, store) = setup();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let wmc = store.format("wmc").unwrap();
                (0..10)
                    .map(|_| {
                        let name = wmc.save("<ViewContext/>", &format!("user{i}")).unwrap();
                        wmc.load(&name).unwrap();
                        name
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let names: HashSet<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(names.len(), 40);
    for i in 0..4 {
        let entries = store.format("wmc").unwrap().list(&format!("user{i}"));
        assert_eq!(entries.len(), 10);
        assert!(entries.iter().all(|e| e.access_count == 1));
    }
}

#[test]
fn concurrent_loads_of_one_document_count_every_access() {
    const THREADS: u64 = 8;
    const LOADS: u64 = 25;

    let (_dir, store) = setup();
    let store = Arc::new(store);
    let name = store
        .format("wmc")
        .unwrap()
        .save("<ViewContext><General/></ViewContext>", "alice")
        .unwrap();
    let hash = hash_of(&store, "wmc", &name);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let name = name.clone();
            thread::spawn(move || {
                let wmc = store.format("wmc").unwrap();
                for _ in 0..LOADS {
                    let doc = wmc.load(&name).unwrap();
                    assert!(doc.content().contains("<General/>"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let record = store.backend().get(&hash).unwrap().unwrap();
    assert_eq!(record.access_count, THREADS * LOADS);
    assert!(record.last_access.is_some());
}
