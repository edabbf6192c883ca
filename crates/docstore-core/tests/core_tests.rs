use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docstore_core::config::{Config, StoreConfig};
use docstore_core::ingest::RecordLoader;
use docstore_core::{DocId, Error, Metadata, NewDocument, RecordStore, Source};
use figment::providers::{Format, Toml};
use figment::Figment;

fn doc(content: &str, embedding: Vec<f32>) -> NewDocument { NewDocument::new(content, "web", embedding) }

#[test]
fn insert_then_get_round_trips() {
    let store = RecordStore::in_memory(None);
    let mut meta = Metadata::new();
    meta.insert("url".to_string(), serde_json::json!("https://example.org/a"));
    let new = NewDocument::new("machine learning basics", "web", vec![0.1, 0.2, 0.3]).with_metadata(meta.clone());

    let stored = store.insert(new.clone()).expect("insert");
    let fetched = store.get(stored.id).expect("get");

    assert_eq!(fetched.id, DocId::FIRST);
    assert_eq!(fetched.content, new.content);
    assert_eq!(fetched.source, Source::Web);
    assert_eq!(fetched.metadata, meta);
    assert_eq!(fetched.embedding, new.embedding);
}

#[test]
fn ids_are_monotonic_and_unique() {
    let store = RecordStore::in_memory(None);
    let a = store.insert(doc("a", vec![1.0])).unwrap().id;
    let b = store.insert(doc("b", vec![2.0])).unwrap().id;
    let c = store.insert(doc("c", vec![3.0])).unwrap().id;
    assert!(a < b && b < c);
    assert_eq!(store.ids().unwrap(), vec![a, b, c]);
}

#[test]
fn first_insert_fixes_dimension_and_mismatch_is_rejected() {
    let store = RecordStore::in_memory(None);
    assert_eq!(store.dimension(), None);
    store.insert(doc("first", vec![1.0, 0.0, 0.0])).unwrap();
    assert_eq!(store.dimension(), Some(3));

    let err = store.insert(doc("second", vec![1.0, 0.0])).unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert_eq!(store.len(), 1, "rejected write leaves no entry");
}

#[test]
fn configured_dimension_applies_before_first_insert() {
    let store = RecordStore::in_memory(Some(2));
    let err = store.insert(doc("x", vec![1.0, 2.0, 3.0])).unwrap_err();
    assert!(err.is_validation());
    assert!(store.is_empty());
}

#[test]
fn invalid_requests_are_validation_errors() {
    let store = RecordStore::in_memory(None);
    assert!(store.insert(NewDocument::new("x", "", vec![1.0])).unwrap_err().is_validation());
    assert!(store.insert(doc("x", vec![])).unwrap_err().is_validation());
    assert!(store.insert(doc("x", vec![f32::NAN])).unwrap_err().is_validation());
    assert_eq!(store.dimension(), None, "failed inserts never fix the dimension");
}

#[test]
fn empty_content_is_accepted() {
    let store = RecordStore::in_memory(None);
    let stored = store.insert(doc("   ", vec![1.0])).unwrap();
    assert_eq!(store.get(stored.id).unwrap().content, "   ");
}

#[test]
fn get_unknown_id_is_not_found() {
    let store = RecordStore::in_memory(None);
    let err = store.get(DocId::new(42)).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn durable_store_reopens_with_same_documents_and_resumes_ids() {
    let tmp = TempDir::new().unwrap();
    let first_ids = {
        let store = RecordStore::open(tmp.path(), None, true).unwrap();
        let a = store.insert(doc("alpha", vec![1.0, 0.0])).unwrap().id;
        let b = store.insert(NewDocument::new("bravo", "pdf", vec![0.0, 1.0])).unwrap().id;
        vec![a, b]
    };

    let store = RecordStore::open(tmp.path(), None, true).unwrap();
    assert_eq!(store.ids().unwrap(), first_ids);
    assert_eq!(store.dimension(), Some(2));
    assert_eq!(store.get(first_ids[1]).unwrap().source, Source::Pdf);

    let c = store.insert(doc("charlie", vec![1.0, 1.0])).unwrap().id;
    assert!(c > first_ids[1], "ids never collide across restarts");
}

#[test]
fn other_source_with_a_known_tag_is_that_source() {
    assert_eq!(Source::Other("pdf".into()), Source::Pdf);
    assert_ne!(Source::Other("fax".into()), Source::Pdf);

    let tmp = TempDir::new().unwrap();
    let id = {
        let store = RecordStore::open(tmp.path(), None, true).unwrap();
        store.insert(NewDocument::new("bravo", Source::Other("pdf".into()), vec![0.0, 1.0])).unwrap().id
    };
    let store = RecordStore::open(tmp.path(), None, true).unwrap();
    assert_eq!(store.get(id).unwrap().source, Source::Other("pdf".into()));
}

#[test]
fn reserve_through_skips_ids_seen_elsewhere() {
    let store = RecordStore::in_memory(None);
    store.insert(doc("alpha", vec![1.0])).unwrap();
    store.reserve_through(DocId::new(7)).unwrap();
    assert_eq!(store.insert(doc("bravo", vec![2.0])).unwrap().id, DocId::new(8));
    store.reserve_through(DocId::new(3)).unwrap();
    assert_eq!(store.insert(doc("charlie", vec![3.0])).unwrap().id, DocId::new(9), "never moves backwards");
}

#[test]
fn torn_record_tail_is_dropped_on_open() {
    let tmp = TempDir::new().unwrap();
    {
        let store = RecordStore::open(tmp.path(), None, true).unwrap();
        store.insert(doc("alpha", vec![1.0])).unwrap();
    }
    let mut f = fs::OpenOptions::new().append(true).open(tmp.path().join("records.log")).unwrap();
    write!(f, "{{\"id\":2,\"content\":\"half").unwrap();
    drop(f);

    let store = RecordStore::open(tmp.path(), None, true).unwrap();
    assert_eq!(store.len(), 1);
    let next = store.insert(doc("bravo", vec![2.0])).unwrap();
    assert_eq!(next.id, DocId::new(2));
}

#[test]
fn configured_dimension_conflicting_with_persisted_data_is_config_error() {
    let tmp = TempDir::new().unwrap();
    {
        let store = RecordStore::open(tmp.path(), None, true).unwrap();
        store.insert(doc("alpha", vec![1.0, 2.0])).unwrap();
    }
    let err = RecordStore::open(tmp.path(), Some(3), true).err().expect("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
}

#[test]
fn load_directory_reads_json_and_jsonl_and_reports_bad_entries() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("a.jsonl"),
        concat!(
            "{\"content\":\"machine learning basics\",\"source\":\"web\",\"metadata\":{\"url\":\"u\"},\"embedding\":[1.0,0.0]}\n",
            "\n",
            "{\"content\":\"missing embedding\",\"source\":\"web\"}\n",
        ),
    )
    .unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(
        dir.join("nested/b.json"),
        "[{\"content\":\"deep learning guide\",\"source\":\"pdf\",\"embedding\":[0.0,1.0]}]",
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let loaded = RecordLoader::new().load_directory(dir).expect("load");

    assert_eq!(loaded.records.len(), 2);
    assert_eq!(loaded.records[0].1.content, "machine learning basics");
    assert_eq!(loaded.records[1].1.source, Source::Pdf);
    assert!(loaded.records[1].1.metadata.is_empty(), "metadata defaults to empty");
    assert_eq!(loaded.rejected.len(), 1);
    assert_eq!(loaded.rejected[0].location.entry, 3);
}

#[test]
fn load_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.json"), "{\"content\":\"alpha\",\"source\":\"web\",\"embedding\":[1.0]}").unwrap();
    fs::write(dir.join("b.json"), "{\"content\":\"bravo\",\"source\":\"web\",\"embedding\":[1.0]}").unwrap();

    let loaded = RecordLoader::new().load_directory_limited(dir, 1).expect("load limited");

    assert_eq!(loaded.records.len(), 1, "limited to one source file");
    assert_eq!(loaded.records[0].1.content, "alpha");
}

#[test]
fn store_config_defaults_when_sections_are_missing() {
    let config = Config::from_figment(Figment::new());
    let store = config.store().unwrap();
    assert_eq!(store, StoreConfig::default());
    assert_eq!(store.default_k, 5);
    assert!(store.sync_writes);
    assert!(store.data_path().is_none());
}

#[test]
fn store_config_reads_store_and_text_sections() {
    let toml = r#"
        [store]
        data_dir = "/var/lib/docstore"
        dimension = 384
        default_k = 10

        [text]
        stop_words = true
    "#;
    let config = Config::from_figment(Figment::from(Toml::string(toml)));
    let store = config.store().unwrap();
    assert_eq!(store.dimension, Some(384));
    assert_eq!(store.default_k, 10);
    assert!(store.sync_writes, "unset keys keep their defaults");
    assert!(store.text.stop_words);
    assert_eq!(store.data_path().unwrap(), std::path::PathBuf::from("/var/lib/docstore"));
}

#[test]
fn zero_default_k_fails_validation() {
    let config = Config::from_figment(Figment::from(Toml::string("[store]\ndefault_k = 0\n")));
    let err = config.store().unwrap().validate().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}
