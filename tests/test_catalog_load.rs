use arcdb_catalog::catalog::metadata_file_name;
use arcdb_catalog::dictionary::{DictionaryLoader, DictionarySource};
use arcdb_catalog::pool::{InlinePool, ThreadPool};
use arcdb_catalog::sql::ast::CreateTableStatement;
use arcdb_catalog::storage::{StorageFactory, StorageHandle};
use arcdb_catalog::{CatalogConfig, Context, Error, OrdinaryDatabase, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct TestHandle {
    name: String,
    started: AtomicBool,
    startups: Arc<AtomicUsize>,
    startup_order: Arc<Mutex<Vec<String>>>,
}

impl StorageHandle for TestHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine(&self) -> &str {
        "Test"
    }

    fn startup(&self) -> Result<()> {
        self.startups.fetch_add(1, Ordering::SeqCst);
        self.startup_order.lock().push(self.name.clone());
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

/// Records the order tables are created in and fails the named ones
#[derive(Default)]
struct RecordingFactory {
    created: Mutex<Vec<String>>,
    failing: HashSet<String>,
    startups: Arc<AtomicUsize>,
    startup_order: Arc<Mutex<Vec<String>>>,
}

impl RecordingFactory {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    fn created(&self) -> Vec<String> {
        self.created.lock().clone()
    }

    fn started(&self) -> Vec<String> {
        self.startup_order.lock().clone()
    }
}

impl StorageFactory for RecordingFactory {
    fn create(
        &self,
        definition: &CreateTableStatement,
        _data_path: &Path,
        _context: &Context,
        _force_restore: bool,
    ) -> Result<Arc<dyn StorageHandle>> {
        self.created.lock().push(definition.table_name.clone());
        if self.failing.contains(&definition.table_name) {
            return Err(Error::StorageError("corrupted parts".to_string()));
        }
        Ok(Arc::new(TestHandle {
            name: definition.table_name.clone(),
            started: AtomicBool::new(false),
            startups: self.startups.clone(),
            startup_order: self.startup_order.clone(),
        }))
    }
}

/// Records dictionary loads and what the source looked like at that moment
#[derive(Default)]
struct RecordingDictionaries {
    sources: Mutex<Vec<(String, Arc<dyn DictionarySource>)>>,
    loads: Mutex<Vec<String>>,
    startups: Arc<AtomicUsize>,
    startups_seen: Mutex<Vec<usize>>,
}

impl DictionaryLoader for RecordingDictionaries {
    fn add_source(&self, catalog: &str, source: Arc<dyn DictionarySource>) {
        self.sources.lock().push((catalog.to_string(), source));
    }

    fn load_dictionary(&self, catalog: &str, name: &str) -> Result<()> {
        let sources = self.sources.lock();
        let (_, source) = sources
            .iter()
            .find(|(c, _)| c == catalog)
            .ok_or_else(|| Error::UnknownDictionarySource(catalog.to_string()))?;
        if source.dictionary_definition(name).is_none() {
            return Err(Error::DictionaryNotFound(name.to_string()));
        }
        self.loads.lock().push(name.to_string());
        self.startups_seen
            .lock()
            .push(self.startups.load(Ordering::SeqCst));
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    database: OrdinaryDatabase,
    config: CatalogConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::new()
            .metadata_root(dir.path().join("metadata"))
            .data_root(dir.path())
            .max_threads(4);
        let database = OrdinaryDatabase::new("default", &config).unwrap();
        fs::create_dir_all(database.metadata_path()).unwrap();
        Self {
            _dir: dir,
            database,
            config,
        }
    }

    fn table(&self, name: &str) {
        self.write(
            name,
            &format!("ATTACH TABLE `{}` (id UInt64) ENGINE = Memory", name),
        );
    }

    fn dictionary(&self, name: &str) {
        self.write(
            name,
            &format!(
                "ATTACH DICTIONARY `{}` (id UInt64) PRIMARY KEY id SOURCE(NULL()) LAYOUT(FLAT())",
                name
            ),
        );
    }

    fn write(&self, name: &str, text: &str) {
        fs::write(self.database.object_metadata_path(name), text).unwrap();
    }

    fn context(&self, factory: &Arc<RecordingFactory>, dictionaries: &Arc<RecordingDictionaries>) -> Context {
        Context::new(self.config.clone())
            .with_storage_factory(factory.clone())
            .with_dictionaries(dictionaries.clone())
    }
}

fn recorders() -> (Arc<RecordingFactory>, Arc<RecordingDictionaries>) {
    let factory = Arc::new(RecordingFactory::default());
    let dictionaries = Arc::new(RecordingDictionaries {
        startups: factory.startups.clone(),
        ..Default::default()
    });
    (factory, dictionaries)
}

#[test]
fn test_full_load_counts() {
    let fixture = Fixture::new();
    for i in 0..20 {
        fixture.table(&format!("t{:02}", i));
    }
    for i in 0..3 {
        fixture.dictionary(&format!("d{}", i));
    }

    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);
    let summary = fixture.database.load_stored_objects(&context).unwrap();

    assert_eq!(summary.tables, 20);
    assert_eq!(summary.dictionaries, 3);
    assert_eq!(factory.startups.load(Ordering::SeqCst), 20);
    assert_eq!(fixture.database.table_names().len(), 20);
    assert_eq!(*dictionaries.loads.lock(), vec!["d0", "d1", "d2"]);
}

#[test]
fn test_dictionaries_follow_startup() {
    let fixture = Fixture::new();
    fixture.dictionary("a_dict");
    fixture.table("b_table");
    fixture.table("c_table");

    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);
    fixture.database.load_stored_objects(&context).unwrap();

    // Both tables were started before the first dictionary was attached
    assert_eq!(*dictionaries.startups_seen.lock(), vec![2]);
    let sources = dictionaries.sources.lock();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].0, "default");
    assert!(sources[0].1.has_table("b_table"));
}

#[test]
fn test_inline_pool_attaches_and_starts_in_file_order() {
    let fixture = Fixture::new();
    let names = ["zebra", "apple", "my table", "Mango", "kiwi_2", "kiwi"];
    for name in names {
        fixture.table(name);
    }

    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);
    fixture
        .database
        .load_with_pool(&InlinePool::new(), &context)
        .unwrap();

    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort_by_key(|n| metadata_file_name(n));
    assert_eq!(factory.created(), expected);
    assert_eq!(factory.started(), expected);
    assert_eq!(fixture.database.table_names(), expected);
}

#[test]
fn test_malformed_file_attaches_nothing() {
    let fixture = Fixture::new();
    fixture.table("a");
    fixture.write("b", "ATTACH TABLE b (id UInt64) ENGINE");
    fixture.table("c");

    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);
    let result = fixture.database.load_stored_objects(&context);

    match result {
        Err(Error::MetadataParse { path, .. }) => {
            assert_eq!(path, fixture.database.object_metadata_path("b"))
        }
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(factory.created().is_empty());
    assert!(fixture.database.table_names().is_empty());
}

#[test]
fn test_one_failing_table_among_many() {
    let fixture = Fixture::new();
    for i in 0..50 {
        fixture.table(&format!("t{:02}", i));
    }
    fixture.dictionary("never_loaded");

    let factory = Arc::new(RecordingFactory::failing(&["t17"]));
    let dictionaries = Arc::new(RecordingDictionaries::default());
    let context = fixture.context(&factory, &dictionaries);
    let pool = ThreadPool::new("test", 4);
    let result = fixture.database.load_with_pool(&pool, &context);

    match result {
        Err(Error::AttachTable { name, query, .. }) => {
            assert_eq!(name, "t17");
            assert!(query.contains("t17"));
        }
        other => panic!("expected attach error, got {:?}", other),
    }
    // Every task ran; the siblings stay attached but nothing was started
    assert_eq!(factory.created().len(), 50);
    assert_eq!(fixture.database.table_names().len(), 49);
    assert_eq!(factory.startups.load(Ordering::SeqCst), 0);
    assert!(dictionaries.sources.lock().is_empty());
    assert!(dictionaries.loads.lock().is_empty());
}

#[test]
fn test_empty_database() {
    let fixture = Fixture::new();
    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);

    let pool = ThreadPool::new("empty", 4);
    let summary = fixture.database.load_with_pool(&pool, &context).unwrap();

    assert_eq!(summary.tables, 0);
    assert_eq!(pool.thread_count(), 0);
    // The catalog is still registered as a dictionary source
    assert_eq!(dictionaries.sources.lock().len(), 1);
}

#[test]
fn test_leftover_tmp_file_is_ignored_by_load() {
    let fixture = Fixture::new();
    fixture.table("hits");
    fs::write(
        fixture
            .database
            .metadata_path()
            .join("hits.sql.tmp"),
        "ATTACH TABLE hits (id UInt64, half",
    )
    .unwrap();

    let (factory, dictionaries) = recorders();
    let context = fixture.context(&factory, &dictionaries);
    let summary = fixture.database.load_stored_objects(&context).unwrap();

    assert_eq!(summary.tables, 1);
    assert!(fixture.database.metadata_path().join("hits.sql.tmp").exists());
}

#[test]
fn test_built_in_collaborators() {
    let fixture = Fixture::new();
    fixture.write(
        "visits",
        "ATTACH TABLE visits (id UInt64, region UInt32, d Date) \
         ENGINE = MergeTree() PARTITION BY d ORDER BY (id, d)",
    );
    fixture.write(
        "regions_src",
        "ATTACH TABLE regions_src (id UInt32, name String) ENGINE = TinyLog",
    );
    fixture.write(
        "regions",
        "ATTACH DICTIONARY regions (id UInt32, name String DEFAULT '') PRIMARY KEY id \
         SOURCE(CLICKHOUSE(TABLE 'regions_src')) LAYOUT(HASHED()) LIFETIME(MIN 0 MAX 300)",
    );

    let context = Context::new(fixture.config.clone());
    let summary = fixture.database.load_stored_objects(&context).unwrap();

    assert_eq!(summary.tables, 2);
    assert_eq!(summary.dictionaries, 1);
    assert!(fixture.database.get_table("visits").unwrap().is_started());
    assert!(fixture.database.table_data_path("visits").is_dir());
}
