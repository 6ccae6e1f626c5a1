//! Integration tests for reconciliation against mock and SQLite storage

use gamehub_config::PlatformsConfig;
use gamehub_library::mock::{MemoryGateway, MockFactory, MockScanner, RecordingLauncher};
use gamehub_library::platforms::builtin_registry;
use gamehub_library::{
    GameDatabase, GameRecord, LibraryError, PersistenceGateway, Platform, PlatformFactory,
    PlatformRegistry, PlatformRow, ScanContext, SyncEngine,
};
use std::collections::HashSet;
use std::sync::Arc;

const PLATFORM_ID: i64 = 1;

fn game(id: &str) -> GameRecord {
    GameRecord::new(PLATFORM_ID, id, id.to_uppercase())
}

fn keys(games: impl IntoIterator<Item = GameRecord>) -> Vec<String> {
    let mut keys: Vec<String> = games.into_iter().map(|g| g.external_id).collect();
    keys.sort();
    keys
}

/// A persisted platform whose index has been loaded from `gateway`
fn loaded_platform(scanner: Arc<MockScanner>, gateway: &MemoryGateway) -> Platform {
    let mut platform = Platform::new("Mock", scanner, Arc::new(RecordingLauncher::new()))
        .with_id(PLATFORM_ID);
    SyncEngine::new(gateway).load_index(&mut platform).unwrap();
    platform
}

fn indexed(platform: &Platform) -> Vec<String> {
    keys(platform.games().iter_games().cloned())
}

#[test]
fn test_reconcile_adds_and_removes() {
    let gateway = MemoryGateway::new().with_games(vec![game("a"), game("b")]);
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("a"), game("c")]));
    let mut platform = loaded_platform(scanner, &gateway);

    let report = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap();

    assert_eq!(keys(report.added), vec!["c"]);
    assert_eq!(keys(report.removed), vec!["b"]);
    assert!(report.failures.is_empty());
    assert_eq!(keys(gateway.stored(PLATFORM_ID)), vec!["a", "c"]);
    assert_eq!(indexed(&platform), vec!["a", "c"]);
}

#[test]
fn test_reconcile_is_idempotent() {
    let gateway = MemoryGateway::new().with_games(vec![game("a")]);
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("a"), game("b")]));
    let mut platform = loaded_platform(scanner, &gateway);
    let engine = SyncEngine::new(&gateway);
    let ctx = ScanContext::default();

    engine.reconcile(&mut platform, &ctx).unwrap();
    let inserts = gateway.insert_count();

    let second = engine.reconcile(&mut platform, &ctx).unwrap();
    assert!(second.is_noop());
    assert_eq!(gateway.insert_count(), inserts);
    assert_eq!(gateway.delete_count(), 0);
    assert_eq!(indexed(&platform), vec!["a", "b"]);
}

#[test]
fn test_empty_scan_removes_everything() {
    let gateway = MemoryGateway::new().with_games(vec![game("a"), game("b")]);
    let mut platform = loaded_platform(Arc::new(MockScanner::new()), &gateway);

    let report = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap();

    assert_eq!(report.removed.len(), 2);
    assert!(gateway.stored(PLATFORM_ID).is_empty());
    assert_eq!(platform.game_count(), 0);
}

#[test]
fn test_metadata_change_is_ignored() {
    let gateway = MemoryGateway::new().with_games(vec![game("a").with_alias("old")]);
    let scanner = Arc::new(
        MockScanner::new().with_installed(vec![GameRecord::new(PLATFORM_ID, "a", "Renamed")]),
    );
    let mut platform = loaded_platform(scanner, &gateway);

    let report = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap();

    assert!(report.is_noop());
    assert_eq!(platform.find_game("a").unwrap().title, "A");
}

#[test]
fn test_scan_fault_leaves_state_untouched() {
    let gateway = MemoryGateway::new().with_games(vec![game("a")]);
    let scanner = Arc::new(MockScanner::new().with_fault("unreadable manifest"));
    let mut platform = loaded_platform(scanner, &gateway);

    let err = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap_err();

    assert!(matches!(
        err,
        LibraryError::ScanFailure {
            platform_id: PLATFORM_ID,
            ..
        }
    ));
    assert_eq!(gateway.insert_count(), 0);
    assert_eq!(gateway.delete_count(), 0);
    assert_eq!(indexed(&platform), vec!["a"]);
}

#[test]
fn test_cancelled_scan_makes_no_storage_calls() {
    let gateway = MemoryGateway::new().with_games(vec![game("a")]);
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("b"), game("c")]));
    let mut platform = loaded_platform(scanner, &gateway);

    let ctx = ScanContext::default();
    ctx.cancel_token().cancel();

    let err = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ctx)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(gateway.insert_count(), 0);
    assert_eq!(gateway.delete_count(), 0);
    assert_eq!(keys(gateway.stored(PLATFORM_ID)), vec!["a"]);
}

#[test]
fn test_record_failure_skips_only_that_record() {
    let gateway = MemoryGateway::new().with_games(vec![game("a"), game("b")]);
    gateway.fail_on(PLATFORM_ID, "c");
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("a"), game("c"), game("d")]));
    let mut platform = loaded_platform(scanner, &gateway);
    let engine = SyncEngine::new(&gateway);
    let ctx = ScanContext::default();

    let report = engine.reconcile(&mut platform, &ctx).unwrap();
    assert_eq!(keys(report.added), vec!["d"]);
    assert_eq!(keys(report.removed), vec!["b"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].game.external_id, "c");
    assert_eq!(indexed(&platform), vec!["a", "d"]);
    assert_eq!(keys(gateway.stored(PLATFORM_ID)), vec!["a", "d"]);

    gateway.clear_failures();
    let retry = engine.reconcile(&mut platform, &ctx).unwrap();
    assert_eq!(keys(retry.added), vec!["c"]);
    assert_eq!(indexed(&platform), vec!["a", "c", "d"]);
}

#[test]
fn test_failed_delete_keeps_index_entry() {
    let gateway = MemoryGateway::new().with_games(vec![game("a"), game("b")]);
    gateway.fail_on(PLATFORM_ID, "b");
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("a")]));
    let mut platform = loaded_platform(scanner, &gateway);

    let report = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap();

    assert!(report.removed.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(indexed(&platform), vec!["a", "b"]);
}

#[test]
fn test_unpersisted_platform_is_refused() {
    let gateway = MemoryGateway::new();
    let scanner = Arc::new(MockScanner::new().with_installed(vec![game("a")]));
    let mut platform = Platform::new(
        "Fresh",
        scanner.clone(),
        Arc::new(RecordingLauncher::new()),
    );

    let err = SyncEngine::new(&gateway)
        .reconcile(&mut platform, &ScanContext::default())
        .unwrap_err();

    assert!(matches!(err, LibraryError::NotPersisted(_)));
    assert_eq!(scanner.scan_count(), 0);
    assert_eq!(gateway.insert_count(), 0);
}

#[test]
fn test_factory_contract() {
    let factory = MockFactory::new("Alpha");

    let fresh = factory.create_default();
    assert!(fresh.id() < 0);
    assert!(fresh.is_enabled());
    assert_eq!(fresh.name(), factory.platform_name());

    let row = PlatformRow {
        id: 12,
        name: "Alpha".into(),
        description: "stored".into(),
        path: "/srv/alpha".into(),
        is_active: false,
    };
    let restored = factory.create_from_database(&row);
    assert_eq!(restored.id(), 12);
    assert_eq!(restored.path(), std::path::Path::new("/srv/alpha"));
    assert!(!restored.is_enabled());
}

#[test]
fn test_builtin_factories_honour_contract() {
    let launcher = Arc::new(RecordingLauncher::new());
    let registry = builtin_registry(&PlatformsConfig::default(), launcher);
    assert_eq!(registry.len(), 3);

    for name in registry.names() {
        let factory = registry.factory(name).unwrap();
        let fresh = factory.create_default();
        assert!(fresh.id() < 0, "{name} default is persisted");
        assert!(fresh.is_enabled(), "{name} default is disabled");
        assert_eq!(fresh.name(), factory.platform_name());

        let row = PlatformRow {
            id: 21,
            name: name.to_string(),
            description: "stored".into(),
            path: "/srv/games".into(),
            is_active: false,
        };
        let restored = factory.create_from_database(&row);
        assert_eq!(restored.id(), 21);
        assert_eq!(restored.name(), name);
        assert!(!restored.is_enabled());
    }
}

#[test]
fn test_registry_enumeration() {
    let mut registry = PlatformRegistry::new();
    registry.register(Arc::new(MockFactory::new("Alpha")));
    registry.register(Arc::new(MockFactory::new("Beta")));

    let rows = vec![
        PlatformRow {
            id: 4,
            name: "Beta".into(),
            description: String::new(),
            path: "/beta".into(),
            is_active: true,
        },
        PlatformRow {
            id: 5,
            name: "Removed".into(),
            description: String::new(),
            path: "/gone".into(),
            is_active: true,
        },
    ];

    let platforms = registry.enumerate_platforms(&rows);
    assert_eq!(platforms.len(), 2);

    let alpha = platforms.iter().find(|p| p.name() == "Alpha").unwrap();
    let beta = platforms.iter().find(|p| p.name() == "Beta").unwrap();
    assert!(!alpha.is_persisted());
    assert_eq!(beta.id(), 4);
}

#[test]
fn test_sqlite_reconcile_round() {
    let dir = tempfile::tempdir().unwrap();
    let db = GameDatabase::open(dir.path().join("library.db")).unwrap();

    let mut registry = PlatformRegistry::new();
    let scanner = Arc::new(MockScanner::new().with_installed(vec![
        GameRecord::new(0, "a", "A"),
        GameRecord::new(0, "b", "B").with_tag("rpg"),
    ]));
    registry.register(Arc::new(MockFactory::with_scanner("Alpha", scanner.clone())));

    let mut library = gamehub_library::Library::open(db, &registry).unwrap();
    let id = library.platforms()[0].id();
    assert!(id > 0);

    library
        .scan_platform("Alpha", &ScanContext::default())
        .unwrap();
    assert_eq!(library.store().load_games(id).unwrap().len(), 2);

    scanner.set_installed(vec![GameRecord::new(0, "b", "B").with_tag("rpg")]);
    let report = library
        .scan_platform("Alpha", &ScanContext::default())
        .unwrap();
    assert_eq!(keys(report.removed), vec!["a"]);

    let stored: HashSet<GameRecord> = library.store().load_games(id).unwrap();
    assert_eq!(keys(stored), vec!["b"]);
    let alpha = library.platform(id).unwrap();
    assert_eq!(alpha.games().get("rpg").map(|s| s.len()), Some(1));
    assert!(alpha.games().get("default").unwrap().is_empty());
}
