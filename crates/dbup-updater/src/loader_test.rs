use super::*;
use crate::confirm::NonInteractive;
use crate::test_utils::{FakeDownloader, RecordingRunner, SourceTree};
use dbup_db::Database;

fn config(tree: &SourceTree, extra: &str) -> Config {
    Config::from_yaml(&format!(
        "source_directory: '{}'
updates:
  enable_databases: 3
{extra}
databases:
  auth:
    type: duckdb
    connection: ':memory:'
  characters:
    type: duckdb
    connection: ':memory:'
",
        tree.root().display()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_load_populates_then_updates_in_order() {
    let tree = SourceTree::new();
    tree.write_base(DatabaseKind::Auth, "CREATE TABLE account (id INTEGER);");
    tree.write_update(
        DatabaseKind::Auth,
        "2024_01_01_00_auth.sql",
        "INSERT INTO account VALUES (1);",
    );
    tree.write_base(DatabaseKind::Characters, "CREATE TABLE characters (guid INTEGER);");
    tree.create_updates_dir(DatabaseKind::Characters);

    let config = config(&tree, "");
    let auth = RecordingRunner::new();
    let chars = RecordingRunner::new();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let targets = [
        DatabaseTarget {
            kind: DatabaseKind::Characters,
            db: chars.db(),
            runner: &chars,
        },
        DatabaseTarget {
            kind: DatabaseKind::Auth,
            db: auth.db(),
            runner: &auth,
        },
    ];
    assert!(loader.load(&targets).await);

    assert_eq!(
        auth.applied(),
        vec!["auth_database.sql", "2024_01_01_00_auth.sql"]
    );
    assert_eq!(chars.applied(), vec!["characters_database.sql"]);
    let rows = auth.db().query_rows("SELECT id FROM account").await.unwrap();
    assert_eq!(rows, vec![vec!["1"]]);
}

#[tokio::test]
async fn test_load_stops_at_first_failure() {
    let tree = SourceTree::new();
    tree.write_base(DatabaseKind::Auth, "CREATE TABLE account (id INTEGER);");
    tree.write_update(DatabaseKind::Auth, "2024_01_01_00_auth.sql", "BROKEN SQL;");
    tree.write_base(DatabaseKind::Characters, "CREATE TABLE characters (guid INTEGER);");
    tree.create_updates_dir(DatabaseKind::Characters);

    let config = config(&tree, "");
    let auth = RecordingRunner::new();
    let chars = RecordingRunner::new();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let targets = [
        DatabaseTarget {
            kind: DatabaseKind::Auth,
            db: auth.db(),
            runner: &auth,
        },
        DatabaseTarget {
            kind: DatabaseKind::Characters,
            db: chars.db(),
            runner: &chars,
        },
    ];
    assert!(!loader.load(&targets).await);
    assert!(chars.applied().is_empty());
}

#[tokio::test]
async fn test_disabled_kind_is_skipped() {
    let tree = SourceTree::new();
    let config = config(&tree, "");
    let world = RecordingRunner::new();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let target = DatabaseTarget {
        kind: DatabaseKind::World,
        db: world.db(),
        runner: &world,
    };
    assert!(loader.load_one(&target).await);
    assert!(world.applied().is_empty());
}

#[tokio::test]
async fn test_auto_setup_off_skips_population() {
    let tree = SourceTree::new();
    tree.write_base(DatabaseKind::Auth, "CREATE TABLE account (id INTEGER);");
    tree.create_updates_dir(DatabaseKind::Auth);

    let config = config(&tree, "  auto_setup: false");
    let auth = RecordingRunner::new();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let target = DatabaseTarget {
        kind: DatabaseKind::Auth,
        db: auth.db(),
        runner: &auth,
    };
    assert!(loader.load_one(&target).await);
    assert!(auth.applied().is_empty());
}

#[tokio::test]
async fn test_per_database_updates_switch() {
    let tree = SourceTree::new();
    tree.write_update(DatabaseKind::Auth, "2024_01_01_00_auth.sql", "SELECT 1;");
    let config = Config::from_yaml(&format!(
        "source_directory: '{}'
updates:
  auto_setup: false
databases:
  auth:
    type: duckdb
    connection: ':memory:'
    updates: false
",
        tree.root().display()
    ))
    .unwrap();
    let auth = RecordingRunner::new();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let target = DatabaseTarget {
        kind: DatabaseKind::Auth,
        db: auth.db(),
        runner: &auth,
    };
    assert!(loader.load_one(&target).await);
    assert!(auth.applied().is_empty());
}

#[test]
fn test_settings_for_reads_config() {
    let tree = SourceTree::new();
    let config = Config::from_yaml(&format!(
        "source_directory: '{}'
allow_auto_db_update: true
updates:
  clean_dead_ref_max_count: -1
databases:
  world:
    type: duckdb
    connection: world.duckdb
    baseline_url: https://example.org/world.sql
",
        tree.root().display()
    ))
    .unwrap();
    let downloader = FakeDownloader::failing();
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let settings = loader.settings_for(DatabaseKind::World);
    assert!(settings.automatic);
    assert_eq!(settings.options.clean_dead_ref_max_count, -1);
    assert_eq!(
        settings.baseline_url.as_deref(),
        Some("https://example.org/world.sql")
    );
    assert_eq!(loader.settings_for(DatabaseKind::Auth).baseline_url, None);
}
