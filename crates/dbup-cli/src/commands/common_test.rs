use super::*;

fn write_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("dbup.yml"), body).unwrap();
}

fn global(dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.display().to_string(),
        config: None,
    }
}

const DUCKDB_CONFIG: &str = "source_directory: source
updates:
  enable_databases: 5
databases:
  auth:
    type: duckdb
    connection: ':memory:'
  world:
    type: duckdb
    connection: ':memory:'
  characters:
    type: duckdb
    connection: ':memory:'
";

#[test]
fn test_load_config_resolves_source_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), DUCKDB_CONFIG);

    let config = load_config(&global(dir.path())).unwrap();
    assert_eq!(config.source_directory, dir.path().join("source"));
}

#[test]
fn test_load_config_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("etc");
    std::fs::create_dir_all(&nested).unwrap();
    write_config(&nested, DUCKDB_CONFIG);

    let mut args = global(dir.path());
    args.config = Some(nested.join("dbup.yml").display().to_string());
    let config = load_config(&args).unwrap();
    assert_eq!(config.source_directory, nested.join("source"));
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&global(dir.path())).unwrap_err();
    assert!(format!("{err:#}").contains("dbup.yml"));
}

#[test]
fn test_select_databases_uses_mask_by_default() {
    let config = Config::from_yaml(DUCKDB_CONFIG).unwrap();
    let kinds = select_databases(&config, &[]).unwrap();
    assert_eq!(kinds, vec![DatabaseKind::Auth, DatabaseKind::World]);
}

#[test]
fn test_select_databases_explicit_sorted_and_deduped() {
    let config = Config::from_yaml(DUCKDB_CONFIG).unwrap();
    let kinds = select_databases(
        &config,
        &[
            DatabaseKind::World,
            DatabaseKind::Characters,
            DatabaseKind::World,
        ],
    )
    .unwrap();
    assert_eq!(kinds, vec![DatabaseKind::Characters, DatabaseKind::World]);
}

#[test]
fn test_select_databases_rejects_unconfigured() {
    let config = Config::from_yaml(DUCKDB_CONFIG).unwrap();
    assert!(select_databases(&config, &[DatabaseKind::Hotfixes]).is_err());
}

#[test]
fn test_connect_duckdb_backend() {
    let config = Config::from_yaml(DUCKDB_CONFIG).unwrap();
    let backend = Backend::connect(&config, DatabaseKind::Auth).unwrap();
    assert!(matches!(backend, Backend::DuckDb(_)));
    assert_eq!(backend.db().db_type(), "duckdb");
}

#[test]
fn test_connect_unconfigured_kind_fails() {
    let config = Config::from_yaml(DUCKDB_CONFIG).unwrap();
    assert!(Backend::connect(&config, DatabaseKind::Hotfixes).is_err());
}
