use super::*;

#[test]
fn test_state_sql_round_values() {
    assert_eq!(UpdateState::Active.as_sql_str(), "RELEASED");
    assert_eq!(
        UpdateState::from_sql_str("ARCHIVED"),
        Some(UpdateState::Archived)
    );
    assert_eq!(UpdateState::from_sql_str("released"), None);
}

#[test]
fn test_load_script_uses_relative_slash_path() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("2024").join("q1");
    std::fs::create_dir_all(&nested).unwrap();
    let file = nested.join("001_init.sql");
    std::fs::write(&file, "CREATE TABLE t (id INT);").unwrap();

    let script = UpdateScript::load(dir.path(), &file, DirectoryClass::Updates).unwrap();
    assert_eq!(script.path, "2024/q1/001_init.sql");
    assert_eq!(script.hash, compute_checksum(b"CREATE TABLE t (id INT);"));
    assert_eq!(script.directory_class, DirectoryClass::Updates);
    assert_eq!(script.location, file);
}

#[test]
fn test_load_keeps_scan_time_hash_only() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.sql");
    std::fs::write(&file, "SELECT 1;").unwrap();

    let script = UpdateScript::load(dir.path(), &file, DirectoryClass::Updates).unwrap();
    std::fs::write(&file, "SELECT 2;").unwrap();

    // The runner reads `location` again; the script only carries the digest
    assert_eq!(script.hash, compute_checksum(b"SELECT 1;"));
    assert_ne!(script.hash, compute_checksum(&std::fs::read(&script.location).unwrap()));
}

#[test]
fn test_load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.sql");
    let err = UpdateScript::load(dir.path(), &missing, DirectoryClass::Updates).unwrap_err();
    assert!(err.to_string().contains("nope.sql"));
}

#[test]
fn test_default_options() {
    let options = UpdateOptions::default();
    assert!(options.redundancy);
    assert!(options.allow_rehash);
    assert!(!options.archived_redundancy);
    assert_eq!(options.clean_dead_ref_max_count, 3);
}
