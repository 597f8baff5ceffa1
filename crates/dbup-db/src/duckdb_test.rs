use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
    assert_eq!(db.connection_info().database, ":memory:");
    assert!(db.database_exists().await.unwrap());
}

#[tokio::test]
async fn test_execute_batch_and_list_tables() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t2 (id INT); CREATE TABLE t1 (id INT);")
        .await
        .unwrap();

    assert_eq!(db.list_tables().await.unwrap(), vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_query_rows_renders_text() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE t (name VARCHAR, n INTEGER, flag BOOLEAN);
         INSERT INTO t VALUES ('a', 7, true), (NULL, NULL, NULL);",
    )
    .await
    .unwrap();

    let rows = db
        .query_rows("SELECT name, n FROM t ORDER BY n NULLS LAST")
        .await
        .unwrap();
    assert_eq!(rows, vec![vec!["a", "7"], vec!["NULL", "NULL"]]);
}

#[tokio::test]
async fn test_execute_reports_failing_sql() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("INSERT INTO missing VALUES (1)").await.unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[tokio::test]
async fn test_run_file_commits_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("001_init.sql");
    std::fs::write(
        &script,
        "CREATE TABLE account (id INT); INSERT INTO account VALUES (1);",
    )
    .unwrap();

    let db = DuckDbBackend::in_memory().unwrap();
    let info = db.connection_info().clone();
    assert_eq!(db.run_file(&info, &script).await.unwrap(), 0);

    let rows = db.run_query(&info, "SELECT COUNT(*) FROM account").await.unwrap();
    assert_eq!(rows, Some(vec![vec!["1".to_string()]]));
}

#[tokio::test]
async fn test_run_file_rolls_back_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("002_broken.sql");
    std::fs::write(
        &script,
        "CREATE TABLE half_done (id INT); INSERT INTO does_not_exist VALUES (1);",
    )
    .unwrap();

    let db = DuckDbBackend::in_memory().unwrap();
    let info = db.connection_info().clone();
    assert_ne!(db.run_file(&info, &script).await.unwrap(), 0);

    // The partial DDL must not survive the failed script.
    assert!(db.list_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_file_missing_script_is_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let db = DuckDbBackend::in_memory().unwrap();
    let info = db.connection_info().clone();
    let status = db
        .run_file(&info, &dir.path().join("absent.sql"))
        .await
        .unwrap();
    assert_ne!(status, 0);
}

#[tokio::test]
async fn test_run_query_without_rows_is_none() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE empty_t (id INT)").await.unwrap();
    let info = db.connection_info().clone();
    assert_eq!(db.run_query(&info, "SELECT * FROM empty_t").await.unwrap(), None);
}

#[tokio::test]
async fn test_from_path_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE realmlist (id INT)").await.unwrap();
    }
    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    assert_eq!(db.list_tables().await.unwrap(), vec!["realmlist"]);
}
