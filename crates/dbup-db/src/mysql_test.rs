use super::*;

fn tcp_info() -> ConnectionInfo {
    ConnectionInfo::parse("auth", "127.0.0.1;3306;trinity;s3cret;auth").unwrap()
}

#[test]
fn test_connection_args_tcp() {
    let args = connection_args(&tcp_info());
    assert_eq!(
        args,
        vec![
            "-h127.0.0.1",
            "-utrinity",
            "-P3306",
            "--default-character-set=utf8mb4",
            "--max-allowed-packet=1GB",
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_connection_args_socket() {
    let info =
        ConnectionInfo::parse("auth", "localhost;/run/mysqld/mysqld.sock;u;p;auth").unwrap();
    let args = connection_args(&info);
    assert!(args.contains(&"-P0".to_string()));
    assert!(args.contains(&"--protocol=SOCKET".to_string()));
    assert!(args.contains(&"-S/run/mysqld/mysqld.sock".to_string()));
}

#[test]
fn test_connection_args_tls() {
    let info = ConnectionInfo::parse("auth", "db;3306;u;p;auth;ssl").unwrap();
    assert!(connection_args(&info).contains(&"--ssl-mode=REQUIRED".to_string()));
}

#[test]
fn test_password_never_in_args() {
    let info = tcp_info();
    let file = file_args(&info, Path::new("/tmp/001.sql"));
    let query = query_args(&info, "SHOW TABLES");
    assert!(file.iter().chain(query.iter()).all(|a| !a.contains("s3cret")));
}

#[test]
fn test_file_args_wrap_source_in_transaction() {
    let args = file_args(&tcp_info(), Path::new("/src/sql/updates/auth/001.sql"));
    let n = args.len();
    assert_eq!(args[n - 3], "-e");
    assert_eq!(args[n - 2], "BEGIN; SOURCE /src/sql/updates/auth/001.sql; COMMIT;");
    assert_eq!(args[n - 1], "auth");
}

#[test]
fn test_file_args_without_database() {
    let info = tcp_info().without_database();
    let args = file_args(&info, Path::new("create.sql"));
    assert_eq!(args.last().unwrap(), "BEGIN; SOURCE create.sql; COMMIT;");
}

#[test]
fn test_parse_batch_output() {
    let rows = parse_batch_output("001.sql\tabc\tRELEASED\n002.sql\t\tARCHIVED\n");
    assert_eq!(
        rows,
        vec![
            vec!["001.sql", "abc", "RELEASED"],
            vec!["002.sql", "", "ARCHIVED"],
        ]
    );
    assert!(parse_batch_output("").is_empty());
}

#[test]
fn test_find_executable_prefers_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("mysql-custom");
    std::fs::write(&exe, "").unwrap();
    let found = find_executable(Some(&exe)).unwrap();
    assert!(found.ends_with("mysql-custom"));
}

#[test]
fn test_search_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let empty = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MYSQL_BINARY), "").unwrap();

    let found = search_dirs(
        MYSQL_BINARY,
        vec![empty.path().to_path_buf(), dir.path().to_path_buf()],
    );
    assert_eq!(found, Some(dir.path().join(MYSQL_BINARY)));
    assert_eq!(search_dirs(MYSQL_BINARY, vec![empty.path().to_path_buf()]), None);
}

#[cfg(unix)]
fn fake_client(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let exe = dir.join("fake-mysql");
    std::fs::write(&exe, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
    exe
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_file_passes_password_through_environment() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("invocation.log");
    let exe = fake_client(
        dir.path(),
        &format!(
            "echo \"pwd=$MYSQL_PWD\" > {log}\necho \"args=$*\" >> {log}\nexit 0",
            log = log.display()
        ),
    );

    let client = MysqlClient::new(exe, tcp_info());
    let status = client
        .run_file(&tcp_info(), Path::new("/tmp/001.sql"))
        .await
        .unwrap();
    assert_eq!(status, 0);

    let logged = std::fs::read_to_string(&log).unwrap();
    assert!(logged.contains("pwd=s3cret"));
    let args_line = logged.lines().find(|l| l.starts_with("args=")).unwrap();
    assert!(!args_line.contains("s3cret"));
    assert!(args_line.contains("SOURCE /tmp/001.sql"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_file_returns_client_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_client(dir.path(), "echo 'ERROR 1064' >&2\nexit 3");
    let client = MysqlClient::new(exe, tcp_info());
    let status = client
        .run_file(&tcp_info(), Path::new("/tmp/bad.sql"))
        .await
        .unwrap();
    assert_eq!(status, 3);
}

#[cfg(unix)]
#[tokio::test]
async fn test_query_rows_and_database_exists() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_client(dir.path(), "printf 'account\\nrealmlist\\n'");
    let client = MysqlClient::new(exe, tcp_info());

    assert_eq!(
        client.list_tables().await.unwrap(),
        vec!["account", "realmlist"]
    );
    assert!(client.database_exists().await.unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_query_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_client(dir.path(), "echo 'ERROR 1146: no such table' >&2\nexit 1");
    let client = MysqlClient::new(exe, tcp_info());
    let err = client.query_rows("SELECT * FROM nope").await.unwrap_err();
    assert!(err.to_string().contains("1146"));
}

#[test]
fn test_spawn_failure_is_process_error() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let client = MysqlClient::new(PathBuf::from("/definitely/not/mysql"), tcp_info());
    let err = runtime
        .block_on(client.run_file(&tcp_info(), Path::new("x.sql")))
        .unwrap_err();
    assert!(matches!(err, DbError::ProcessError { .. }));
}
