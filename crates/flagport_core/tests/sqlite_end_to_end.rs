use flagport_core::db::open_db_in_memory;
use flagport_core::{
    FeatureFlagsMigrator, FeatureStatesMigrator, Migrator, SqliteEntityResolver, SqliteFlagDriver,
    SqliteSourceConnection, TagResolverRegistry,
};
use rusqlite::{params, Connection};

fn open_source_with_users(user_ids: &[i64]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE feature_flags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            scope TEXT,
            value TEXT
        );
        CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            email TEXT
        );",
    )
    .unwrap();
    for id in user_ids {
        conn.execute(
            "INSERT INTO users (id, email) VALUES (?1, ?2);",
            params![id, format!("user{id}@example.test")],
        )
        .unwrap();
    }
    conn
}

fn insert_flag(conn: &Connection, name: &str, scope: &str, value: &str) {
    conn.execute(
        "INSERT INTO feature_flags (name, scope, value) VALUES (?1, ?2, ?3);",
        params![name, scope, value],
    )
    .unwrap();
}

fn user_registry(conn: &Connection) -> TagResolverRegistry<'_> {
    let mut registry = TagResolverRegistry::new();
    registry.register(
        "App\\User",
        SqliteEntityResolver::try_new(conn, "users", "user").unwrap(),
    );
    registry
}

fn target_rows(conn: &Connection, feature: &str) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT scope, value FROM flags WHERE feature = ?1 ORDER BY scope;")
        .unwrap();
    let rows = stmt
        .query_map(params![feature], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .unwrap();
    rows.map(Result::unwrap).collect()
}

#[test]
fn migrates_global_and_entity_records_into_target_store() {
    let source = open_source_with_users(&[7]);
    insert_flag(&source, "beta", "null", "true");
    insert_flag(&source, "beta", "App\\User|7", "\"on\"");
    let target = open_db_in_memory().unwrap();

    let mut migrator = FeatureFlagsMigrator::new(
        SqliteSourceConnection::new(&source),
        user_registry(&source),
        SqliteFlagDriver::new(&target),
    );
    migrator.migrate().unwrap();

    let stats = migrator.statistics();
    assert_eq!(stats.features, 1);
    assert_eq!(stats.contexts, 2);
    assert!(stats.errors.is_empty());

    assert_eq!(
        target_rows(&target, "beta"),
        vec![
            ("null".to_string(), "true".to_string()),
            ("user|7".to_string(), "\"on\"".to_string()),
        ]
    );
}

#[test]
fn global_write_rewrites_existing_per_context_rows() {
    let source = open_source_with_users(&[]);
    insert_flag(&source, "beta", "null", "true");
    let target = open_db_in_memory().unwrap();
    target
        .execute(
            "INSERT INTO flags (feature, scope, value) VALUES ('beta', 'team-1', 'false');",
            [],
        )
        .unwrap();

    let mut migrator = FeatureFlagsMigrator::new(
        SqliteSourceConnection::new(&source),
        user_registry(&source),
        SqliteFlagDriver::new(&target),
    );
    migrator.migrate().unwrap();

    assert_eq!(
        target_rows(&target, "beta"),
        vec![
            ("null".to_string(), "true".to_string()),
            ("team-1".to_string(), "true".to_string()),
        ]
    );
}

#[test]
fn missing_entity_row_is_a_per_context_error() {
    let source = open_source_with_users(&[7]);
    insert_flag(&source, "beta", "App\\User|99", "true");
    let target = open_db_in_memory().unwrap();

    let mut migrator = FeatureFlagsMigrator::new(
        SqliteSourceConnection::new(&source),
        user_registry(&source),
        SqliteFlagDriver::new(&target),
    );
    migrator.migrate().unwrap();

    let stats = migrator.statistics();
    assert_eq!(stats.features, 0);
    assert_eq!(stats.contexts, 0);
    assert_eq!(stats.errors.len(), 1);
    assert!(stats.errors[0].contains("App\\User|99"));
    assert!(target_rows(&target, "beta").is_empty());
}

#[test]
fn missing_source_table_fails_the_run() {
    // No feature_flags table at all.
    let source = Connection::open_in_memory().unwrap();
    let target = open_db_in_memory().unwrap();

    let mut migrator = FeatureFlagsMigrator::new(
        SqliteSourceConnection::new(&source),
        TagResolverRegistry::new(),
        SqliteFlagDriver::new(&target),
    );
    migrator.migrate().unwrap_err();

    let stats = migrator.statistics();
    assert_eq!(stats.features, 0);
    assert_eq!(stats.contexts, 0);
    assert_eq!(stats.errors.len(), 1);
    assert!(stats.errors[0].starts_with("Migration failed: "));
}

#[test]
fn feature_states_on_off_literals_land_as_json_booleans() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE feature_states (
                feature TEXT,
                context_scope TEXT,
                state TEXT
            );
            INSERT INTO feature_states (feature, context_scope, state)
            VALUES ('dark-mode', 'null', 'on'), ('dark-mode', 'team-7', 'off');",
        )
        .unwrap();
    let target = open_db_in_memory().unwrap();

    let mut migrator = FeatureStatesMigrator::new(
        SqliteSourceConnection::new(&source),
        TagResolverRegistry::new(),
        SqliteFlagDriver::new(&target),
    );
    migrator.migrate().unwrap();

    let stats = migrator.statistics();
    assert_eq!(stats.features, 1);
    assert_eq!(stats.contexts, 2);

    assert_eq!(
        target_rows(&target, "dark-mode"),
        vec![
            ("null".to_string(), "true".to_string()),
            ("team-7".to_string(), "false".to_string()),
        ]
    );
}
