use manifest_core::db::open_db_in_memory;
use manifest_core::{
    AccountRepository, AnnualData, AnnualRepository, DimensionConfig, DimensionData,
    SqliteAccountRepository, SqliteAnnualRepository, SqliteSystemRepository, SystemData,
    SystemRepository, Task,
};
use rusqlite::Connection;

const ALL_TABLES: [&str; 8] = [
    "annual_data",
    "dimension_configs",
    "dimension_data",
    "quarterly_goals",
    "monthly_tasks",
    "tasks",
    "accounts",
    "config",
];

fn year_with_tasks(year: &str, task_ids: &[&str]) -> AnnualData {
    let mut annual = AnnualData::new(year);
    annual.total_score = 10.0;
    annual.dimension_configs.push(DimensionConfig {
        key: "health".to_string(),
        title: "Health".to_string(),
        is_default: true,
        ..DimensionConfig::default()
    });
    let mut health = DimensionData::default();
    health.quarterly_goals[3] = format!("{year} Q4");
    for (month, id) in task_ids.iter().enumerate() {
        health.monthly_tasks[month].push(Task::new(*id, format!("task {id}")));
    }
    annual.dimensions.insert("health".to_string(), health);
    annual
}

fn snapshot(entries: Vec<AnnualData>) -> SystemData {
    entries
        .into_iter()
        .map(|annual| (annual.year.clone(), annual))
        .collect()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn seed(conn: &Connection) {
    let annual = SqliteAnnualRepository::try_new(conn).unwrap();
    annual
        .save_annual_data(&year_with_tasks("2023", &["old-1", "old-2"]))
        .unwrap();
    let accounts = SqliteAccountRepository::try_new(conn).unwrap();
    let account = accounts.create_account("alice", "avatars/a.png").unwrap();
    accounts.switch_account(&account.id).unwrap();
}

#[test]
fn reset_empties_every_table_including_profiles() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    for table in ALL_TABLES {
        assert!(count(&conn, table) > 0, "{table} should be seeded");
    }

    SqliteSystemRepository::try_new(&conn)
        .unwrap()
        .reset_all()
        .unwrap();

    for table in ALL_TABLES {
        assert_eq!(count(&conn, table), 0, "{table}");
    }
}

#[test]
fn import_replaces_planning_data_and_keeps_profiles() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let accounts_before = accounts.list_accounts().unwrap();
    let last_used_before = accounts.last_used_account().unwrap();

    let incoming = snapshot(vec![
        year_with_tasks("2024", &["a", "b"]),
        year_with_tasks("2025", &["c"]),
    ]);
    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    system.import_all(&incoming).unwrap();

    assert_eq!(system.export_all().unwrap(), incoming);
    assert_eq!(count(&conn, "tasks"), 3);
    assert_eq!(accounts.list_accounts().unwrap(), accounts_before);
    assert_eq!(accounts.last_used_account().unwrap(), last_used_before);
}

#[test]
fn import_keys_years_by_snapshot_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut incoming = SystemData::new();
    incoming.insert("2030".to_string(), year_with_tasks("ignored", &[]));

    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    system.import_all(&incoming).unwrap();

    let exported = system.export_all().unwrap();
    assert_eq!(exported["2030"].year, "2030");
}

#[test]
fn export_with_task_shared_across_months_and_years_reimports() {
    let conn = open_db_in_memory().unwrap();
    let annual_repo = SqliteAnnualRepository::try_new(&conn).unwrap();
    let mut first = year_with_tasks("2024", &["shared"]);
    first.dimensions.get_mut("health").unwrap().monthly_tasks[1]
        .push(Task::new("shared", "task shared"));
    annual_repo.save_annual_data(&first).unwrap();
    annual_repo
        .save_annual_data(&year_with_tasks("2025", &["shared"]))
        .unwrap();

    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    let exported = system.export_all().unwrap();
    assert_eq!(exported["2024"].dimensions["health"].task_count(), 2);

    system.import_all(&exported).unwrap();

    assert_eq!(system.export_all().unwrap(), exported);
    assert_eq!(count(&conn, "tasks"), 1);
    assert_eq!(count(&conn, "monthly_tasks"), 3);
}

#[test]
fn import_with_duplicate_config_key_fails_and_keeps_previous_data() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    let before = system.export_all().unwrap();

    let mut annual = year_with_tasks("2024", &["a"]);
    let duplicate = annual.dimension_configs[0].clone();
    annual.dimension_configs.push(duplicate);
    let err = system.import_all(&snapshot(vec![annual])).unwrap_err();

    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert_eq!(system.export_all().unwrap(), before);
    assert_eq!(count(&conn, "accounts"), 1);
}

#[test]
fn import_of_empty_snapshot_clears_planning_tables() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);

    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    system.import_all(&SystemData::new()).unwrap();

    for table in &ALL_TABLES[..6] {
        assert_eq!(count(&conn, table), 0, "{table}");
    }
    assert_eq!(count(&conn, "accounts"), 1);
    assert_eq!(count(&conn, "config"), 1);
}

#[test]
fn export_snapshot_survives_json_roundtrip_and_reimport() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let system = SqliteSystemRepository::try_new(&conn).unwrap();
    let exported = system.export_all().unwrap();

    let text = serde_json::to_string_pretty(&exported).unwrap();
    let parsed: SystemData = serde_json::from_str(&text).unwrap();
    system.import_all(&parsed).unwrap();

    assert_eq!(system.export_all().unwrap(), exported);
}
