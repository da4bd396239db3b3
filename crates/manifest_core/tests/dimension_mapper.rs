use manifest_core::db::open_db_in_memory;
use manifest_core::{
    save_dimension, DimensionData, SqliteDimensionRepository, SqliteTaskRepository, Task,
    TaskRepository, MONTH_COUNT, QUARTER_COUNT,
};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::json;

fn sample_dimension() -> DimensionData {
    let mut data = DimensionData {
        annual_goal: "Run a marathon".to_string(),
        total_score: 42.0,
        completed_tasks: 1,
        total_tasks: 3,
        progress: 33,
        ..DimensionData::default()
    };
    data.quarterly_goals[0] = "Q1 goal".to_string();
    data.quarterly_goals[2] = "Q3 goal".to_string();
    data.monthly_tasks[0].push(Task {
        status: "done".to_string(),
        ..Task::new("t1", "Run")
    });
    data.monthly_tasks[0].push(Task::new("t2", "Stretch"));
    data.monthly_tasks[11].push(Task::new("t3", "Race"));
    data.settings.scoring.completed_score = 10.0;
    data.settings
        .extra
        .insert("layout".to_string(), json!({"columns": 3}));
    data
}

fn save(conn: &Connection, year: &str, key: &str, data: &DimensionData) {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).unwrap();
    save_dimension(&tx, year, key, data).unwrap();
    tx.commit().unwrap();
}

#[test]
fn save_then_load_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let data = sample_dimension();
    save(&conn, "2024", "health", &data);

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let loaded = repo.load_dimension("2024", "health").unwrap().unwrap();
    assert_eq!(loaded, data);
    assert_eq!(loaded.quarterly_goals.len(), QUARTER_COUNT);
    assert_eq!(loaded.monthly_tasks.len(), MONTH_COUNT);
    assert_eq!(loaded.quarterly_goals[1], "");
    assert_eq!(loaded.monthly_tasks[0][0].title, "Run");
    assert_eq!(loaded.monthly_tasks[0][1].title, "Stretch");
}

#[test]
fn load_unknown_dimension_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();

    assert!(repo.load_dimension("2024", "health").unwrap().is_none());
}

#[test]
fn save_always_writes_all_four_quarters() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, "2024", "health", &DimensionData::default());

    let quarters: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM quarterly_goals WHERE year = '2024' AND dimension_key = 'health';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(quarters, QUARTER_COUNT as i64);
}

#[test]
fn resave_replaces_month_associations_and_updates_tasks() {
    let conn = open_db_in_memory().unwrap();
    let mut data = sample_dimension();
    save(&conn, "2024", "health", &data);

    // Move t3 from December to March, edit it, and drop t2.
    let mut moved = data.monthly_tasks[11].remove(0);
    moved.title = "Half marathon".to_string();
    data.monthly_tasks[2].push(moved);
    data.monthly_tasks[0].retain(|task| task.id != "t2");
    data.quarterly_goals[0] = String::new();
    save(&conn, "2024", "health", &data);

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let loaded = repo.load_dimension("2024", "health").unwrap().unwrap();
    assert_eq!(loaded, data);
    assert!(loaded.monthly_tasks[11].is_empty());
    assert_eq!(loaded.monthly_tasks[2][0].title, "Half marathon");
    assert_eq!(loaded.quarterly_goals[0], "");

    // Dropped from the month, but the task record itself survives.
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let fetched = tasks.fetch_tasks(&["t2".to_string()]).unwrap();
    assert_eq!(fetched["t2"].title, "Stretch");
}

#[test]
fn out_of_range_rows_are_ignored_on_load() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, "2024", "health", &sample_dimension());
    SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .upsert_task(&Task::new("stray", "Out of range"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO quarterly_goals (year, dimension_key, quarter, goal)
             VALUES ('2024', 'health', 5, 'fifth quarter');
         INSERT INTO quarterly_goals (year, dimension_key, quarter, goal)
             VALUES ('2024', 'health', -1, 'negative quarter');
         INSERT INTO monthly_tasks (year, dimension_key, month, task_id)
             VALUES ('2024', 'health', 13, 'stray');
         INSERT INTO monthly_tasks (year, dimension_key, month, task_id)
             VALUES ('2024', 'health', 12, 'stray');",
    )
    .unwrap();

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let loaded = repo.load_dimension("2024", "health").unwrap().unwrap();
    assert_eq!(loaded, sample_dimension());
    assert!(loaded.tasks().all(|(_, task)| task.id != "stray"));
}

#[test]
fn dangling_month_association_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, "2024", "health", &sample_dimension());
    conn.execute("DELETE FROM tasks WHERE id = 't2';", []).unwrap();

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let loaded = repo.load_dimension("2024", "health").unwrap().unwrap();
    assert_eq!(loaded.monthly_tasks[0].len(), 1);
    assert_eq!(loaded.monthly_tasks[0][0].id, "t1");
}

#[test]
fn uncommitted_save_leaves_nothing_behind() {
    let conn = open_db_in_memory().unwrap();
    {
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).unwrap();
        save_dimension(&tx, "2024", "health", &sample_dimension()).unwrap();
    }

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    assert!(repo.load_dimension("2024", "health").unwrap().is_none());
    let tasks: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tasks, 0);
}

#[test]
fn list_dimensions_returns_every_key_for_the_year() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, "2024", "health", &sample_dimension());
    save(&conn, "2024", "career", &DimensionData::default());
    save(&conn, "2025", "health", &DimensionData::default());

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let dimensions = repo.list_dimensions("2024").unwrap();
    let keys: Vec<&str> = dimensions.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["career", "health"]);
}

#[test]
fn malformed_settings_surface_as_error() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, "2024", "health", &DimensionData::default());
    conn.execute(
        "UPDATE dimension_data SET settings = 'not json' WHERE dimension_key = 'health';",
        [],
    )
    .unwrap();

    let repo = SqliteDimensionRepository::try_new(&conn).unwrap();
    let err = repo.load_dimension("2024", "health").unwrap_err();
    assert!(matches!(
        err,
        manifest_core::RepoError::Settings {
            table: "dimension_data",
            ..
        }
    ));
}
