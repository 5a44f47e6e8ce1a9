//! Integration tests for the `asesoria plan` CLI commands.
//!
//! These run the compiled binary against an isolated temporary database and
//! check exit status and output.

use std::process::Output;

use chrono::{Days, Local, NaiveDate};
use serde_json::Value;
use tokio::process::Command;

use asesoria_db::queries::plans::{self as plan_queries, NewModernPlan};
use asesoria_test_utils::{create_test_db, create_test_user, drop_test_db, test_db_url};

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

async fn asesoria(db_url: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asesoria"))
        .arg("--database-url")
        .arg(db_url)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .await
        .expect("failed to run asesoria binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", stdout(output)))
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

async fn create_plan(db_url: &str, user: i64, topic: &str, notes: &str) -> i64 {
    let user = user.to_string();
    let date = today();
    let output = asesoria(
        db_url,
        &[
            "--json", "plan", "create", "--user", &user, "--topic", topic, "--notes", notes,
            "--date", &date,
        ],
    )
    .await;
    assert!(output.status.success(), "create failed: {}", stderr(&output));
    json(&output)["id"].as_i64().expect("id should be a number")
}

fn feed_ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .expect("feed should be an array")
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_feed_join_scenario() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;
    let viewer = create_test_user(&pool, "Luis", "Paz").await;
    let viewer_id = viewer.id.to_string();

    let id = create_plan(&url, author.id, "Paris", "Need a French tutor").await;
    let id_arg = id.to_string();

    let show = asesoria(&url, &["plan", "show", &id_arg]).await;
    assert!(show.status.success(), "show failed: {}", stderr(&show));
    let text = stdout(&show);
    assert!(text.contains("Paris"), "{text}");
    assert!(text.contains("Need a French tutor"), "{text}");
    assert!(text.contains("Ana Ruiz"), "{text}");

    let feed = asesoria(&url, &["--json", "plan", "feed", "--user", &viewer_id]).await;
    assert!(feed_ids(&json(&feed)).contains(&id));

    let join = asesoria(&url, &["plan", "join", "--user", &viewer_id, &id_arg]).await;
    assert!(join.status.success(), "join failed: {}", stderr(&join));

    let feed = asesoria(&url, &["--json", "plan", "feed", "--user", &viewer_id]).await;
    assert!(!feed_ids(&json(&feed)).contains(&id));

    let show = asesoria(&url, &["--json", "plan", "show", &id_arg]).await;
    let users = json(&show)["joined_users"].clone();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["usuario_id"].as_i64(), Some(viewer.id));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn invalid_form_is_rejected_with_all_messages() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;
    let user = author.id.to_string();
    let yesterday = Local::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    let long_notes = "x".repeat(51);

    let output = asesoria(
        &url,
        &[
            "plan", "create", "--user", &user, "--notes", &long_notes, "--date", &yesterday,
            "--hours", "0",
        ],
    )
    .await;

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Debes seleccionar un tema"), "{err}");
    assert!(err.contains("Las notas no pueden tener más de 50 caracteres"), "{err}");
    assert!(err.contains("La duración debe ser un número positivo"), "{err}");
    assert!(err.contains("No puedes seleccionar una fecha en el pasado"), "{err}");

    let mine = asesoria(&url, &["--json", "plan", "mine", "--user", &user]).await;
    assert_eq!(json(&mine), Value::Array(vec![]));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn only_the_author_may_cancel_update_or_delete() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;
    let other = create_test_user(&pool, "Luis", "Paz").await;
    let other_id = other.id.to_string();
    let author_id = author.id.to_string();

    let id = create_plan(&url, author.id, "Rust", "traits").await;
    let id_arg = id.to_string();

    for cmd in ["cancel", "delete"] {
        let output = asesoria(&url, &["plan", cmd, "--user", &other_id, &id_arg]).await;
        assert!(!output.status.success(), "{cmd} by non-author should fail");
        assert!(stderr(&output).contains("no tiene permisos"), "{}", stderr(&output));
    }

    let date = today();
    let output = asesoria(
        &url,
        &[
            "plan", "update", "--user", &other_id, &id_arg, "--topic", "Go", "--notes", "x",
            "--date", &date,
        ],
    )
    .await;
    assert!(!output.status.success());

    let cancel = asesoria(&url, &["plan", "cancel", "--user", &author_id, &id_arg]).await;
    assert!(cancel.status.success(), "{}", stderr(&cancel));
    assert!(stdout(&cancel).contains("cancelada"));

    let again = asesoria(&url, &["plan", "cancel", "--user", &author_id, &id_arg]).await;
    assert!(again.status.success());
    assert!(stdout(&again).contains("ya estaba cancelada"));

    let delete = asesoria(&url, &["plan", "delete", "--user", &author_id, &id_arg]).await;
    assert!(delete.status.success(), "{}", stderr(&delete));

    let show = asesoria(&url, &["plan", "show", &id_arg]).await;
    assert!(!show.status.success());
    assert!(stderr(&show).contains(&format!("asesoría {id} no encontrada")));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn schedule_lists_own_and_joined_plans() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let me = create_test_user(&pool, "Vera", "Sol").await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;
    let me_id = me.id.to_string();

    let mine = create_plan(&url, me.id, "Mine", "own").await;
    let theirs = create_plan(&url, author.id, "Theirs", "x").await;
    let join = asesoria(&url, &["plan", "join", "--user", &me_id, &theirs.to_string()]).await;
    assert!(join.status.success(), "{}", stderr(&join));

    let output = asesoria(&url, &["--json", "plan", "schedule", "--user", &me_id]).await;
    assert!(output.status.success(), "{}", stderr(&output));
    let entries = json(&output);
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"].as_i64(), Some(theirs));
    assert_eq!(entries[0]["es_propio"], Value::Bool(false));
    assert_eq!(entries[1]["id"].as_i64(), Some(mine));
    assert_eq!(entries[1]["es_propio"], Value::Bool(true));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn joining_own_plan_is_refused() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;

    let id = create_plan(&url, author.id, "Rust", "traits").await;
    let output = asesoria(
        &url,
        &["plan", "join", "--user", &author.id.to_string(), &id.to_string()],
    )
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no puede unirse"), "{}", stderr(&output));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn show_lists_no_participants_for_a_colliding_modern_plan() {
    let (pool, db_name) = create_test_db().await;
    let url = test_db_url(&db_name).await;
    let author = create_test_user(&pool, "Ana", "Ruiz").await;
    let student = create_test_user(&pool, "Luis", "Paz").await;

    let legacy_id = create_plan(&url, author.id, "Lima", "legacy").await;
    let join = asesoria(
        &url,
        &["plan", "join", "--user", &student.id.to_string(), &legacy_id.to_string()],
    )
    .await;
    assert!(join.status.success(), "{}", stderr(&join));

    // Both tables start their sequences at 1, so this row shadows the legacy plan.
    let start = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
    let modern_id = plan_queries::insert_modern_plan(
        &pool,
        &NewModernPlan {
            destination: "Algebra",
            description: None,
            travel_start_date: start,
            travel_end_date: start,
            plan: "modern notes",
            duracion_horas: Some(2),
            autor_id: author.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(modern_id, legacy_id);

    let show = asesoria(&url, &["--json", "plan", "show", &modern_id.to_string()]).await;
    assert!(show.status.success(), "{}", stderr(&show));
    let value = json(&show);
    assert_eq!(value["plan"]["source"], "modern");
    assert_eq!(value["plan"]["destination"], "Algebra");
    assert_eq!(value["joined_users"], Value::Array(vec![]));

    let show = asesoria(&url, &["plan", "show", &modern_id.to_string()]).await;
    let text = stdout(&show);
    assert!(!text.contains("Luis Paz"), "{text}");
    assert!(text.contains("Nadie se ha unido todavía."), "{text}");

    pool.close().await;
    drop_test_db(&db_name).await;
}
