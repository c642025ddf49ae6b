//! CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::process::Command;
use tempfile::TempDir;

const DATE: &str = "2024-03-13";

struct Cli {
    dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Invoke a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_planbook"))
            .args(args)
            .env("PLANBOOK_DATA_DIR", self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    /// Invoke a CLI command, expect success and parse stdout as JSON.
    fn json(&self, args: &[&str]) -> serde_json::Value {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
        serde_json::from_str(&stdout).expect("Failed to parse JSON output")
    }

    /// Invoke a CLI command and expect failure; returns stderr.
    fn fail(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run(args);
        assert_ne!(code, 0, "CLI command unexpectedly succeeded: {args:?}");
        stderr
    }
}

#[test]
fn test_help() {
    let cli = Cli::new();
    let (stdout, _, code) = cli.run(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("goal"));
}

#[test]
fn test_plan_lifecycle() {
    let cli = Cli::new();
    let plan = cli.json(&["plan", "create", "--date", DATE, "-t", "Exercise", "-t", "Read"]);
    assert_eq!(plan["counts"]["total"], 2);

    let added = cli.json(&["plan", "add-subtasks", "0", "Stretch", "Run", "--date", DATE]);
    assert_eq!(added["added"], serde_json::json!(["0_0", "0_1"]));

    let task = cli.json(&["task", "set", "0_1", "done", "--date", DATE]);
    assert_eq!(task["status"], "done");
    let task = cli.json(&["task", "toggle", "1", "--date", DATE]);
    assert_eq!(task["status"], "done");

    let shown = cli.json(&["plan", "show", "--date", DATE]);
    assert_eq!(shown["counts"]["completed"], 2);
    assert_eq!(shown["counts"]["total"], 4);
    assert_eq!(shown["percent"], 50);

    let removed = cli.json(&["plan", "remove", "0", "--date", DATE]);
    assert_eq!(removed["removed"], "Exercise");
    let shown = cli.json(&["plan", "show", "--date", DATE]);
    assert_eq!(shown["counts"]["total"], 1);
    assert_eq!(shown["tasks"][0]["status"], "done");

    let dates = cli.json(&["plan", "dates"]);
    assert_eq!(dates, serde_json::json!([DATE]));
}

#[test]
fn test_plan_create_refuses_to_overwrite() {
    let cli = Cli::new();
    cli.json(&["plan", "create", "--date", DATE, "-t", "A"]);
    let stderr = cli.fail(&["plan", "create", "--date", DATE, "-t", "B"]);
    assert!(stderr.contains("already exists"));
    cli.json(&["plan", "create", "--date", DATE, "-t", "B", "--force"]);
}

#[test]
fn test_plan_create_uses_daily_tasks() {
    let cli = Cli::new();
    cli.fail(&["plan", "create", "--date", DATE]);
    let (_, _, code) = cli.run(&["config", "set", "plan.daily_tasks", "Journal,Walk"]);
    assert_eq!(code, 0);
    let plan = cli.json(&["plan", "create", "--date", DATE]);
    assert_eq!(plan["tasks"][1]["name"], "Walk");
}

#[test]
fn test_missing_plan_is_an_error() {
    let cli = Cli::new();
    let stderr = cli.fail(&["plan", "show", "--date", DATE]);
    assert!(stderr.contains("error: plan not found"));
    cli.fail(&["task", "toggle", "0", "--date", DATE]);
}

#[test]
fn test_stats_and_streak() {
    let cli = Cli::new();
    for date in ["2024-03-11", "2024-03-12", DATE] {
        cli.json(&["plan", "create", "--date", date, "-t", "A"]);
        cli.json(&["task", "set", "0", "done", "--date", date]);
    }
    let streak = cli.json(&["stats", "streak", "--date", DATE]);
    assert_eq!(streak["streak"], 3);

    let today = cli.json(&["stats", "today", "--date", DATE]);
    assert_eq!(today["completed"], 1);
    assert_eq!(today["level"], 4);

    let empty = cli.json(&["stats", "today", "--date", "2024-03-01"]);
    assert_eq!(empty["has_plan"], false);
}

#[test]
fn test_calendar_views() {
    let cli = Cli::new();
    cli.json(&["plan", "create", "--date", DATE, "-t", "A", "-t", "B"]);
    cli.json(&["task", "set", "0", "done", "--date", DATE]);

    let (grid, _, code) = cli.run(&["calendar", "show", "--weeks", "2", "--date", DATE]);
    assert_eq!(code, 0);
    assert_eq!(grid.lines().count(), 8);
    assert!(grid.lines().nth(3).unwrap().starts_with("Wed"));

    let calendar = cli.json(&["calendar", "show", "--weeks", "2", "--date", DATE, "--json"]);
    assert_eq!(calendar["weeks"].as_array().unwrap().len(), 2);

    let recent = cli.json(&["calendar", "recent", "--weeks", "1", "--date", DATE]);
    assert_eq!(recent.as_array().unwrap().len(), 7);
    assert_eq!(recent[6]["level"], 3);

    let month = cli.json(&["calendar", "month", "--year", "2024", "--month", "3", "--date", DATE]);
    assert_eq!(month.as_array().unwrap().len(), 13);
}

#[test]
fn test_plan_carry_over() {
    let cli = Cli::new();
    cli.json(&["plan", "create", "--date", "2024-03-12", "-t", "Exercise", "-t", "Taxes", "-t", "Call"]);
    cli.json(&["task", "set", "0", "done", "--date", "2024-03-12"]);

    let unfinished = cli.json(&["plan", "unfinished", "--date", "2024-03-12"]);
    assert_eq!(unfinished[0]["index"], 1);
    assert_eq!(unfinished[1]["name"], "Call");

    cli.json(&["plan", "create", "--date", DATE, "-t", "Read"]);
    let carried = cli.json(&["plan", "carry-over", "2", "--date", DATE]);
    assert_eq!(carried["carried"], serde_json::json!(["1"]));
    cli.fail(&["plan", "carry-over", "0", "--date", DATE]);

    let plan = cli.json(&["plan", "create", "--date", DATE, "-t", "Read", "--force", "--carry-over"]);
    assert_eq!(plan["counts"]["total"], 3);
    assert_eq!(plan["tasks"][1]["name"], "Taxes");
    assert_eq!(plan["tasks"][1]["carried_over_from"], "2024-03-12");
}

#[test]
fn test_daily_log() {
    let cli = Cli::new();
    cli.json(&["plan", "create", "--date", "2024-03-12", "-t", "A", "-t", "B"]);
    cli.json(&["task", "set", "1", "quit", "--date", "2024-03-12"]);
    cli.fail(&["log", "show", "--date", "2024-03-12"]);

    let status = cli.json(&["log", "status", "--date", DATE]);
    assert_eq!(status["summary_required"], true);

    let log = cli.json(&[
        "log", "write", "--date", "2024-03-12", "--from-plan", "--ai-summary", "Quiet day",
    ]);
    assert_eq!(log["summary"], "Quiet day");
    assert_eq!(log["job_reviews"][1]["status"], "quit");

    let shown = cli.json(&["log", "show", "--date", "2024-03-12"]);
    assert_eq!(shown["job_reviews"].as_array().unwrap().len(), 2);
    let status = cli.json(&["log", "status", "--date", DATE]);
    assert_eq!(status["summary_required"], false);
}

#[test]
fn test_todo_list() {
    let cli = Cli::new();
    cli.fail(&["todo", "add", "No deadline"]);
    let later = cli.json(&["todo", "add", "Renew passport", "--deadline", "2999-01-01"]);
    assert_eq!(later["id"], 1);
    let past = cli.json(&["todo", "add", "File taxes", "--deadline", "2000-04-15"]);
    assert_eq!(past["overdue"], true);

    let list = cli.json(&["todo", "list"]);
    assert_eq!(list[0]["title"], "File taxes");
    let overdue = cli.json(&["todo", "list", "--overdue"]);
    assert_eq!(overdue.as_array().unwrap().len(), 1);

    let toggled = cli.json(&["todo", "toggle", "2"]);
    assert_eq!(toggled["completed"], true);
    let overdue = cli.json(&["todo", "list", "--overdue"]);
    assert_eq!(overdue.as_array().unwrap().len(), 0);
    let list = cli.json(&["todo", "list"]);
    assert_eq!(list[0]["title"], "Renew passport");
    assert!(list[1]["completed_at"].is_string());

    cli.json(&["todo", "delete", "1"]);
    cli.fail(&["todo", "toggle", "1"]);
    let next = cli.json(&["todo", "add", "Next", "--deadline", "2999-01-02"]);
    assert_eq!(next["id"], 3);
}

#[test]
fn test_goal_lifecycle() {
    let cli = Cli::new();
    let goal = cli.json(&["goal", "add", "Learn Rust", "--priority", "high"]);
    assert_eq!(goal["id"], "1");
    assert_eq!(goal["stage"], "positive");

    let sub = cli.json(&["goal", "sub", "1", "Read the book"]);
    assert_eq!(sub["id"], "1.1");
    cli.json(&["goal", "sub", "1.1", "Chapter 1"]);
    let stderr = cli.fail(&["goal", "sub", "1.1.1", "Too deep"]);
    assert!(stderr.contains("maximum depth"));

    let update = cli.json(&["goal", "progress", "1", "35"]);
    assert_eq!(update["stage_before"], "positive");
    assert_eq!(update["stage_after"], "current");
    cli.fail(&["goal", "progress", "1", "101"]);
    cli.fail(&["goal", "complete", "1"]);

    cli.json(&["goal", "progress", "1", "100"]);
    let done = cli.json(&["goal", "complete", "1"]);
    assert_eq!(done["status"], "completed");

    cli.json(&["goal", "archive", "1"]);
    let active = cli.json(&["goal", "list"]);
    assert_eq!(active.as_array().unwrap().len(), 0);
    let archived = cli.json(&["goal", "list", "--archived"]);
    assert_eq!(archived[0]["name"], "Learn Rust");

    let next = cli.json(&["goal", "add", "Next"]);
    assert_eq!(next["id"], "2");
}

#[test]
fn test_goal_review() {
    let cli = Cli::new();
    cli.json(&["goal", "add", "Read more"]);
    let due = cli.json(&["goal", "reviews-due"]);
    assert_eq!(due, serde_json::json!(["weekly", "monthly", "yearly"]));

    let review = cli.json(&["goal", "review", "weekly", "--goal", "1=20:steady", "--overall", "ok"]);
    assert_eq!(review["entries"][0]["progress_before"], 0);
    assert_eq!(review["entries"][0]["progress_after"], 20);

    let shown = cli.json(&["goal", "show", "1"]);
    assert_eq!(shown["progress"], 20);
    let due = cli.json(&["goal", "reviews-due"]);
    assert_eq!(due, serde_json::json!(["monthly", "yearly"]));
}

#[test]
fn test_feedback_lifecycle() {
    let cli = Cli::new();
    let mut ids = Vec::new();
    for i in 0..10 {
        let entry = cli.json(&["feedback", "submit", &format!("idea {i}")]);
        ids.push(entry["id"].as_str().unwrap().to_string());
    }
    let stderr = cli.fail(&["feedback", "submit", "one too many"]);
    assert!(stderr.contains("limit: 10"));

    let stderr = cli.fail(&["feedback", "archive", &ids[0]]);
    assert!(stderr.contains("before archiving"));

    cli.json(&["feedback", "status", &ids[0], "implemented"]);
    let archived = cli.json(&["feedback", "archive", &ids[0]]);
    assert!(archived["archived_at"].is_string());
    cli.json(&["feedback", "submit", "fits now"]);

    let pending = cli.json(&["feedback", "list"]);
    assert_eq!(pending.as_array().unwrap().len(), 10);
    let archive = cli.json(&["feedback", "list", "--archived"]);
    assert_eq!(archive.as_array().unwrap().len(), 1);

    cli.json(&["feedback", "delete", &ids[0]]);
    let archive = cli.json(&["feedback", "list", "--archived"]);
    assert_eq!(archive.as_array().unwrap().len(), 0);
}

#[test]
fn test_config_commands() {
    let cli = Cli::new();
    let (stdout, _, code) = cli.run(&["config", "get", "calendar.weeks"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "52");

    cli.fail(&["config", "get", "no.such.key"]);
    cli.fail(&["config", "set", "calendar.weeks", "lots"]);

    let (_, _, code) = cli.run(&["config", "set", "storage.backend", "sqlite"]);
    assert_eq!(code, 0);
    let list = cli.json(&["config", "list"]);
    assert_eq!(list["storage.backend"], "sqlite");

    // The sqlite backend is picked up by the next command.
    cli.json(&["plan", "create", "--date", DATE, "-t", "A"]);
    assert!(cli.dir.path().join("planbook.db").exists());

    let (_, _, code) = cli.run(&["config", "reset"]);
    assert_eq!(code, 0);
    let list = cli.json(&["config", "list"]);
    assert_eq!(list["storage.backend"], "json");
}
