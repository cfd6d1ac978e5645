use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "flagquest-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_flagquest-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("daily"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_every_scenario_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_flagquest-tester");
    let output_path = temp_path("all");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "all",
            "--seeds",
            "1,today",
            "--iterations",
            "2",
            "--today",
            "2026-10-16",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stdout)
    );
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = report.as_array().expect("array of results");
    assert_eq!(results.len(), 11 * 2);
    assert!(results.iter().all(|r| r["passed"] == true));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_fails_when_rules_file_is_missing() {
    let exe = env!("CARGO_BIN_EXE_flagquest-tester");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "smoke",
            "--iterations",
            "1",
            "--today",
            "2026-10-16",
            "--report",
            "markdown",
            "--rules",
        ])
        .arg(temp_path("missing-rules"))
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FlagQuest Automated Tester"));
    assert!(stdout.contains("FAIL") || stdout.contains("❌"));
}

#[test]
fn cli_rejects_a_bad_date() {
    let exe = env!("CARGO_BIN_EXE_flagquest-tester");
    let output = Command::new(exe)
        .args(["--today", "16/10/2026", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
