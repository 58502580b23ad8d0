use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!("sortlab-tests-{}-{}", prefix, nonce));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn read_result(dir: &std::path::Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("result.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_cli_output_dir_artifacts() {
    let dir = temp_dir("outputs");
    let output_dir = dir.join("artifacts");

    let output = Command::new(env!("CARGO_BIN_EXE_sortlab"))
        .args([
            "--period-ms",
            "0",
            "--idle-cycles",
            "0",
            "--no-uart-stdout",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let result = read_result(&output_dir);
    assert_eq!(result["type"], "sortlab_run");
    assert_eq!(result["status"], "pass");
    assert_eq!(result["routine"], "reference");
    assert_eq!(result["points"], 50);
    assert_eq!(result["swap"]["total"], 30);
    assert_eq!(result["sort"]["total"], 48);
    assert_eq!(result["corpus_hash"].as_str().unwrap().len(), 64);

    let junit = std::fs::read_to_string(output_dir.join("junit.xml")).unwrap();
    assert!(junit.contains("<testsuite"));
    assert!(junit.contains("<testcase"));
    assert!(!junit.contains("<failure"));

    let uart = std::fs::read_to_string(output_dir.join("uart.log")).unwrap();
    assert!(uart.contains("========= asmSort Tests Summary\r\n"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_failing_routine_still_exits_cleanly() {
    let dir = temp_dir("identity");

    let output = Command::new(env!("CARGO_BIN_EXE_sortlab"))
        .args([
            "--routine",
            "identity",
            "--period-ms",
            "0",
            "--idle-cycles",
            "0",
            "--no-uart-stdout",
            "--output-dir",
            dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    // Failed cases are reported, not turned into an exit code.
    assert!(output.status.success());

    let result = read_result(&dir);
    assert_eq!(result["status"], "fail");
    let swap = &result["swap"];
    assert_eq!(
        swap["passed"].as_u64().unwrap() + swap["failed"].as_u64().unwrap(),
        30
    );

    let junit = std::fs::read_to_string(dir.join("junit.xml")).unwrap();
    assert!(junit.contains("<failure"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_config_and_corpus_files() {
    let dir = temp_dir("config");

    std::fs::write(
        dir.join("tables.yaml"),
        r#"
swap_cases:
  - [5, -5]
sort_cases:
  - [3, -1, 2]
  - [0, 0, 0]
"#,
    )
    .unwrap();

    let config_path = dir.join("harness.yaml");
    std::fs::write(
        &config_path,
        r#"
schema_version: "1.0"
student_name: "Grace"
pacing:
  case_period_ms: 0
  idle_period_ms: 0
scoring:
  auxiliary_policy: enforced
corpus: "tables.yaml"
"#,
    )
    .unwrap();

    let output_dir = dir.join("out");
    let output = Command::new(env!("CARGO_BIN_EXE_sortlab"))
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "--routine",
            "unsigned-only",
            "--idle-cycles",
            "2",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("========= Grace: asmSort.s ALL TESTS COMPLETE!\r\n"));
    assert!(stdout.contains("========= Idle Cycle Counter:      1\r"));

    let result = read_result(&output_dir);
    assert_eq!(result["student"], "Grace");
    assert_eq!(result["auxiliary_policy"], "enforced");
    assert_eq!(result["swap"]["total"], 6);
    assert_eq!(result["sort"]["total"], 12);
    assert_eq!(result["status"], "fail");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_junit_flag_writes_file() {
    let dir = temp_dir("junit");
    let junit_path = dir.join("report.xml");

    let output = Command::new(env!("CARGO_BIN_EXE_sortlab"))
        .args([
            "--period-ms",
            "0",
            "--idle-cycles",
            "0",
            "--no-uart-stdout",
            "--strict",
            "--junit",
            junit_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let junit = std::fs::read_to_string(&junit_path).unwrap();
    assert!(junit.contains(r#"<testsuites name="sortlab" tests="78" failures="0">"#));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_rejects_invalid_corpus() {
    let dir = temp_dir("bad-corpus");
    let corpus = dir.join("tables.yaml");
    std::fs::write(
        &corpus,
        "swap_cases: []\nsort_cases:\n  - [1]\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sortlab"))
        .args(["--corpus", corpus.to_str().unwrap(), "--idle-cycles", "0"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("swap_cases"));

    let _ = std::fs::remove_dir_all(&dir);
}
