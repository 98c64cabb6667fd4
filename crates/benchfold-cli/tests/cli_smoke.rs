use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "runs": {
      "type": "array",
      "items": {
        "type": "result",
        "properties": {
          "name": { "type": "name" },
          "ms": { "type": "double", "failure": { "value": 100, "compare": ">" } }
        }
      }
    }
  }
}"#;

const CONFIG: &str = r#"
[[threshold]]
test_name = "sort"
method = "delta"
delta = 2.0
"#;

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "benchfold-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_benchfold_in<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_benchfold");
    Command::new(bin)
        .current_dir(dir)
        .env_remove("BENCHFOLD_LOG")
        .args(args)
        .output()
        .expect("benchfold command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// `<root>/schema.json`, `<root>/benchfold.toml`, and builds 1 and 2 under
/// `<root>/builds/<n>/bench.json`.
fn write_job(root: &Path) {
    fs::write(root.join("schema.json"), SCHEMA).expect("schema should be written");
    fs::write(root.join("benchfold.toml"), CONFIG).expect("config should be written");
    let builds = [
        (1, r#"{"runs":[{"name":"sort","ms":10.0},{"name":"scan","ms":50.0}]}"#),
        (2, r#"{"runs":[{"name":"sort","ms":13.0},{"name":"scan","ms":51.0}]}"#),
    ];
    for (build, text) in builds {
        let dir = root.join("builds").join(build.to_string());
        fs::create_dir_all(&dir).expect("build dir should be created");
        fs::write(dir.join("bench.json"), text).expect("content should be written");
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn interpret_json_lists_values_of_the_build() {
    let tmp = TempDirGuard::new("interpret");
    write_job(tmp.path());
    let schema = path_arg(&tmp.path().join("schema.json"));

    let output = run_benchfold_in(
        &tmp.path().join("builds/1"),
        [
            "interpret",
            "--schema",
            schema.as_str(),
            "--build",
            "1",
            "bench.json",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["build"], 1);
    assert_eq!(payload["skipped"].as_array().map(Vec::len), Some(0));

    let values: Vec<&str> = payload["tree"]["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .filter(|node| node.get("value").is_some())
        .filter_map(|node| node["name"].as_str())
        .collect();
    assert_eq!(values, vec!["sort", "scan"]);
}

#[test]
fn condense_chain_fails_on_delta_and_matches_rebuild() {
    let tmp = TempDirGuard::new("condense");
    write_job(tmp.path());
    let schema = path_arg(&tmp.path().join("schema.json"));
    let config = path_arg(&tmp.path().join("benchfold.toml"));
    let chained = path_arg(&tmp.path().join("chained.jsonl"));

    let first = run_benchfold_in(
        &tmp.path().join("builds/1"),
        [
            "--config",
            config.as_str(),
            "condense",
            "--schema",
            schema.as_str(),
            "--build",
            "1",
            "--summary",
            chained.as_str(),
            "bench.json",
            "--json",
        ],
    );
    assert_success(&first);
    assert_eq!(parse_json_stdout(&first)["report"]["result"], "passed");

    let second = run_benchfold_in(
        &tmp.path().join("builds/2"),
        [
            "--config",
            config.as_str(),
            "condense",
            "--schema",
            schema.as_str(),
            "--build",
            "2",
            "--summary",
            chained.as_str(),
            "bench.json",
            "--json",
        ],
    );
    assert_eq!(second.status.code(), Some(2));
    let report = &parse_json_stdout(&second)["report"];
    assert_eq!(report["result"], "failed");
    let failing: Vec<&str> = report["verdicts"]
        .as_array()
        .expect("verdicts array")
        .iter()
        .filter(|v| v.get("violations").is_some())
        .filter_map(|v| v["path"].as_str())
        .collect();
    assert_eq!(failing, vec!["bench.json.runs.sort"]);

    let rebuilt = path_arg(&tmp.path().join("rebuilt.jsonl"));
    let builds = path_arg(&tmp.path().join("builds"));
    let output = run_benchfold_in(
        tmp.path(),
        [
            "rebuild",
            "--schema",
            schema.as_str(),
            "--history",
            builds.as_str(),
            "--summary",
            rebuilt.as_str(),
            "--workers",
            "2",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["builds"], 2);
    assert_eq!(payload["values"], 2);

    assert_eq!(
        fs::read(&chained).expect("chained summary"),
        fs::read(&rebuilt).expect("rebuilt summary")
    );
}

#[test]
fn show_prints_summary_records() {
    let tmp = TempDirGuard::new("show");
    write_job(tmp.path());
    let schema = path_arg(&tmp.path().join("schema.json"));
    let summary = path_arg(&tmp.path().join("summary.jsonl"));
    let builds = path_arg(&tmp.path().join("builds"));

    assert_success(&run_benchfold_in(
        tmp.path(),
        [
            "rebuild",
            "--schema",
            schema.as_str(),
            "--history",
            builds.as_str(),
            "--summary",
            summary.as_str(),
        ],
    ));

    let output = run_benchfold_in(tmp.path(), ["show", "--summary", summary.as_str(), "--json"]);
    assert_success(&output);
    let records = parse_json_stdout(&output);
    let sort = records
        .as_array()
        .expect("records array")
        .iter()
        .find(|r| r["name"] == "sort")
        .expect("sort record");
    assert_eq!(sort["passed"], 2);
    assert_eq!(sort["previous"], 13.0);
    assert_eq!(sort["average"], 11.5);
    assert_eq!(sort["lastBuild"], 2);

    let text = run_benchfold_in(tmp.path(), ["show", "--summary", summary.as_str()]);
    assert_success(&text);
    assert!(String::from_utf8_lossy(&text.stdout).contains("bench.json.runs.sort"));
}

#[test]
fn missing_schema_is_an_error() {
    let tmp = TempDirGuard::new("missing-schema");
    write_job(tmp.path());

    let output = run_benchfold_in(
        &tmp.path().join("builds/1"),
        ["interpret", "--schema", "nope.json", "bench.json"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: failed to load schema"));
}

#[test]
fn held_summary_lock_rejects_condense() {
    let tmp = TempDirGuard::new("lock");
    write_job(tmp.path());
    let schema = path_arg(&tmp.path().join("schema.json"));
    let summary = tmp.path().join("summary.jsonl");
    let summary_arg = path_arg(&summary);
    fs::write(tmp.path().join("summary.jsonl.lock"), "pid=0\n").expect("lock should be written");

    let output = run_benchfold_in(
        &tmp.path().join("builds/1"),
        [
            "condense",
            "--schema",
            schema.as_str(),
            "--build",
            "1",
            "--summary",
            summary_arg.as_str(),
            "bench.json",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("summary lock busy"));
    assert!(!summary.exists());
}
