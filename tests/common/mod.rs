use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Datelike, Duration, Timelike, Utc};
use tempfile::TempDir;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_qrv") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "qrv.exe" } else { "qrv" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve qrv binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str], envs: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("qrv-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("execute qrv command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// A `[year, month, day, hour, minute, second]` wire date `days_ago` days
/// before the real clock, for embedding in dataset fixtures.
pub fn date_parts(days_ago: i64) -> Vec<i64> {
    let at = Utc::now().naive_utc() - Duration::days(days_ago);
    vec![
        i64::from(at.year()),
        i64::from(at.month()),
        i64::from(at.day()),
        i64::from(at.hour()),
        i64::from(at.minute()),
        i64::from(at.second()),
    ]
}

/// On-disk report fixture: a generated-report directory with
/// `json/metrics.json`, optional history files, and an isolated view-state
/// directory. `HOME` points into the fixture so no real config file leaks in.
pub struct ReportFixture {
    root: TempDir,
}

impl ReportFixture {
    pub fn new(dataset_json: &str) -> Self {
        let fixture = Self::without_dataset();
        let json_dir = fixture.root.path().join("report").join("json");
        fs::write(json_dir.join("metrics.json"), dataset_json).expect("write dataset");
        fixture
    }

    /// A report directory with no `metrics.json`, for fetch-failure cases.
    pub fn without_dataset() -> Self {
        let root = TempDir::new().expect("create fixture dir");
        let json_dir = root.path().join("report").join("json");
        fs::create_dir_all(&json_dir).expect("create report json dir");
        fs::create_dir_all(root.path().join("state")).expect("create state dir");
        Self { root }
    }

    pub fn write_history(&self, sanitized_id: &str, content: &str) {
        let path = self
            .root
            .path()
            .join("report")
            .join("json")
            .join(format!("{sanitized_id}.txt"));
        fs::write(path, content).expect("write history file");
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.path().join("report")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.path().join("state")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.path().join("qrv.jsonl")
    }

    pub fn run(&self, case_name: &str, args: &[&str]) -> CmdResult {
        self.run_with_env(case_name, args, &[])
    }

    pub fn run_with_env(&self, case_name: &str, args: &[&str], envs: &[(&str, &str)]) -> CmdResult {
        let report_dir = self.report_dir();
        let state_dir = self.state_dir();
        let report_dir = report_dir.to_string_lossy();
        let state_dir = state_dir.to_string_lossy();
        let home = self.root.path().to_string_lossy();

        let mut full_args: Vec<&str> = vec![
            "--report-dir",
            report_dir.as_ref(),
            "--state-dir",
            state_dir.as_ref(),
        ];
        full_args.extend_from_slice(args);

        let mut full_envs: Vec<(&str, &str)> = vec![("HOME", home.as_ref())];
        full_envs.extend_from_slice(envs);

        run_cli_case(case_name, &full_args, &full_envs)
    }
}
