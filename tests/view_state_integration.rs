//! In-process engine tests: a real controller wired to on-disk report
//! fixtures, exercising load, mutation, detail expansion, persistence
//! across engine rebuilds, and diagnostics logging.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use quality_report_viewer::core::config::DisplayConfig;
use quality_report_viewer::logger::jsonl::DiagnosticsLog;
use quality_report_viewer::report::status::MetricStatus;
use quality_report_viewer::source::fs::FsReportSource;
use quality_report_viewer::view::controller::ReportViewController;
use quality_report_viewer::view::filter::Filter;
use quality_report_viewer::view::model::{LoadPhase, ReportMsg};
use quality_report_viewer::view::sort::SortColumn;
use quality_report_viewer::view::storage::FileStore;

const SAMPLE: &str = r#"{
    "report_date": [2026, 8, 21, 14, 30, 0],
    "report_title": "Engine test report",
    "generator_version": "2.4.1",
    "sections": [
        {"id": "PD", "title": "Product X", "subtitle": "main branch",
         "latest_change_date": "2026-08-20 11:02:44"}
    ],
    "metrics": [
        {"id_value": "PD-01", "id_format": "PD-1", "stable_metric_id": "Product coverage",
         "name": "Coverage", "unit": "%", "section": "PD", "status": "green",
         "status_value": "2", "status_start_date": [2026, 8, 15, 9, 0, 0],
         "value": "80", "numerical_value": "80",
         "measurement": "80 % line coverage", "norm": "at least 75 %",
         "comment": "", "metric_class": "Coverage", "extra_info": {}},
        {"id_value": "PD-02", "id_format": "PD-2", "stable_metric_id": "Violations Product",
         "name": "Violations", "unit": "violations", "section": "PD", "status": "red",
         "status_value": "0", "status_start_date": [2026, 8, 15, 9, 0, 0],
         "value": "3", "numerical_value": "3",
         "measurement": "3 security violations", "norm": "none open",
         "comment": "", "metric_class": "Violations", "extra_info": {}},
        {"id_value": "MM-02", "id_format": "MM-2", "stable_metric_id": "Broken meta",
         "name": "Broken", "unit": "", "section": "PD", "status": "chartreuse",
         "status_value": "", "status_start_date": [],
         "value": "", "numerical_value": "",
         "measurement": "", "norm": "", "comment": "",
         "metric_class": "Broken", "extra_info": {}}
    ]
}"#;

fn write_report(root: &Path, dataset: &str) {
    let json_dir = root.join("json");
    fs::create_dir_all(&json_dir).expect("create report json dir");
    fs::write(json_dir.join("metrics.json"), dataset).expect("write dataset");
}

fn engine(
    report_root: &Path,
    state_dir: &Path,
    log: DiagnosticsLog,
) -> ReportViewController<FileStore> {
    let source = Arc::new(FsReportSource::new(report_root));
    ReportViewController::with_defaults(
        FileStore::new(state_dir),
        source.clone(),
        source,
        log,
        &DisplayConfig::default(),
    )
}

fn visible_ids(controller: &ReportViewController<FileStore>) -> Vec<String> {
    controller
        .model()
        .visible
        .iter()
        .map(|metric| metric.id_value.clone())
        .collect()
}

#[test]
fn session_flow_drives_filter_and_detail() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    write_report(report.path(), SAMPLE);
    fs::write(report.path().join("json").join("Product_coverage.txt"), "80.5, 81, 82.25")
        .expect("write history");

    let mut controller = engine(report.path(), state.path(), DiagnosticsLog::disabled());
    assert_eq!(controller.model().phase, LoadPhase::Uninitialized);

    controller.send(ReportMsg::Start);
    controller.run_until_idle();
    assert!(controller.model().phase.is_ready());
    assert_eq!(visible_ids(&controller), ["PD-01", "PD-02"]);

    controller.send(ReportMsg::SetSearch("coverage".to_owned()));
    controller.pump();
    assert_eq!(visible_ids(&controller), ["PD-01"]);

    // First expand fetches the row's history from disk.
    controller.send(ReportMsg::ToggleDetail {
        id_value: "PD-01".to_owned(),
    });
    controller.run_until_idle();
    let model = controller.model();
    assert!(model.panes.is_open("PD-01"));
    let row = model.panes.row("PD-01").expect("expanded row");
    assert_eq!(row.series(), [80.5, 81.0, 82.25]);

    // Collapse keeps the cached series; re-expanding does not refetch.
    controller.send(ReportMsg::ToggleDetail {
        id_value: "PD-01".to_owned(),
    });
    controller.pump();
    assert!(!controller.model().panes.is_open("PD-01"));

    controller.send(ReportMsg::ToggleDetail {
        id_value: "PD-01".to_owned(),
    });
    controller.pump();
    let model = controller.model();
    assert!(model.panes.is_open("PD-01"));
    assert_eq!(model.pending_history, 0, "cached series must not refetch");
    let row = model.panes.row("PD-01").expect("re-expanded row");
    assert_eq!(row.series(), [80.5, 81.0, 82.25]);
}

#[test]
fn view_state_survives_engine_rebuilds() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    write_report(report.path(), SAMPLE);

    let mut first = engine(report.path(), state.path(), DiagnosticsLog::disabled());
    first.send(ReportMsg::Start);
    first.run_until_idle();
    first.send(ReportMsg::ToggleColor(MetricStatus::Red));
    first.send(ReportMsg::SortHeaderClicked(SortColumn::Sparkline));
    first.pump();
    assert_eq!(visible_ids(&first), ["PD-01"]);
    drop(first);

    let mut second = engine(report.path(), state.path(), DiagnosticsLog::disabled());
    assert!(!second.model().filter.filter_color_red);
    assert_eq!(second.model().sort.column_name, SortColumn::Sparkline);

    second.send(ReportMsg::Start);
    second.run_until_idle();
    assert_eq!(visible_ids(&second), ["PD-01"]);
}

#[test]
fn corrupt_filter_slice_falls_back_and_logs() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    write_report(report.path(), SAMPLE);
    fs::write(state.path().join("filter.json"), "][").expect("write corrupt slice");

    let log_path = state.path().join("qrv.jsonl");
    let controller = engine(report.path(), state.path(), DiagnosticsLog::open(&log_path));
    assert_eq!(controller.model().filter, Filter::default());

    let raw = fs::read_to_string(&log_path).expect("read diagnostics log");
    assert!(
        raw.contains("\"state_load\"") && raw.contains("\"filter\""),
        "missing recovery warning: {raw}"
    );
}

#[test]
fn unknown_status_rows_never_surface() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    write_report(report.path(), SAMPLE);

    let mut controller = engine(report.path(), state.path(), DiagnosticsLog::disabled());
    controller.send(ReportMsg::Start);
    controller.run_until_idle();

    let model = controller.model();
    assert_eq!(model.total_metrics(), 3);
    assert!(!visible_ids(&controller).contains(&"MM-02".to_owned()));
    assert_eq!(
        controller.model().load_findings.unknown_statuses,
        [("MM-02".to_owned(), "chartreuse".to_owned())]
    );
}

#[test]
fn failed_dataset_fetch_reports_and_stays_loading() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    fs::create_dir_all(report.path().join("json")).expect("create empty report dir");

    let mut controller = engine(report.path(), state.path(), DiagnosticsLog::disabled());
    controller.send(ReportMsg::Start);
    controller.run_until_idle();

    let model = controller.model();
    assert_eq!(model.phase, LoadPhase::Loading);
    assert!(model.visible.is_empty());
    let details = model.load_error.as_deref().expect("load error recorded");
    assert!(details.contains("[QRV-2001]"), "unexpected details: {details}");
}

#[test]
fn missing_history_resolves_to_empty_series_and_logs() {
    let report = TempDir::new().expect("report dir");
    let state = TempDir::new().expect("state dir");
    write_report(report.path(), SAMPLE);

    let log_path = state.path().join("qrv.jsonl");
    let mut controller = engine(report.path(), state.path(), DiagnosticsLog::open(&log_path));
    controller.send(ReportMsg::Start);
    controller.run_until_idle();

    controller.send(ReportMsg::ToggleDetail {
        id_value: "PD-02".to_owned(),
    });
    controller.run_until_idle();

    let model = controller.model();
    assert!(model.panes.is_open("PD-02"));
    let row = model.panes.row("PD-02").expect("expanded row");
    assert!(row.series().is_empty());

    let raw = fs::read_to_string(&log_path).expect("read diagnostics log");
    assert!(
        raw.contains("\"history_fetch\"") && raw.contains("PD-02"),
        "missing history warning: {raw}"
    );
}
