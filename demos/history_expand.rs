//! Expand one metric's detail pane and print its history series.
//!
//! Usage:
//!   cargo run --example history_expand -- /path/to/report PD-01
//!
//! Demonstrates the lazy history fetch: the series loads on first expand
//! and is served from the pane cache afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use quality_report_viewer::core::config::DisplayConfig;
use quality_report_viewer::logger::jsonl::DiagnosticsLog;
use quality_report_viewer::source::fs::FsReportSource;
use quality_report_viewer::view::controller::ReportViewController;
use quality_report_viewer::view::detail::DetailRow;
use quality_report_viewer::view::model::ReportMsg;
use quality_report_viewer::view::storage::MemoryStore;

fn main() {
    let mut args = std::env::args().skip(1);
    let report_dir = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let id_value = args.next().unwrap_or_else(|| "PD-01".to_owned());

    let source = Arc::new(FsReportSource::new(&report_dir));
    let mut controller = ReportViewController::with_defaults(
        MemoryStore::new(),
        source.clone(),
        source,
        DiagnosticsLog::disabled(),
        &DisplayConfig::default(),
    );

    controller.send(ReportMsg::Start);
    controller.run_until_idle();

    if let Some(details) = &controller.model().load_error {
        eprintln!("load failed: {details}");
        std::process::exit(1);
    }
    let known = controller
        .model()
        .dataset
        .as_ref()
        .is_some_and(|dataset| dataset.metric(&id_value).is_some());
    if !known {
        eprintln!("no metric {id_value} in the report");
        std::process::exit(1);
    }

    controller.send(ReportMsg::ToggleDetail {
        id_value: id_value.clone(),
    });
    controller.run_until_idle();

    let model = controller.model();
    let series = model.panes.row(&id_value).map_or(&[][..], DetailRow::series);
    if series.is_empty() {
        println!("{id_value}: no history");
    } else {
        let rendered = series
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("{id_value}: {rendered}");
    }
}
