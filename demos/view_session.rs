//! Load a quality report from disk, narrow it with a search, and print the
//! visible rows per section.
//!
//! Usage:
//!   cargo run --example view_session -- /path/to/report [search-text]
//!
//! Demonstrates library-only usage: no CLI, no persisted state.

use std::path::PathBuf;
use std::sync::Arc;

use quality_report_viewer::core::config::DisplayConfig;
use quality_report_viewer::logger::jsonl::DiagnosticsLog;
use quality_report_viewer::source::fs::FsReportSource;
use quality_report_viewer::view::controller::ReportViewController;
use quality_report_viewer::view::model::ReportMsg;
use quality_report_viewer::view::storage::MemoryStore;

fn main() {
    let mut args = std::env::args().skip(1);
    let report_dir = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let search = args.next().unwrap_or_default();

    let source = Arc::new(FsReportSource::new(&report_dir));
    let mut controller = ReportViewController::with_defaults(
        MemoryStore::new(),
        source.clone(),
        source,
        DiagnosticsLog::disabled(),
        &DisplayConfig::default(),
    );

    controller.send(ReportMsg::Start);
    if !search.is_empty() {
        controller.send(ReportMsg::SetSearch(search));
    }
    controller.run_until_idle();

    let model = controller.model();
    if let Some(details) = &model.load_error {
        eprintln!("load failed: {details}");
        std::process::exit(1);
    }

    for view in model.section_views() {
        println!("{}", view.title());
        for metric in &view.rows {
            println!("  {:<8} {}", metric.id_format, metric.measurement);
        }
        println!();
    }
    println!(
        "{} of {} metrics visible",
        model.visible.len(),
        model.total_metrics()
    );
}
