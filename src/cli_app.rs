//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{ColoredString, Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use quality_report_viewer::core::config::ViewerConfig;
use quality_report_viewer::core::errors::QrvError;
use quality_report_viewer::logger::jsonl::DiagnosticsLog;
use quality_report_viewer::report::dataset::{ReportDataset, ReportFreshness};
use quality_report_viewer::report::extra_info::{ExtraInfoCell, ExtraInfoPanel};
use quality_report_viewer::report::metric::Metric;
use quality_report_viewer::report::status::{ALL_STATUSES, MetricStatus};
use quality_report_viewer::source::fs::FsReportSource;
use quality_report_viewer::view::controller::ReportViewController;
use quality_report_viewer::view::detail::DetailRow;
use quality_report_viewer::view::model::{ReportModel, ReportMsg};
use quality_report_viewer::view::sort::{ALL_COLUMNS, SortColumn};
use quality_report_viewer::view::storage::FileStore;

/// Quality Report Viewer — inspect a generated software-quality report.
#[derive(Debug, Parser)]
#[command(
    name = "qrv",
    author,
    version,
    about = "Quality Report Viewer - filter, sort, and inspect quality reports",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Report directory holding `json/metrics.json` (overrides config).
    #[arg(long, global = true, value_name = "DIR")]
    report_dir: Option<PathBuf>,
    /// Directory holding the persisted view-state slices (overrides config).
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (rows only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Show report title, date, and per-status counts.
    Summary,
    /// List the metrics visible under the current view state.
    Metrics(MetricsArgs),
    /// Expand one metric: history series plus the detail table.
    Detail(DetailArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// View mutations for the `metrics` command. Flags are applied as view
/// events in a fixed order: search, color toggles, week, all, clear-hidden,
/// hides, sort clicks, one-table, dashboard. Every mutation persists, so the
/// next invocation starts from the state this one leaves behind.
#[derive(Debug, Clone, Args, Default)]
#[allow(clippy::struct_excessive_bools)]
struct MetricsArgs {
    /// Set the search text before listing (empty string clears it).
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,
    /// Toggle one status-color flag (repeatable).
    #[arg(long, value_name = "COLOR")]
    toggle_color: Vec<String>,
    /// Toggle the week-age filter.
    #[arg(long)]
    toggle_week: bool,
    /// Toggle every filter flag at once.
    #[arg(long)]
    toggle_all: bool,
    /// Forget all hidden metrics.
    #[arg(long)]
    clear_hidden: bool,
    /// Hide one metric by id (repeatable).
    #[arg(long, value_name = "ID")]
    hide: Vec<String>,
    /// Click a sort header (repeatable; a repeat flips the direction).
    #[arg(long, value_name = "COLUMN")]
    sort: Vec<String>,
    /// Toggle one-big-table mode.
    #[arg(long)]
    one_table: bool,
    /// Toggle dashboard visibility.
    #[arg(long)]
    dashboard: bool,
}

#[derive(Debug, Clone, Args)]
struct DetailArgs {
    /// `id_value` of the metric to expand.
    #[arg(value_name = "ID")]
    id_value: String,
}

#[derive(Debug, Clone, Copy, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, value_name = "SHELL")]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type. Every variant exits with status 1 and its message on
/// stderr; engine failures keep their `[QRV-NNNN]` code in the message.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Configuration or engine failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl From<QrvError> for CliError {
    fn from(err: QrvError) -> Self {
        Self::Runtime(err.to_string())
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Summary => run_summary(cli),
        Command::Metrics(args) => run_metrics(cli, args),
        Command::Detail(args) => run_detail(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Engine bootstrap
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<ViewerConfig, CliError> {
    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.report_dir {
        config.report.dir.clone_from(dir);
    }
    if let Some(dir) = &cli.state_dir {
        config.state.dir.clone_from(dir);
    }
    Ok(config)
}

fn build_controller(config: &ViewerConfig) -> ReportViewController<FileStore> {
    let source = Arc::new(FsReportSource::new(&config.report.dir));
    let log = config
        .log
        .file
        .as_ref()
        .map_or_else(DiagnosticsLog::disabled, DiagnosticsLog::open);
    ReportViewController::with_defaults(
        FileStore::new(&config.state.dir),
        source.clone(),
        source,
        log,
        &config.display,
    )
}

fn ensure_loaded(model: &ReportModel) -> Result<(), CliError> {
    match &model.load_error {
        Some(details) => Err(CliError::Runtime(details.clone())),
        None => Ok(()),
    }
}

fn load_report(controller: &mut ReportViewController<FileStore>) -> Result<(), CliError> {
    controller.send(ReportMsg::Start);
    controller.run_until_idle();
    ensure_loaded(controller.model())
}

fn report_load_notes(cli: &Cli, model: &ReportModel) {
    if !cli.verbose {
        return;
    }
    let findings =
        model.load_findings.unknown_statuses.len() + model.load_findings.duplicate_ids.len();
    eprintln!(
        "qrv: loaded {} metrics ({findings} loader findings)",
        model.total_metrics()
    );
}

// ---------------------------------------------------------------------------
// Summary command
// ---------------------------------------------------------------------------

fn run_summary(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut controller = build_controller(&config);
    load_report(&mut controller)?;
    report_load_notes(cli, controller.model());

    let Some(dataset) = &controller.model().dataset else {
        return Err(CliError::Runtime(
            "report dataset missing after load".to_owned(),
        ));
    };

    match output_mode(cli) {
        OutputMode::Human => {
            print_summary_human(cli, dataset);
            Ok(())
        }
        OutputMode::Json => write_json_line(&summary_payload(dataset)),
    }
}

fn print_summary_human(cli: &Cli, dataset: &ReportDataset) {
    let counts = dataset.status_counts();
    let freshness = dataset.freshness(Utc::now().naive_utc());

    if !cli.quiet {
        println!("{}", dataset.report_title.bold());
        match &dataset.report_date {
            Some(date) => println!(
                "Generated: {} ({})",
                date.format("%Y-%m-%d %H:%M"),
                colored_freshness(freshness)
            ),
            None => println!("Generated: unknown ({})", colored_freshness(freshness)),
        }
        if !dataset.generator_version.is_empty() {
            println!("Generator: {}", dataset.generator_version);
        }
        println!();
    }

    for status in ALL_STATUSES {
        println!(
            "  {} {:<16}{:>5}",
            status.emoji(),
            status.as_str(),
            counts.get(status)
        );
    }
    if counts.unknown() > 0 {
        println!("    {:<16}{:>5}", "unknown", counts.unknown());
    }
    println!("    {:<16}{:>5}", "total", counts.total());

    if !cli.quiet && !dataset.sections.is_empty() {
        println!();
        println!("{}", "Sections".bold());
        for section in &dataset.sections {
            if section.subtitle.is_empty() {
                println!("  {:<4} {}", section.id, section.title);
            } else {
                println!("  {:<4} {} ({})", section.id, section.title, section.subtitle);
            }
        }
    }
}

fn summary_payload(dataset: &ReportDataset) -> Value {
    let counts = dataset.status_counts();
    let freshness = dataset.freshness(Utc::now().naive_utc());
    let mut by_status = serde_json::Map::new();
    for status in ALL_STATUSES {
        by_status.insert(status.as_str().to_owned(), json!(counts.get(status)));
    }
    json!({
        "command": "summary",
        "title": dataset.report_title,
        "date": dataset
            .report_date
            .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string()),
        "freshness": freshness_label(freshness),
        "generator_version": dataset.generator_version,
        "counts": by_status,
        "unknown": counts.unknown(),
        "total": counts.total(),
        "sections": dataset
            .sections
            .iter()
            .map(|section| {
                json!({
                    "id": section.id,
                    "title": section.title,
                    "subtitle": section.subtitle,
                })
            })
            .collect::<Vec<_>>(),
    })
}

const fn freshness_label(freshness: ReportFreshness) -> &'static str {
    match freshness {
        ReportFreshness::Current => "current",
        ReportFreshness::Old => "more than an hour old",
        ReportFreshness::VeryOld => "more than a day old",
        ReportFreshness::Undated => "undated",
    }
}

fn colored_freshness(freshness: ReportFreshness) -> ColoredString {
    let label = freshness_label(freshness);
    match freshness {
        ReportFreshness::Current => label.green(),
        ReportFreshness::Old => label.yellow(),
        ReportFreshness::VeryOld => label.red(),
        ReportFreshness::Undated => label.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// Metrics command
// ---------------------------------------------------------------------------

fn run_metrics(cli: &Cli, args: &MetricsArgs) -> Result<(), CliError> {
    let messages = metrics_messages(args)?;
    let config = load_config(cli)?;
    let mut controller = build_controller(&config);

    controller.send(ReportMsg::Start);
    for msg in messages {
        controller.send(msg);
    }
    controller.run_until_idle();
    ensure_loaded(controller.model())?;
    report_load_notes(cli, controller.model());

    let model = controller.model();
    match output_mode(cli) {
        OutputMode::Human => {
            print_metrics_human(cli, model);
            Ok(())
        }
        OutputMode::Json => write_json_line(&metrics_payload(model)),
    }
}

fn metrics_messages(args: &MetricsArgs) -> Result<Vec<ReportMsg>, CliError> {
    let mut messages = Vec::new();
    if let Some(text) = &args.search {
        messages.push(ReportMsg::SetSearch(text.clone()));
    }
    for raw in &args.toggle_color {
        let status = MetricStatus::parse(raw).ok_or_else(|| {
            CliError::User(format!(
                "unknown status color {raw:?} (expected one of: {})",
                status_names().join(", ")
            ))
        })?;
        messages.push(ReportMsg::ToggleColor(status));
    }
    if args.toggle_week {
        messages.push(ReportMsg::ToggleWeek);
    }
    if args.toggle_all {
        messages.push(ReportMsg::ToggleAll);
    }
    if args.clear_hidden {
        messages.push(ReportMsg::ClearHidden);
    }
    for id_value in &args.hide {
        messages.push(ReportMsg::HideMetric {
            id_value: id_value.clone(),
        });
    }
    for raw in &args.sort {
        let column = SortColumn::parse(raw).ok_or_else(|| {
            CliError::User(format!(
                "unknown sort column {raw:?} (expected one of: {})",
                column_names().join(", ")
            ))
        })?;
        messages.push(ReportMsg::SortHeaderClicked(column));
    }
    if args.one_table {
        messages.push(ReportMsg::ToggleOneTable);
    }
    if args.dashboard {
        messages.push(ReportMsg::ToggleDashboard);
    }
    Ok(messages)
}

fn status_names() -> Vec<&'static str> {
    ALL_STATUSES.iter().map(|status| status.as_str()).collect()
}

fn column_names() -> Vec<&'static str> {
    ALL_COLUMNS.iter().map(|column| column.as_str()).collect()
}

fn print_metrics_human(cli: &Cli, model: &ReportModel) {
    let views = model.section_views();
    let shown: usize = views.iter().map(|view| view.rows.len()).sum();

    if shown == 0 {
        if !cli.quiet {
            println!("no metrics match the current view");
        }
        return;
    }

    for view in &views {
        if !cli.quiet {
            println!("{}", view.title().bold());
        }
        for metric in &view.rows {
            println!("{}", format_metric_row(metric));
        }
        if !cli.quiet {
            println!();
        }
    }

    if !cli.quiet {
        let hidden = model.filter.hidden_count();
        let total = model.total_metrics();
        if hidden > 0 {
            println!("{shown} of {total} metrics shown ({hidden} hidden)");
        } else {
            println!("{shown} of {total} metrics shown");
        }
    }
}

fn format_metric_row(metric: &Metric) -> String {
    let mut line = format!(
        "  {} {} {}",
        status_glyph(metric),
        colored_id(metric),
        metric.measurement
    );
    if !metric.comment.is_empty() {
        line.push_str(&format!("  {}", metric.comment.dimmed()));
    }
    line
}

fn status_glyph(metric: &Metric) -> &'static str {
    metric.status.known().map_or("?", MetricStatus::emoji)
}

fn colored_id(metric: &Metric) -> ColoredString {
    let padded = format!("{:<8}", metric.id_format);
    match metric.status.known() {
        Some(MetricStatus::Red) => padded.red(),
        Some(MetricStatus::Yellow) => padded.yellow(),
        Some(MetricStatus::Green) => padded.green(),
        Some(MetricStatus::Perfect) => padded.bright_green().bold(),
        Some(MetricStatus::Grey) => padded.dimmed(),
        Some(MetricStatus::Missing | MetricStatus::MissingSource) | None => padded.normal(),
    }
}

fn metrics_payload(model: &ReportModel) -> Value {
    let sections = model
        .section_views()
        .iter()
        .map(|view| {
            json!({
                "id": view.section.map(|section| section.id.clone()),
                "title": view.title(),
                "rows": view
                    .rows
                    .iter()
                    .map(|metric| metric_payload(metric))
                    .collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();

    json!({
        "command": "metrics",
        "one_table": model.show_one_table,
        "dashboard": model.show_dashboard,
        "visible": model.visible.len(),
        "total": model.total_metrics(),
        "hidden": model.filter.hidden_count(),
        "search": model.filter.search_string,
        "sections": sections,
    })
}

fn metric_payload(metric: &Metric) -> Value {
    json!({
        "id_value": metric.id_value,
        "id_format": metric.id_format,
        "status": metric.status.as_str(),
        "section": metric.section,
        "measurement": metric.measurement,
        "norm": metric.norm,
        "comment": metric.comment,
    })
}

// ---------------------------------------------------------------------------
// Detail command
// ---------------------------------------------------------------------------

fn run_detail(cli: &Cli, args: &DetailArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut controller = build_controller(&config);
    load_report(&mut controller)?;
    report_load_notes(cli, controller.model());

    let known = controller
        .model()
        .dataset
        .as_ref()
        .is_some_and(|dataset| dataset.metric(&args.id_value).is_some());
    if !known {
        return Err(QrvError::UnknownMetric {
            id: args.id_value.clone(),
        }
        .into());
    }

    controller.send(ReportMsg::ToggleDetail {
        id_value: args.id_value.clone(),
    });
    controller.run_until_idle();

    let model = controller.model();
    let Some(metric) = model
        .dataset
        .as_ref()
        .and_then(|dataset| dataset.metric(&args.id_value))
    else {
        return Err(QrvError::UnknownMetric {
            id: args.id_value.clone(),
        }
        .into());
    };
    let series = model
        .panes
        .row(&args.id_value)
        .map_or(&[][..], DetailRow::series);
    let panel = ExtraInfoPanel::project(&metric.extra_info);

    match output_mode(cli) {
        OutputMode::Human => {
            print_detail_human(cli, metric, series, &panel);
            Ok(())
        }
        OutputMode::Json => write_json_line(&detail_payload(metric, series, &panel)),
    }
}

fn print_detail_human(cli: &Cli, metric: &Metric, series: &[f64], panel: &ExtraInfoPanel) {
    if !cli.quiet {
        println!(
            "{} {} {}",
            status_glyph(metric),
            metric.id_format.bold(),
            metric.name
        );
        match &metric.status_start_date {
            Some(since) => println!(
                "Status: {} (since {})",
                metric.status.as_str(),
                since.format("%Y-%m-%d %H:%M")
            ),
            None => println!("Status: {}", metric.status.as_str()),
        }
        println!("Measurement: {}", metric.measurement);
        if !metric.norm.is_empty() {
            println!("Norm: {}", metric.norm);
        }
        if !metric.comment.is_empty() {
            println!("Comment: {}", metric.comment);
        }
        println!();
    }

    print_history(series);

    if !panel.is_empty() {
        println!();
        print_extra_info(panel);
    }
}

fn print_history(series: &[f64]) {
    if series.is_empty() {
        println!("History: (none)");
        return;
    }
    let rendered = series
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("History ({} points): {rendered}", series.len());
}

fn print_extra_info(panel: &ExtraInfoPanel) {
    if !panel.title.is_empty() {
        println!("{}", panel.title.bold());
    }

    let captions: Vec<&str> = panel
        .columns
        .iter()
        .map(|column| column.caption.as_str())
        .collect();
    let rendered: Vec<Vec<String>> = panel
        .rows
        .iter()
        .map(|row| row.cells.iter().map(ExtraInfoCell::display).collect())
        .collect();

    let mut widths: Vec<usize> = captions.iter().map(|c| c.chars().count()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header = captions
        .iter()
        .zip(widths.iter().copied())
        .map(|(caption, width)| format!("{caption:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {}", header.bold());

    for (row, projected) in panel.rows.iter().zip(&rendered) {
        let mut line = projected
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        if let Some(warning) = row.warning() {
            if warning.marked {
                let reason = if warning.reason.is_empty() {
                    "no reason given"
                } else {
                    warning.reason.as_str()
                };
                line.push_str(&format!("  [false positive: {reason}]"));
            }
        }
        println!("  {}", line.trim_end());
    }
}

fn detail_payload(metric: &Metric, series: &[f64], panel: &ExtraInfoPanel) -> Value {
    json!({
        "command": "detail",
        "id_value": metric.id_value,
        "id_format": metric.id_format,
        "name": metric.name,
        "status": metric.status.as_str(),
        "status_start_date": metric
            .status_start_date
            .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string()),
        "measurement": metric.measurement,
        "norm": metric.norm,
        "comment": metric.comment,
        "history": series,
        "extra_info": {
            "title": panel.title,
            "columns": panel
                .columns
                .iter()
                .map(|column| column.caption.clone())
                .collect::<Vec<_>>(),
            "rows": panel
                .rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(ExtraInfoCell::display)
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
        },
        "warnings": panel
            .warnings()
            .iter()
            .map(|warning| {
                json!({
                    "warning_id": warning.warning_id,
                    "marked": warning.marked,
                    "reason": warning.reason,
                })
            })
            .collect::<Vec<_>>(),
    })
}

// ---------------------------------------------------------------------------
// Output plumbing
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("QRV_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        Some("auto") | None => fallback,
        Some(_) => fallback,
    }
}
