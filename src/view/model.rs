//! Elm-style state model for the report view engine.
//!
//! All view state lives in [`ReportModel`]. User operations and fetch
//! completions arrive as [`ReportMsg`] values; side-effects are represented
//! as [`ReportCmd`] values returned from the update function and executed by
//! the surrounding controller.
//!
//! **Design invariant:** the model is deterministic and testable — no I/O
//! happens here.

use chrono::NaiveDateTime;

use crate::report::dataset::{DatasetWarnings, ReportDataset, Section};
use crate::report::history::MetricHistory;
use crate::report::metric::Metric;
use crate::report::status::MetricStatus;
use crate::view::detail::DetailPanes;
use crate::view::filter::Filter;
use crate::view::sort::{SortColumn, SortState};
use crate::view::storage::keys;

// ──────────────────── load phase ────────────────────

/// Lifecycle of the dataset behind the view.
///
/// `Loading → Ready` fires exactly once, on dataset arrival; there is no way
/// back to `Loading` short of constructing a fresh engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Engine constructed, fetch not yet issued.
    #[default]
    Uninitialized,
    /// Dataset fetch in flight (or failed; the view keeps waiting).
    Loading,
    /// Dataset held immutably; every view operation derives from it.
    Ready,
}

impl LoadPhase {
    /// Whether the dataset is available.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

// ──────────────────── persisted slices ────────────────────

/// Independently persisted slices of view state. Each slice owns a distinct
/// storage key, so writers never race on one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSlice {
    /// The whole [`Filter`] blob.
    Filter,
    /// The one-big-table display toggle.
    ShowOneTable,
    /// The dashboard-visibility toggle.
    ShowDashboard,
    /// The [`SortState`] blob.
    SortOrder,
}

impl StateSlice {
    /// Storage key the slice is persisted under.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Filter => keys::FILTER,
            Self::ShowOneTable => keys::SHOW_ONE_TABLE,
            Self::ShowDashboard => keys::SHOW_DASHBOARD,
            Self::SortOrder => keys::SORT_ORDER,
        }
    }
}

// ──────────────────── section views ────────────────────

/// One rendered table: a section heading plus its visible rows in derived
/// order. The one-table display mode exposes a single pseudo-section with no
/// heading metadata.
#[derive(Debug, PartialEq)]
pub struct SectionView<'a> {
    /// Section metadata; `None` for the one-table pseudo-section.
    pub section: Option<&'a Section>,
    /// Visible metrics belonging to this table, sorted order preserved.
    pub rows: Vec<&'a Metric>,
}

impl SectionView<'_> {
    /// Heading title to display.
    #[must_use]
    pub fn title(&self) -> &str {
        self.section.map_or("all metrics", |s| s.title.as_str())
    }
}

// ──────────────────── model ────────────────────

/// Complete display state for one report view.
///
/// This struct is the single source of truth: the update function mutates it,
/// presentation reads it immutably.
#[derive(Debug, Clone)]
pub struct ReportModel {
    /// Dataset lifecycle phase.
    pub phase: LoadPhase,
    /// The immutable report, once loaded.
    pub dataset: Option<ReportDataset>,
    /// Findings collected while decoding the dataset (unknown statuses,
    /// duplicate ids). Kept for diagnostics display.
    pub load_findings: DatasetWarnings,
    /// Dataset fetch failure, if one occurred. The phase stays `Loading`.
    pub load_error: Option<String>,
    /// Current filter state.
    pub filter: Filter,
    /// Current sort state.
    pub sort: SortState,
    /// One big table instead of per-section tables.
    pub show_one_table: bool,
    /// Whether the dashboard pane is shown.
    pub show_dashboard: bool,
    /// Per-row detail pane state.
    pub panes: DetailPanes,
    /// The derived visible, ordered metric list. Empty until `Ready`.
    pub visible: Vec<Metric>,
    /// History fetches currently in flight.
    pub pending_history: usize,
}

impl ReportModel {
    /// Create a model from rehydrated view-state slices.
    #[must_use]
    pub fn new(filter: Filter, sort: SortState, show_one_table: bool, show_dashboard: bool) -> Self {
        Self {
            phase: LoadPhase::default(),
            dataset: None,
            load_findings: DatasetWarnings::default(),
            load_error: None,
            filter,
            sort,
            show_one_table,
            show_dashboard,
            panes: DetailPanes::default(),
            visible: Vec::new(),
            pending_history: 0,
        }
    }

    /// Recompute the derived list: filter in dataset order, then sort.
    /// Before the dataset has loaded this clears the list.
    pub fn recompute_visible_at(&mut self, now: NaiveDateTime) {
        match &self.dataset {
            Some(dataset) => {
                self.visible = self.sort.apply(&self.filter.visible(&dataset.metrics, now));
            }
            None => self.visible.clear(),
        }
    }

    /// Partition the visible list for display: one pseudo-section in
    /// one-table mode, otherwise one view per declared section in document
    /// order. A row referencing an undeclared section only appears in
    /// one-table mode.
    #[must_use]
    pub fn section_views(&self) -> Vec<SectionView<'_>> {
        if self.show_one_table {
            return vec![SectionView {
                section: None,
                rows: self.visible.iter().collect(),
            }];
        }
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        dataset
            .sections
            .iter()
            .map(|section| SectionView {
                section: Some(section),
                rows: self
                    .visible
                    .iter()
                    .filter(|metric| metric.section == section.id)
                    .collect(),
            })
            .collect()
    }

    /// Whether no asynchronous work is in flight. A failed dataset fetch
    /// counts as settled even though the phase stays `Loading`.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_history == 0
            && !(self.phase == LoadPhase::Loading && self.load_error.is_none())
    }

    /// Number of metrics in the loaded dataset, zero until then.
    #[must_use]
    pub fn total_metrics(&self) -> usize {
        self.dataset.as_ref().map_or(0, |d| d.metrics.len())
    }
}

impl Default for ReportModel {
    fn default() -> Self {
        Self::new(Filter::default(), SortState::default(), false, true)
    }
}

// ──────────────────── messages ────────────────────

/// Dataset fetch result delivered to the model.
#[derive(Debug, Clone)]
pub struct DatasetPayload {
    /// The decoded report.
    pub dataset: ReportDataset,
    /// Findings collected during decoding.
    pub warnings: DatasetWarnings,
}

/// Events that drive state transitions in the report model.
#[derive(Debug, Clone)]
pub enum ReportMsg {
    /// Kick the engine: issue the one dataset fetch.
    Start,
    /// The dataset arrived.
    DatasetLoaded(Box<DatasetPayload>),
    /// The dataset fetch or decode failed; the view stays loading.
    DatasetFailed {
        /// Failure description for diagnostics.
        details: String,
    },
    /// Flip one status-color flag.
    ToggleColor(MetricStatus),
    /// Flip the week-age flag.
    ToggleWeek,
    /// Flip every flag off or on via the aggregate.
    ToggleAll,
    /// Forget all hidden metrics.
    ClearHidden,
    /// Hide one metric by id.
    HideMetric {
        /// `id_value` of the metric to hide.
        id_value: String,
    },
    /// Replace the search text.
    SetSearch(String),
    /// A sort header was clicked.
    SortHeaderClicked(SortColumn),
    /// Flip between one big table and per-section tables.
    ToggleOneTable,
    /// Flip dashboard visibility.
    ToggleDashboard,
    /// Expand or collapse one row's detail pane.
    ToggleDetail {
        /// `id_value` of the toggled row.
        id_value: String,
    },
    /// A row's history series arrived.
    HistoryLoaded {
        /// `id_value` of the row the series belongs to.
        id_value: String,
        /// The decoded series.
        series: MetricHistory,
    },
    /// A row's history fetch failed; the row keeps an empty series.
    HistoryFailed {
        /// `id_value` of the affected row.
        id_value: String,
        /// Failure description for diagnostics.
        details: String,
    },
}

// ──────────────────── commands ────────────────────

/// Side-effects returned by the update function for the controller to
/// execute. The update function never performs I/O directly, keeping the
/// state machine deterministic and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCmd {
    /// No side-effect.
    None,
    /// Fetch the report dataset; deliver `DatasetLoaded` or `DatasetFailed`.
    FetchDataset,
    /// Fetch one metric's history series; deliver `HistoryLoaded` or
    /// `HistoryFailed` for `id_value`.
    FetchHistory {
        /// Row the response must be delivered to.
        id_value: String,
        /// Sanitized `stable_metric_id` naming the history resource.
        history_id: String,
    },
    /// Write one state slice through the persistence adapter.
    Persist(StateSlice),
    /// Execute multiple commands in order.
    Batch(Vec<Self>),
}

// ──────────────────── tests ────────────────────
