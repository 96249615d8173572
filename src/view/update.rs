//! Pure update function for the report view engine.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the controller should
//! execute.
//!
//! **Design invariant:** this module performs zero I/O. All effects are
//! described as [`ReportCmd`] values; the only ambient input is the clock,
//! injectable through [`update_at`].

use chrono::{NaiveDateTime, Utc};

use crate::report::history::MetricHistory;
use crate::report::metric::Metric;
use crate::view::model::{LoadPhase, ReportCmd, ReportModel, ReportMsg, StateSlice};

/// Apply a message to the model using the current wall clock.
pub fn update(model: &mut ReportModel, msg: ReportMsg) -> ReportCmd {
    update_at(model, msg, Utc::now().naive_utc())
}

/// Apply a message to the model and return the next command.
///
/// This is the core state machine of the view engine. Every state transition
/// goes through this function; `now` feeds the week-age filter rule, making
/// transitions reproducible in tests.
pub fn update_at(model: &mut ReportModel, msg: ReportMsg, now: NaiveDateTime) -> ReportCmd {
    match msg {
        ReportMsg::Start => {
            if model.phase != LoadPhase::Uninitialized {
                return ReportCmd::None;
            }
            model.phase = LoadPhase::Loading;
            ReportCmd::FetchDataset
        }

        ReportMsg::DatasetLoaded(payload) => {
            // Loading → Ready fires exactly once per engine instance.
            if model.phase.is_ready() {
                return ReportCmd::None;
            }
            let payload = *payload;
            model.phase = LoadPhase::Ready;
            model.load_error = None;
            model.load_findings = payload.warnings;
            model.dataset = Some(payload.dataset);
            model.panes.reset();
            model.recompute_visible_at(now);
            ReportCmd::None
        }

        ReportMsg::DatasetFailed { details } => {
            // The view keeps waiting; the failure is kept for diagnostics.
            model.load_error = Some(details);
            ReportCmd::None
        }

        ReportMsg::ToggleColor(status) => {
            model.filter.toggle_color(status);
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::ToggleWeek => {
            model.filter.toggle_week();
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::ToggleAll => {
            model.filter.toggle_all();
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::ClearHidden => {
            model.filter.clear_hidden();
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::HideMetric { id_value } => {
            model.filter.hide(&id_value);
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::SetSearch(text) => {
            model.filter.set_search(&text);
            refresh(model, now, StateSlice::Filter)
        }

        ReportMsg::SortHeaderClicked(column) => {
            model.sort.on_header_click(column);
            refresh(model, now, StateSlice::SortOrder)
        }

        ReportMsg::ToggleOneTable => {
            // Display-mode toggles regroup the list but never change it.
            model.show_one_table = !model.show_one_table;
            ReportCmd::Persist(StateSlice::ShowOneTable)
        }

        ReportMsg::ToggleDashboard => {
            model.show_dashboard = !model.show_dashboard;
            ReportCmd::Persist(StateSlice::ShowDashboard)
        }

        ReportMsg::ToggleDetail { id_value } => {
            if !model.panes.toggle(&id_value) {
                return ReportCmd::None;
            }
            // First expand of this row: resolve its history resource. A row
            // naming an unknown metric keeps an empty series instead.
            let history_id = model
                .dataset
                .as_ref()
                .and_then(|dataset| dataset.metric(&id_value))
                .map(Metric::sanitized_stable_id);
            match history_id {
                Some(history_id) => {
                    model.pending_history += 1;
                    ReportCmd::FetchHistory { id_value, history_id }
                }
                None => {
                    model.panes.absorb(&id_value, MetricHistory::default());
                    ReportCmd::None
                }
            }
        }

        ReportMsg::HistoryLoaded { id_value, series } => {
            model.pending_history = model.pending_history.saturating_sub(1);
            model.panes.absorb(&id_value, series);
            ReportCmd::None
        }

        ReportMsg::HistoryFailed { id_value, .. } => {
            // The pane keeps an empty series; later expands reuse it.
            model.pending_history = model.pending_history.saturating_sub(1);
            model.panes.absorb(&id_value, MetricHistory::default());
            ReportCmd::None
        }
    }
}

/// Recompute the derived list and request persistence of the mutated slice.
fn refresh(model: &mut ReportModel, now: NaiveDateTime, slice: StateSlice) -> ReportCmd {
    model.recompute_visible_at(now);
    ReportCmd::Persist(slice)
}

// ──────────────────── tests ────────────────────
