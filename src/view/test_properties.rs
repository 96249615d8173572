//! Property-based tests for view-state update invariants.
//!
//! Uses `proptest` to verify that arbitrary message sequences keep the model
//! coherent: the aggregate filter flag stays the AND of the color flags, the
//! derived visible list always equals its filter-then-sort derivation,
//! toggles are self-inverse, and persisted slices round-trip.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use proptest::prelude::*;

use super::filter::Filter;
use super::model::{DatasetPayload, ReportModel, ReportMsg};
use super::sort::{ALL_COLUMNS, SortColumn, SortState};
use super::update::update_at;
use crate::report::dataset::{DashboardLayout, DatasetWarnings, ReportDataset, Section};
use crate::report::history::MetricHistory;
use crate::report::metric::{Metric, MetricDoc};
use crate::report::status::{ALL_STATUSES, MetricStatus};

// ──────────────────── fixture ────────────────────

fn fixed_now() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2017, 6, 26)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn metric(id: &str, section: &str, status: &str, date: Vec<i64>, measurement: &str) -> Metric {
    Metric::from_doc(MetricDoc {
        id_value: id.to_owned(),
        id_format: id.to_owned(),
        stable_metric_id: format!("{id} series"),
        section: section.to_owned(),
        status: status.to_owned(),
        status_start_date: date,
        measurement: measurement.to_owned(),
        norm: format!("norm for {id}"),
        ..MetricDoc::default()
    })
}

fn section(id: &str, title: &str) -> Section {
    Section {
        id: id.to_owned(),
        title: title.to_owned(),
        subtitle: String::new(),
        latest_change_date: String::new(),
    }
}

/// Six metrics spanning fresh and stale status dates, every interesting
/// status class, and one row with a status outside the closed set.
fn sample_dataset() -> ReportDataset {
    let fresh = vec![2017, 6, 25, 0, 0, 0];
    let stale = vec![2017, 6, 10, 0, 0, 0];
    ReportDataset {
        report_title: "Quality report".to_owned(),
        report_date: Some(fixed_now()),
        generator_version: "2.68.0".to_owned(),
        sections: vec![section("PD", "Product"), section("PE", "Process")],
        dashboard: DashboardLayout::default(),
        metrics: vec![
            metric("PD-01", "PD", "green", fresh.clone(), "90 % coverage"),
            metric("PD-02", "PD", "red", fresh.clone(), "12 violations"),
            metric("PD-03", "PD", "perfect", stale.clone(), "0 findings"),
            metric("PE-01", "PE", "yellow", fresh.clone(), "4 days old"),
            metric("PE-02", "PE", "grey", stale, "not applicable"),
            metric("XX-01", "XX", "chartreuse", fresh, "unclassifiable"),
        ],
    }
}

fn loaded_model() -> ReportModel {
    let mut model = ReportModel::default();
    let _ = update_at(&mut model, ReportMsg::Start, fixed_now());
    let _ = update_at(
        &mut model,
        ReportMsg::DatasetLoaded(Box::new(DatasetPayload {
            dataset: sample_dataset(),
            warnings: DatasetWarnings::default(),
        })),
        fixed_now(),
    );
    model
}

fn ids(metrics: &[Metric]) -> Vec<&str> {
    metrics.iter().map(|m| m.id_value.as_str()).collect()
}

// ──────────────────── strategies ────────────────────

fn arb_status() -> impl Strategy<Value = MetricStatus> {
    (0..ALL_STATUSES.len()).prop_map(|i| ALL_STATUSES[i])
}

fn arb_column() -> impl Strategy<Value = SortColumn> {
    (0..ALL_COLUMNS.len()).prop_map(|i| ALL_COLUMNS[i])
}

/// Ids from the fixture plus one the dataset never declares.
fn arb_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PD-01".to_owned()),
        Just("PD-02".to_owned()),
        Just("PD-03".to_owned()),
        Just("PE-01".to_owned()),
        Just("PE-02".to_owned()),
        Just("XX-01".to_owned()),
        Just("ZZ-99".to_owned()),
    ]
}

/// Any message a running view can receive after the dataset is in.
fn arb_msg() -> impl Strategy<Value = ReportMsg> {
    prop_oneof![
        arb_status().prop_map(ReportMsg::ToggleColor),
        Just(ReportMsg::ToggleWeek),
        Just(ReportMsg::ToggleAll),
        Just(ReportMsg::ClearHidden),
        "[a-z0-9 ]{0,8}".prop_map(ReportMsg::SetSearch),
        arb_id().prop_map(|id_value| ReportMsg::HideMetric { id_value }),
        arb_column().prop_map(ReportMsg::SortHeaderClicked),
        Just(ReportMsg::ToggleOneTable),
        Just(ReportMsg::ToggleDashboard),
        arb_id().prop_map(|id_value| ReportMsg::ToggleDetail { id_value }),
        (arb_id(), prop::collection::vec(0.0f64..100.0, 0..5)).prop_map(|(id_value, values)| {
            ReportMsg::HistoryLoaded {
                id_value,
                series: MetricHistory::from_values(values),
            }
        }),
        arb_id().prop_map(|id_value| ReportMsg::HistoryFailed {
            id_value,
            details: "series lost".to_owned(),
        }),
    ]
}

// ──────────────────── invariant checks ────────────────────

/// Assert the derived-state invariants that must hold after any message.
fn assert_view_invariants(model: &ReportModel) {
    let filter = &model.filter;
    let expected_all = filter.filter_color_red
        && filter.filter_color_yellow
        && filter.filter_color_green
        && filter.filter_color_perfect
        && filter.filter_color_grey
        && filter.filter_color_missing
        && filter.filter_color_missing_source;
    assert_eq!(
        filter.filter_all, expected_all,
        "aggregate flag out of sync with the color flags"
    );

    let Some(dataset) = &model.dataset else {
        assert!(model.visible.is_empty(), "visible rows without a dataset");
        return;
    };

    // The derived list must equal its own derivation at the same clock.
    let expected = model
        .sort
        .apply(&model.filter.visible(&dataset.metrics, fixed_now()));
    assert_eq!(
        ids(&model.visible),
        ids(&expected),
        "visible list diverged from its filter-then-sort derivation"
    );

    let mut seen = HashSet::new();
    for row in &model.visible {
        assert!(
            model.filter.matches(row, fixed_now()),
            "visible row fails the filter predicate: {}",
            row.id_value
        );
        assert!(
            row.status.known().is_some(),
            "row with unrecognized status became visible: {}",
            row.id_value
        );
        assert!(
            seen.insert(row.id_value.as_str()),
            "duplicate visible row: {}",
            row.id_value
        );
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any sequence of 1-40 messages preserves the derived-state invariants.
    #[test]
    fn update_preserves_view_invariants(
        msgs in prop::collection::vec(arb_msg(), 1..40)
    ) {
        let mut model = loaded_model();
        for msg in msgs {
            let _ = update_at(&mut model, msg, fixed_now());
            assert_view_invariants(&model);
        }
    }

    /// Toggling the same color twice restores the filter exactly, from any
    /// reachable state.
    #[test]
    fn color_toggle_is_self_inverse(
        status in arb_status(),
        prelude in prop::collection::vec(arb_msg(), 0..10)
    ) {
        let mut model = loaded_model();
        for msg in prelude {
            let _ = update_at(&mut model, msg, fixed_now());
        }
        let before = model.filter.clone();
        let _ = update_at(&mut model, ReportMsg::ToggleColor(status), fixed_now());
        let _ = update_at(&mut model, ReportMsg::ToggleColor(status), fixed_now());
        prop_assert_eq!(model.filter, before);
    }

    /// Sorting is stable, so re-applying a sort to its own output is a no-op.
    #[test]
    fn sort_apply_is_idempotent(
        clicks in prop::collection::vec(arb_column(), 0..6)
    ) {
        let mut sort = SortState::default();
        for column in clicks {
            sort.on_header_click(column);
        }
        let metrics = sample_dataset().metrics;
        let once = sort.apply(&metrics);
        let twice = sort.apply(&once);
        prop_assert_eq!(ids(&twice), ids(&once));
    }

    /// Sorting permutes the input; it never adds, drops, or duplicates rows.
    #[test]
    fn sort_apply_is_a_permutation(
        clicks in prop::collection::vec(arb_column(), 0..6)
    ) {
        let mut sort = SortState::default();
        for column in clicks {
            sort.on_header_click(column);
        }
        let metrics = sample_dataset().metrics;
        let sorted = sort.apply(&metrics);
        let mut before = ids(&metrics);
        let mut after = ids(&sorted);
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(after, before);
    }

    /// A second click on the active header keeps column and key and flips
    /// only the direction.
    #[test]
    fn reclick_flips_direction_only(column in arb_column()) {
        let mut sort = SortState::default();
        sort.on_header_click(column);
        let after_one = sort.clone();
        sort.on_header_click(column);
        prop_assert_eq!(sort.column_name, after_one.column_name);
        prop_assert_eq!(sort.sort_key, after_one.sort_key);
        prop_assert_ne!(sort.ascending, after_one.ascending);
    }

    /// The filter slice written by any reachable state rehydrates unchanged.
    #[test]
    fn filter_round_trips_through_persistence(
        msgs in prop::collection::vec(arb_msg(), 0..25)
    ) {
        let mut model = loaded_model();
        for msg in msgs {
            let _ = update_at(&mut model, msg, fixed_now());
        }
        let blob = serde_json::to_string(&model.filter).unwrap();
        prop_assert_eq!(Filter::from_persisted(Some(blob.as_str())), model.filter);
    }

    /// The sort slice rehydrates unchanged from any click sequence.
    #[test]
    fn sort_round_trips_through_persistence(
        clicks in prop::collection::vec(arb_column(), 0..8)
    ) {
        let mut sort = SortState::default();
        for column in clicks {
            sort.on_header_click(column);
        }
        let blob = serde_json::to_string(&sort).unwrap();
        prop_assert_eq!(SortState::from_persisted(Some(blob.as_str())), sort);
    }
}
