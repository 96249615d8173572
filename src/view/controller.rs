//! Controller: couples the pure update function to persistence, the data
//! sources, and the message channel.
//!
//! One consumer processes messages strictly in arrival order; each message's
//! commands (including the synchronous persistence write) complete before the
//! next message is taken. Fetches run on worker threads and deliver their
//! completions into the same queue, so the engine behaves single-threaded.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::de::DeserializeOwned;

use crate::core::config::DisplayConfig;
use crate::logger::jsonl::{DiagnosticsLog, EventType, LogEntry, Severity};
use crate::source::request::ResourceRequest;
use crate::source::{DatasetSource, HistorySource};
use crate::view::filter::Filter;
use crate::view::model::{DatasetPayload, ReportCmd, ReportModel, ReportMsg, StateSlice};
use crate::view::sort::SortState;
use crate::view::storage::{KeyValueStore, SliceOutcome, keys, load_slice, store_slice};
use crate::view::update::update;

/// The top-level owner of all view state for one report.
pub struct ReportViewController<S> {
    model: ReportModel,
    store: S,
    dataset_source: Arc<dyn DatasetSource>,
    history_source: Arc<dyn HistorySource>,
    log: DiagnosticsLog,
    tx: Sender<ReportMsg>,
    rx: Receiver<ReportMsg>,
}

impl<S: KeyValueStore> ReportViewController<S> {
    /// Construct the controller, rehydrating the persisted view-state slices.
    /// Absent and corrupt blobs fall back to defaults; corruption is logged.
    pub fn new(
        store: S,
        dataset_source: Arc<dyn DatasetSource>,
        history_source: Arc<dyn HistorySource>,
        log: DiagnosticsLog,
    ) -> Self {
        Self::with_defaults(
            store,
            dataset_source,
            history_source,
            log,
            &DisplayConfig::default(),
        )
    }

    /// Like [`Self::new`], with configured first-visit display defaults.
    /// Persisted toggles still win; the defaults only fill absent slices.
    pub fn with_defaults(
        store: S,
        dataset_source: Arc<dyn DatasetSource>,
        history_source: Arc<dyn HistorySource>,
        log: DiagnosticsLog,
        display: &DisplayConfig,
    ) -> Self {
        let filter: Filter = Self::rehydrate(&store, keys::FILTER, &log).unwrap_or_default();
        let sort: SortState = Self::rehydrate(&store, keys::SORT_ORDER, &log).unwrap_or_default();
        let show_one_table =
            Self::rehydrate(&store, keys::SHOW_ONE_TABLE, &log).unwrap_or(display.one_table);
        let show_dashboard =
            Self::rehydrate(&store, keys::SHOW_DASHBOARD, &log).unwrap_or(display.dashboard);

        // The queue only ever holds a handful of user events and fetch
        // completions, so no backpressure is needed.
        let (tx, rx) = unbounded();

        Self {
            model: ReportModel::new(filter, sort, show_one_table, show_dashboard),
            store,
            dataset_source,
            history_source,
            log,
            tx,
            rx,
        }
    }

    fn rehydrate<T: DeserializeOwned>(store: &S, key: &str, log: &DiagnosticsLog) -> Option<T> {
        let outcome = load_slice(store, key);
        if let Some(details) = outcome.corrupt_details() {
            let mut entry = LogEntry::new(EventType::StateLoad, Severity::Warning);
            entry.key = Some(key.to_owned());
            entry.details = Some(details.to_owned());
            log.record(&entry);
        }
        match outcome {
            SliceOutcome::Loaded(value) => Some(value),
            SliceOutcome::Missing | SliceOutcome::Corrupt { .. } => None,
        }
    }

    /// Current state, read-only. All mutation goes through messages.
    #[must_use]
    pub fn model(&self) -> &ReportModel {
        &self.model
    }

    /// Enqueue a message behind everything already queued.
    pub fn send(&self, msg: ReportMsg) {
        // The controller owns the receiver, so the channel cannot be closed.
        let _ = self.tx.send(msg);
    }

    /// Process every message already in the queue, in order.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.dispatch(msg);
            handled += 1;
        }
        handled
    }

    /// Drive the loop until the queue is empty and no fetch is in flight.
    /// A stalled fetch blocks here indefinitely, matching the view staying
    /// in its loading state.
    pub fn run_until_idle(&mut self) {
        loop {
            self.pump();
            if self.model.is_idle() {
                return;
            }
            match self.rx.recv() {
                Ok(msg) => self.dispatch(msg),
                Err(_) => return,
            }
        }
    }

    // ──────────────────── dispatch ────────────────────

    fn dispatch(&mut self, msg: ReportMsg) {
        self.log_message(&msg);
        let cmd = update(&mut self.model, msg);
        self.execute(cmd);
    }

    fn log_message(&self, msg: &ReportMsg) {
        match msg {
            ReportMsg::DatasetLoaded(payload) => {
                for (id_value, raw) in &payload.warnings.unknown_statuses {
                    let mut entry = LogEntry::new(EventType::UnknownStatus, Severity::Warning);
                    entry.metric = Some(id_value.clone());
                    entry.details = Some(raw.clone());
                    self.log.record(&entry);
                }
                let mut entry = LogEntry::new(EventType::DatasetLoaded, Severity::Info);
                entry.ok = Some(true);
                entry.count = Some(payload.dataset.metrics.len() as u64);
                if !payload.warnings.duplicate_ids.is_empty() {
                    entry.details = Some(format!(
                        "duplicate metric ids: {}",
                        payload.warnings.duplicate_ids.join(", ")
                    ));
                }
                self.log.record(&entry);
            }
            ReportMsg::DatasetFailed { details } => {
                let mut entry = LogEntry::new(EventType::DatasetFetch, Severity::Critical);
                entry.ok = Some(false);
                entry.details = Some(details.clone());
                self.log.record(&entry);
            }
            ReportMsg::HistoryFailed { id_value, details } => {
                let mut entry = LogEntry::new(EventType::HistoryFetch, Severity::Warning);
                entry.ok = Some(false);
                entry.metric = Some(id_value.clone());
                entry.details = Some(details.clone());
                self.log.record(&entry);
            }
            _ => {}
        }
    }

    // ──────────────────── command execution ────────────────────

    fn execute(&mut self, cmd: ReportCmd) {
        match cmd {
            ReportCmd::None => {}
            ReportCmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                }
            }
            ReportCmd::Persist(slice) => self.persist(slice),
            ReportCmd::FetchDataset => self.spawn_dataset_fetch(),
            ReportCmd::FetchHistory {
                id_value,
                history_id,
            } => self.spawn_history_fetch(id_value, history_id),
        }
    }

    fn persist(&mut self, slice: StateSlice) {
        match slice {
            StateSlice::Filter => store_slice(&mut self.store, slice.key(), &self.model.filter),
            StateSlice::ShowOneTable => {
                store_slice(&mut self.store, slice.key(), &self.model.show_one_table);
            }
            StateSlice::ShowDashboard => {
                store_slice(&mut self.store, slice.key(), &self.model.show_dashboard);
            }
            StateSlice::SortOrder => store_slice(&mut self.store, slice.key(), &self.model.sort),
        }
        if let Some(details) = self.store.take_write_error() {
            let mut entry = LogEntry::new(EventType::StateWrite, Severity::Warning);
            entry.key = Some(slice.key().to_owned());
            entry.details = Some(details);
            self.log.record(&entry);
        }
    }

    fn spawn_dataset_fetch(&self) {
        let source = Arc::clone(&self.dataset_source);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("qrv-dataset".to_owned())
            .spawn(move || {
                let msg = match source.fetch_dataset(&ResourceRequest::dataset()) {
                    Ok((dataset, warnings)) => {
                        ReportMsg::DatasetLoaded(Box::new(DatasetPayload { dataset, warnings }))
                    }
                    Err(err) => ReportMsg::DatasetFailed {
                        details: err.to_string(),
                    },
                };
                let _ = tx.send(msg);
            });
        if let Err(err) = spawned {
            let _ = self.tx.send(ReportMsg::DatasetFailed {
                details: format!("failed to spawn fetch thread: {err}"),
            });
        }
    }

    fn spawn_history_fetch(&self, id_value: String, history_id: String) {
        let source = Arc::clone(&self.history_source);
        let tx = self.tx.clone();
        let spawn_id = id_value.clone();
        let spawned = thread::Builder::new()
            .name("qrv-history".to_owned())
            .spawn(move || {
                let msg = match source.fetch_history(&ResourceRequest::history(&history_id)) {
                    Ok(series) => ReportMsg::HistoryLoaded {
                        id_value: spawn_id,
                        series,
                    },
                    Err(err) => ReportMsg::HistoryFailed {
                        id_value: spawn_id,
                        details: err.to_string(),
                    },
                };
                let _ = tx.send(msg);
            });
        if let Err(err) = spawned {
            let _ = self.tx.send(ReportMsg::HistoryFailed {
                id_value,
                details: format!("failed to spawn fetch thread: {err}"),
            });
        }
    }
}

// ──────────────────── tests ────────────────────
