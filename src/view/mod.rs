//! The view-state engine: model, update function, and controller.
//!
//! The architecture is deliberately strict. [`model::ReportModel`] holds all
//! state, every mutation arrives as a [`model::ReportMsg`] through
//! [`controller::ReportViewController`], and [`update::update`] applies it
//! without performing any I/O. Side-effects come back as [`model::ReportCmd`]
//! values the controller executes, which gives the whole engine one total
//! order of operations and makes every transition reproducible in tests.

pub mod controller;
pub mod detail;
pub mod filter;
pub mod model;
pub mod sort;
pub mod storage;
pub mod update;

#[cfg(test)]
mod test_properties;

pub use controller::ReportViewController;
pub use model::{LoadPhase, ReportCmd, ReportModel, ReportMsg};
