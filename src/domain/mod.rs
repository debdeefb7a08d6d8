//! Core domain types and logic: indicators, exit simulation, per-instrument
//! pipeline and the batch driver.

pub mod bar;
pub mod batch;
pub mod calendar;
pub mod config_validation;
pub mod error;
pub mod exit;
pub mod indicator;
pub mod instrument;
pub mod scan_config;
pub mod snapshot;
pub mod universe;
