//! Casecast Core: observation tables, dataset ingest, forecasting seam, error metric.
//!
//! This crate holds everything the regressor selector and the forecast pipeline
//! build on:
//! - Date-indexed observation tables and train/test splitting
//! - OxCGRT-style CSV ingest and per-partition series reshaping
//! - The `Forecaster` / `ForecasterFactory` traits and a seasonal regression baseline
//! - Mean percent error with a divide-by-zero offset
//! - Content hashes of input tables

pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod forecast;
pub mod metrics;
