// crates/flagship-core/src/core/mod.rs
// ============================================================================
// Module: Flagship Core Models
// Description: Domain model types for splits, segments, and telemetry data.
// Purpose: Group the model submodules under a single namespace.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Model types shared by storage backends and synchronizers. Each submodule
//! owns one record family: feature definitions (`splits`), segment
//! membership (`segments`), evaluation telemetry (`impressions`, `events`),
//! and aggregation value types (`telemetry`).

/// Event payloads queued for asynchronous delivery.
pub mod events;
/// Evaluation impressions queued for asynchronous delivery.
pub mod impressions;
/// Segment definitions and membership sets.
pub mod segments;
/// Feature (split) definitions.
pub mod splits;
/// Aggregation value types for counters, gauges, and latency histograms.
pub mod telemetry;
