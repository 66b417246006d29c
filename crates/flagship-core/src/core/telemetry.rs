// crates/flagship-core/src/core/telemetry.rs
// ============================================================================
// Module: Telemetry Value Types
// Description: Aggregation value types for counters, gauges, and latencies.
// Purpose: Fix the latency histogram shape shared by storage and drains.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Latency histograms have a fixed shape: 22 buckets indexed `0..=21`, with
//! bucket selection performed by the caller. The storage layer only
//! increments by index, bounds-checked; out-of-range indexes are no-ops.

// ============================================================================
// SECTION: Latency Buckets
// ============================================================================

/// Number of buckets in a latency histogram.
pub const LATENCY_BUCKET_COUNT: usize = 22;

/// Full bucket array of one latency histogram, indexed `0..=21`.
pub type LatencyBuckets = [i64; LATENCY_BUCKET_COUNT];
