// crates/flagship-core/src/lib.rs
// ============================================================================
// Module: Flagship Core
// Description: Domain models and storage contracts for the Flagship client.
// Purpose: Define the backend-agnostic types and traits consumed by storage
//          implementations and upstream synchronizers.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `flagship-core` defines the domain vocabulary of a feature-flag client
//! (splits, segments, impressions, events, telemetry aggregates) and the
//! storage contracts a persistence backend must satisfy. The crate contains
//! no storage engine code; concrete backends live in sibling crates such as
//! `flagship-store-sqlite`.
//!
//! Storage contracts follow a narrow, fixed operation set: keyed upsert
//! stores for configuration data, bounded FIFO queues with overflow
//! notification for telemetry payloads, and atomic aggregation counters.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::core::events::Event;
pub use crate::core::events::EventEnvelope;
pub use crate::core::impressions::Impression;
pub use crate::core::segments::Segment;
pub use crate::core::splits::Split;
pub use crate::core::telemetry::LATENCY_BUCKET_COUNT;
pub use crate::core::telemetry::LatencyBuckets;
pub use crate::interfaces::EventStorage;
pub use crate::interfaces::ImpressionStorage;
pub use crate::interfaces::MembershipStorage;
pub use crate::interfaces::SegmentStorage;
pub use crate::interfaces::SplitStorage;
pub use crate::interfaces::StorageError;
pub use crate::interfaces::TableFullHook;
pub use crate::interfaces::TelemetryStorage;
