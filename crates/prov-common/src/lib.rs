//! Common types and utilities for the provenance resolver.
//!
//! This crate provides foundational types used across all prov crates:
//! - Source spans (`Span`)
//! - Position/line-map types for line/column source locations
//! - Centralized limits and thresholds
//! - Cooperative cancellation (`CancellationToken`)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/LineMap types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Centralized limits and thresholds
pub mod limits;

// Cooperative cancellation shared between a host and a resolution
pub mod cancellation;
pub use cancellation::CancellationToken;
