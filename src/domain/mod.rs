//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Rich domain types (validated, business-logic-ready)
//! - `wire.rs` — Raw serde structs matching server payloads
//! - `convert.rs` — `TryFrom` conversions with validation
//! - `state.rs` — State containers with update methods (for WS-driven data)

pub mod series;
pub mod session;
