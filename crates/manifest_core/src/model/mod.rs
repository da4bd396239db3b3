//! In-memory aggregates for the yearly planning model.
//!
//! # Responsibility
//! - Define the nested document shape callers read and write as a whole.
//! - Define the JSON shape used by the UI bridge and export files.
//!
//! # Invariants
//! - Quarter and month slots are fixed-length arrays, never sparse maps.
//! - Aggregates are transient views; the store owns persisted state.

pub mod account;
pub mod annual;
pub mod dimension;
pub mod task;
