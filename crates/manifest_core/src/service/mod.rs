//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the operations a UI bridge invokes.
//! - Keep callers decoupled from SQL and transaction details.

pub mod planner_service;
