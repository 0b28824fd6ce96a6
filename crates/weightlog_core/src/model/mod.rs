//! Weight project domain model.
//!
//! # Responsibility
//! - Define the canonical `(date, weight)` record and the bounded project
//!   table built from it.
//!
//! # Invariants
//! - A project is never observed in an unsorted or unbounded state.

pub mod record;
