//! Repository layer for weight project persistence.
//!
//! # Responsibility
//! - Define the load/save/exists contract services depend on.
//! - Isolate flat-file layout details from service orchestration.
//!
//! # Invariants
//! - Repository reads return validated projects or semantic corruption
//!   errors, never partially parsed tables.

pub mod record_store;
