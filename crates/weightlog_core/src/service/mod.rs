//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record store calls into recording and projection use-cases.
//! - Keep the CLI decoupled from storage details.

pub mod projection;
pub mod record_service;
