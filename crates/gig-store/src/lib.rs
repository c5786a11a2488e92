//! Persistence for the Gigboard backend.
//!
//! This crate provides:
//! - Repository traits for jobs, users and fraud reports
//! - An in-memory store with last-writer-wins or version-checked writes
//! - Store operation metrics

pub mod error;
pub mod memory;
pub mod metrics;
pub mod repos;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, WriteMode};
pub use repos::{FraudReportRepository, JobRepository, UserRepository};
