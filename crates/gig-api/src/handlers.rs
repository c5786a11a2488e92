//! Request handlers.

pub mod admin;
pub mod fraud;
pub mod health;
pub mod jobs;
pub mod users;

pub use health::*;
