//! Traffic map render service.
//!
//! One run reads a render request, answers it from the content-addressed
//! cache or renders it, and writes the base64 result.

pub mod config;
pub mod run;

pub use config::RunConfig;
pub use run::{run, RunSummary};
