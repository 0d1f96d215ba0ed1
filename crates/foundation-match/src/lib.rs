//! Foundation matching: narrows a corpus of grant-making foundations down to a ranked,
//! explained shortlist for a single project description.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
