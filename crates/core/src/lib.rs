//! Domain types shared by the leadsync crates.
//!
//! Holds the OAuth credential record, the lead shape returned by amoCRM,
//! custom-field normalization, and the core error type. Nothing in here
//! performs I/O.

pub mod credential;
pub mod error;
pub mod lead;
pub mod types;
