//! Lurebench library — phishing-page corpus builder and classifier
//! robustness harness.
//!
//! This library crate exposes the core modules for integration testing.

pub mod cli;
pub mod corpus;
pub mod eval;
pub mod extraction;
pub mod model;
pub mod oracle;
pub mod perturb;
pub mod renderer;
pub mod store;
