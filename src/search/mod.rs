//! Search orchestration module
//!
//! The client entry points, the request models and the disjunctive facet
//! fan-out.

mod client;
mod disjunctive;
mod models;

pub use client::Client;
pub use models::*;
