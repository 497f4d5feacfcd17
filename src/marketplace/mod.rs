//! Job marketplace workflow engine.
//!
//! Clients post projects, contractors bid on them, the selected contractor
//! delivers versioned files for review, issues are raised and resolved on
//! active projects, and both sides rate each other after closure. The
//! module follows hexagonal architecture:
//!
//! - Domain types and the lifecycle engine in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
