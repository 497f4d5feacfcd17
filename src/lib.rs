//! Tender: a job-marketplace workflow engine.
//!
//! Clients post projects, contractors bid on them, and the selected
//! contractor delivers versioned files that the client reviews. Issues are
//! tracked on active projects and both sides rate each other after closure.
//! Every role-gated action is checked against a single lifecycle transition
//! table before any state is written.
//!
//! # Architecture
//!
//! Tender follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, sessions and credentials
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, filesystem, memory)
//!
//! # Modules
//!
//! - [`marketplace`]: Projects, proposals, files, issues and ratings
//! - [`config`]: Environment-driven runtime configuration
//! - [`telemetry`]: Structured logging setup

pub mod config;
pub mod marketplace;
pub mod telemetry;
