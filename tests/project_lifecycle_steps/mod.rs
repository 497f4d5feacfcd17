//! Step definitions for project lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
