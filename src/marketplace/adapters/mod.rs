//! Adapter implementations for marketplace ports.

pub mod fs;
pub mod memory;
pub mod postgres;
