//! Unit tests for the marketplace domain, engine and services.

mod support;
