//! `PostgreSQL` integration tests for the marketplace repository.
//!
//! Tests are organized into modules by functionality:
//! - `cluster`: Embedded `PostgreSQL` cluster lifecycle helpers
//! - `migration_tests`: Schema ledger and idempotent migrations
//! - `repository_tests`: the shared repository contract
//! - `workflow_tests`: services running over the `PostgreSQL` adapter
//!
//! When no cluster can be started (for example when running as root), the
//! tests log a `SKIP-TEST-CLUSTER` line and return early.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::print_stderr,
    reason = "Skipped tests report why the cluster is unavailable"
)]

mod repository_contract;
mod test_helpers;

mod postgres {
    pub mod cluster;
    pub mod helpers;

    mod migration_tests;
    mod repository_tests;
    mod workflow_tests;
}
