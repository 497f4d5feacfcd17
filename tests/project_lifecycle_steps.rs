//! Behaviour tests for the project lifecycle from posting to ratings.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

#[path = "project_lifecycle_steps/mod.rs"]
mod project_lifecycle_steps_defs;
mod test_helpers;

use project_lifecycle_steps_defs::world::{MarketWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "Client hires a contractor once bidding closes"
)]
#[tokio::test(flavor = "multi_thread")]
async fn client_hires_after_bidding_closes(world: MarketWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "Late proposals are refused"
)]
#[tokio::test(flavor = "multi_thread")]
async fn late_proposals_are_refused(world: MarketWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "A revision round before acceptance"
)]
#[tokio::test(flavor = "multi_thread")]
async fn revision_round_before_acceptance(world: MarketWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "Uploads wait while the client reviews"
)]
#[tokio::test(flavor = "multi_thread")]
async fn uploads_wait_while_reviewing(world: MarketWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "Ratings close after the rating window"
)]
#[tokio::test(flavor = "multi_thread")]
async fn ratings_close_after_window(world: MarketWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/project_lifecycle.feature",
    name = "Each side rates the other once"
)]
#[tokio::test(flavor = "multi_thread")]
async fn each_side_rates_once(world: MarketWorld) {
    let _ = world;
}
