//! When steps for project lifecycle BDD scenarios.

use super::world::{MarketWorld, run_async};
use chrono::Duration;
use rstest_bdd_macros::when;
use tender::marketplace::{
    domain::{Role, UploadedFile},
    services::{RateCounterpartRequest, SubmitProposalRequest},
};

#[when("{days:u32} days pass")]
fn days_pass(world: &mut MarketWorld, days: u32) {
    world.clock.advance(Duration::days(i64::from(days)));
}

#[when(r#"the client selects the proposal from "{name}""#)]
fn client_selects(world: &mut MarketWorld, name: String) -> Result<(), eyre::Report> {
    let project_id = world.project()?.id();
    let proposal_id = world
        .proposals
        .get(&name)
        .map(|proposal| proposal.id())
        .ok_or_else(|| eyre::eyre!("no proposal from {name}"))?;
    let result = run_async(world.marketplace.projects.select_contractor(
        world.client,
        project_id,
        proposal_id,
    ));
    if let Some(selected) = world.record(result) {
        world.project = Some(selected.project);
    }
    Ok(())
}

#[when(r#"contractor "{name}" bids {price:i64} on the project"#)]
fn contractor_bids(world: &mut MarketWorld, name: String, price: i64) -> Result<(), eyre::Report> {
    let bidder = world.contractor(&name);
    let project_id = world.project()?.id();
    let result = run_async(world.marketplace.proposals.submit_proposal(
        bidder,
        SubmitProposalRequest::new(project_id, "Still available", price),
    ));
    if let Some(proposal) = world.record(result) {
        world.proposals.insert(name, proposal);
    }
    Ok(())
}

#[when(r#"contractor "{name}" uploads "{file_name}""#)]
fn contractor_uploads(
    world: &mut MarketWorld,
    name: String,
    file_name: String,
) -> Result<(), eyre::Report> {
    let uploader = world.contractor(&name);
    let project_id = world.project()?.id();
    let result = run_async(world.marketplace.files.upload_file(
        uploader,
        project_id,
        UploadedFile::new(file_name, b"deliverable".to_vec()),
    ));
    if let Some(attachment) = world.record(result) {
        world.last_upload = Some(attachment);
    }
    Ok(())
}

#[when("the client requests a revision")]
fn client_requests_revision(world: &mut MarketWorld) -> Result<(), eyre::Report> {
    let project_id = world.project()?.id();
    let result = run_async(
        world
            .marketplace
            .projects
            .request_revision(world.client, project_id),
    );
    if let Some(project) = world.record(result) {
        world.project = Some(project);
    }
    Ok(())
}

#[when("the client accepts the deliverable")]
fn client_accepts(world: &mut MarketWorld) -> Result<(), eyre::Report> {
    let project_id = world.project()?.id();
    let result = run_async(
        world
            .marketplace
            .projects
            .accept_deliverable(world.client, project_id),
    );
    if let Some(project) = world.record(result) {
        world.project = Some(project);
    }
    Ok(())
}

#[when(r#"the client rates contractor "{name}" with {stars:i64} stars"#)]
fn client_rates(world: &mut MarketWorld, name: String, stars: i64) -> Result<(), eyre::Report> {
    if !world.contractors.contains_key(&name) {
        return Err(eyre::eyre!("unknown contractor {name}"));
    }
    let project_id = world.project()?.id();
    let request = RateCounterpartRequest {
        project_id,
        target_role: Role::Contractor,
        quality: stars,
        communication: stars,
        timeliness: stars,
        comment: None,
    };
    let result = run_async(world.marketplace.ratings.rate_counterpart(world.client, request));
    world.record(result);
    Ok(())
}
