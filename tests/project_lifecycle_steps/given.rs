//! Given steps for project lifecycle BDD scenarios.

use super::world::{MarketWorld, run_async};
use crate::test_helpers::base_time;
use chrono::Duration;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tender::marketplace::{
    domain::UploadedFile,
    services::{ProjectDraft, SubmitProposalRequest},
};

#[given("a client has posted a project with bidding open for {days:u32} days")]
fn project_with_deadline(world: &mut MarketWorld, days: u32) -> Result<(), eyre::Report> {
    let draft = ProjectDraft::new("Brand refresh", "Logo and palette", 1_500)
        .with_bid_deadline(base_time() + Duration::days(i64::from(days)));
    let project = run_async(world.marketplace.projects.create_project(world.client, draft))
        .wrap_err("post project in scenario setup")?;
    world.project = Some(project);
    Ok(())
}

#[given(r#"contractor "{name}" has bid {price:i64} on the project"#)]
fn contractor_has_bid(world: &mut MarketWorld, name: String, price: i64) -> Result<(), eyre::Report> {
    let bidder = world.contractor(&name);
    let project_id = world.project()?.id();
    let proposal = run_async(world.marketplace.proposals.submit_proposal(
        bidder,
        SubmitProposalRequest::new(project_id, "Portfolio attached", price),
    ))
    .wrap_err("submit proposal in scenario setup")?;
    world.proposals.insert(name, proposal);
    Ok(())
}

#[given(r#"a client has hired contractor "{name}""#)]
fn client_has_hired(world: &mut MarketWorld, name: String) -> Result<(), eyre::Report> {
    let draft = ProjectDraft::new("Brand refresh", "Logo and palette", 1_500);
    let project = run_async(world.marketplace.projects.create_project(world.client, draft))
        .wrap_err("post project in scenario setup")?;
    let bidder = world.contractor(&name);
    let proposal = run_async(world.marketplace.proposals.submit_proposal(
        bidder,
        SubmitProposalRequest::new(project.id(), "Portfolio attached", 1_200),
    ))
    .wrap_err("submit proposal in scenario setup")?;
    let selected = run_async(world.marketplace.projects.select_contractor(
        world.client,
        project.id(),
        proposal.id(),
    ))
    .wrap_err("select contractor in scenario setup")?;
    world.proposals.insert(name, proposal);
    world.project = Some(selected.project);
    Ok(())
}

#[given(r#"contractor "{name}" has delivered and the client accepted"#)]
fn delivered_and_accepted(world: &mut MarketWorld, name: String) -> Result<(), eyre::Report> {
    let bidder = world.contractor(&name);
    let project_id = world.project()?.id();
    run_async(world.marketplace.files.upload_file(
        bidder,
        project_id,
        UploadedFile::new("final.pdf", b"%PDF-1.7".to_vec()),
    ))
    .wrap_err("upload deliverable in scenario setup")?;
    let closed = run_async(
        world
            .marketplace
            .projects
            .accept_deliverable(world.client, project_id),
    )
    .wrap_err("accept deliverable in scenario setup")?;
    world.project = Some(closed);
    Ok(())
}
