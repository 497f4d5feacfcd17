//! Then steps for project lifecycle BDD scenarios.

use super::world::{MarketWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use tender::marketplace::domain::{ProjectStatus, ProposalStatus, Role};

#[then(r#"the action fails with "{kind}""#)]
fn action_fails_with(world: &MarketWorld, kind: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected a failure, but the last action succeeded"))?;
    if err.kind().as_str() != kind {
        return Err(eyre::eyre!("expected {kind}, got {} ({err})", err.kind()));
    }
    Ok(())
}

#[then(r#"the project status is "{status}""#)]
fn project_status_is(world: &MarketWorld, status: String) -> Result<(), eyre::Report> {
    let expected = ProjectStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let project_id = world.project()?.id();
    let projects = run_async(world.marketplace.projects.list_my_projects(world.client))
        .wrap_err("list client projects")?;
    let stored = projects
        .iter()
        .find(|project| project.id() == project_id)
        .ok_or_else(|| eyre::eyre!("project missing from client listing"))?;
    if stored.status() != expected {
        return Err(eyre::eyre!("expected {expected}, found {}", stored.status()));
    }
    Ok(())
}

#[then(r#"the proposal from "{name}" is "{status}""#)]
fn proposal_status_is(world: &MarketWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let expected = ProposalStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let proposal_id = world
        .proposals
        .get(&name)
        .map(|proposal| proposal.id())
        .ok_or_else(|| eyre::eyre!("no proposal from {name}"))?;
    let project_id = world.project()?.id();
    let proposals = run_async(
        world
            .marketplace
            .proposals
            .list_project_proposals(world.client, project_id),
    )
    .wrap_err("list proposals")?;
    let stored = proposals
        .iter()
        .find(|proposal| proposal.id() == proposal_id)
        .ok_or_else(|| eyre::eyre!("proposal from {name} is missing"))?;
    if stored.status() != expected {
        return Err(eyre::eyre!("expected {expected}, found {}", stored.status()));
    }
    Ok(())
}

#[then("the latest upload is version {version:i64}")]
fn latest_upload_version(world: &MarketWorld, version: i64) -> Result<(), eyre::Report> {
    let upload = world
        .last_upload
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no upload recorded"))?;
    if i64::from(upload.version().value()) != version {
        return Err(eyre::eyre!(
            "expected version {version}, found {}",
            upload.version().value()
        ));
    }
    Ok(())
}

#[then(r#"contractor "{name}" has {count:u32} rating"#)]
fn contractor_rating_count(world: &MarketWorld, name: String, count: u32) -> Result<(), eyre::Report> {
    let contractor = world
        .contractors
        .get(&name)
        .ok_or_else(|| eyre::eyre!("unknown contractor {name}"))?;
    let summary = run_async(
        world
            .marketplace
            .ratings
            .summary(contractor.user_id(), Role::Contractor),
    )
    .wrap_err("summarise ratings")?;
    if summary.count != count {
        return Err(eyre::eyre!("expected {count} ratings, found {}", summary.count));
    }
    Ok(())
}
