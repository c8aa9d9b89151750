// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Two-pass construction of the [`ResourceGraph`].
//!
//! The first pass creates nodes and a lookup-by-slug index per kind. The
//! second pass resolves every relationship edge against those indexes and
//! fails closed on the first miss.

use std::collections::HashMap;

use tracing::debug;

use super::{
    Member, MemberRef, Organization, Project, ResourceGraph, ResourceKind, Team, TeamRef,
    raw::{RawMember, RawOrganization, RawProject, RawTeam},
};
use crate::error::Error;

const DEFAULT_PLATFORM: &str = "other";
const DEFAULT_ROLE: &str = "member";

/// Builds a validated resource graph from raw API records.
///
/// Relationship lists keep the order in which the API reported them; team
/// member lists follow member discovery order.
///
/// # Errors
///
/// * [`Error::InvalidSlug`] when a slug is blank.
/// * [`Error::Validation`] when a slug is duplicated within its kind or a
///   member has neither an email nor a username.
/// * [`Error::DanglingReference`] when a project or member references a team
///   slug that is not part of `teams`.
pub fn build(
    organization: &RawOrganization,
    teams: &[RawTeam],
    projects: &[RawProject],
    members: &[RawMember],
) -> Result<ResourceGraph, Error,>
{
    let organization = Organization {
        id:   organization.id.clone(),
        slug: require_slug(ResourceKind::Organization, &organization.slug,)?.to_owned(),
        name: display_name(&organization.name, &organization.slug,),
    };

    let mut team_index = HashMap::with_capacity(teams.len(),);
    let mut team_nodes = Vec::with_capacity(teams.len(),);
    for raw in teams {
        let slug = require_slug(ResourceKind::Team, &raw.slug,)?;
        if team_index.insert(slug, TeamRef(team_nodes.len(),),).is_some() {
            return Err(Error::validation(format!("duplicate team slug '{slug}'"),),);
        }
        team_nodes.push(Team {
            id:      raw.id.clone(),
            slug:    slug.to_owned(),
            name:    display_name(&raw.name, slug,),
            members: Vec::new(),
        },);
    }

    let mut project_nodes = Vec::with_capacity(projects.len(),);
    let mut seen_projects = HashMap::with_capacity(projects.len(),);
    for raw in projects {
        let slug = require_slug(ResourceKind::Project, &raw.slug,)?;
        if seen_projects.insert(slug, project_nodes.len(),).is_some() {
            return Err(Error::validation(format!("duplicate project slug '{slug}'"),),);
        }
        project_nodes.push(Project {
            id:       raw.id.clone(),
            slug:     slug.to_owned(),
            name:     display_name(&raw.name, slug,),
            platform: raw
                .platform
                .as_deref()
                .map(str::trim,)
                .filter(|platform| !platform.is_empty(),)
                .unwrap_or(DEFAULT_PLATFORM,)
                .to_owned(),
            status:   raw.status.clone(),
            teams:    Vec::new(),
        },);
    }

    let mut member_nodes = Vec::with_capacity(members.len(),);
    let mut seen_members = HashMap::with_capacity(members.len(),);
    for raw in members {
        let key = raw.key().ok_or_else(|| {
            Error::validation(format!(
                "member {} has neither an email nor a username",
                raw.id.as_deref().or(raw.name.as_deref(),).unwrap_or("<unknown>",)
            ),)
        },)?;
        if seen_members.insert(key, member_nodes.len(),).is_some() {
            return Err(Error::validation(format!("duplicate member '{key}'"),),);
        }
        member_nodes.push(Member {
            id:      raw.id.clone(),
            key:     key.to_owned(),
            email:   raw.email.as_deref().map(str::trim,).filter(|email| !email.is_empty(),).map(str::to_owned,),
            name:    raw.name.as_deref().map_or_else(|| key.to_owned(), |name| display_name(name, key,),),
            role:    raw
                .org_role
                .as_deref()
                .or(raw.role.as_deref(),)
                .filter(|role| !role.is_empty(),)
                .unwrap_or(DEFAULT_ROLE,)
                .to_owned(),
            teams:   Vec::new(),
            pending: raw.pending,
        },);
    }

    debug!(
        "Indexed {} teams, {} projects and {} members",
        team_nodes.len(),
        project_nodes.len(),
        member_nodes.len()
    );

    for (node, raw) in project_nodes.iter_mut().zip(projects,) {
        let owner = format!("project '{}'", node.slug);
        node.teams = resolve_teams(&team_index, raw.teams.iter().map(|team| team.slug(),), &owner,)?;
    }

    for (index, (node, raw,),) in member_nodes.iter_mut().zip(members,).enumerate() {
        let owner = format!("member '{}'", node.key);
        node.teams = resolve_teams(&team_index, raw.teams.iter().map(|team| team.slug(),), &owner,)?;
        for team in &node.teams {
            team_nodes[team.0].members.push(MemberRef(index,),);
        }
    }

    Ok(ResourceGraph {
        organization,
        teams: team_nodes,
        projects: project_nodes,
        members: member_nodes,
    },)
}

fn resolve_teams<'a,>(
    index: &HashMap<&str, TeamRef,>,
    slugs: impl Iterator<Item = &'a str,>,
    owner: &str,
) -> Result<Vec<TeamRef,>, Error,>
{
    let mut resolved = Vec::new();
    for slug in slugs {
        let team = index.get(slug,).copied().ok_or_else(|| Error::DanglingReference {
            kind:  ResourceKind::Team,
            owner: owner.to_owned(),
            slug:  slug.to_owned(),
        },)?;
        if !resolved.contains(&team,) {
            resolved.push(team,);
        }
    }
    Ok(resolved,)
}

fn require_slug(kind: ResourceKind, slug: &str,) -> Result<&str, Error,>
{
    if slug.trim().is_empty() {
        return Err(Error::InvalidSlug {
            kind, slug: slug.to_owned(),
        },);
    }
    Ok(slug,)
}

fn display_name(name: &str, fallback: &str,) -> String
{
    let trimmed = name.trim();
    if trimmed.is_empty() { fallback.to_owned() } else { trimmed.to_owned() }
}
