// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Discovers the resources of one Sentry organization.
//!
//! Selects the organization, fetches every resource kind the requested
//! [`Scope`] needs, decodes the raw records and applies the configured
//! [`Filters`]. Any failed fetch aborts discovery.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    api::{ApiClient, Resource, Transport},
    config::Filters,
    error::Error,
    model::{
        ResourceGraph, build,
        raw::{RawMember, RawOrganization, RawProject, RawTeam},
    },
};

/// Resource kinds fetched by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize,)]
#[serde(rename_all = "kebab-case")]
pub enum Scope
{
    /// Teams, projects and members.
    #[default]
    All,
    /// Teams and members.
    TeamsOnly,
    /// Teams and projects. Teams are fetched because projects reference them.
    ProjectsOnly,
}

impl Scope
{
    /// Whether projects are fetched.
    pub fn includes_projects(self,) -> bool
    {
        !matches!(self, Self::TeamsOnly)
    }

    /// Whether members are fetched.
    pub fn includes_members(self,) -> bool
    {
        !matches!(self, Self::ProjectsOnly)
    }
}

/// Options controlling a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct DiscoveryOptions
{
    /// Organization slug; the first visible organization when `None`.
    pub organization: Option<String,>,
    /// Resource kinds to fetch.
    pub scope:        Scope,
    /// Filters applied to fetched records.
    pub filters:      Filters,
}

/// Raw records gathered by [`discover`], already filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct Inventory
{
    /// Selected organization.
    pub organization: RawOrganization,
    /// Teams in API order.
    pub teams:        Vec<RawTeam,>,
    /// Projects in API order; empty for [`Scope::TeamsOnly`].
    pub projects:     Vec<RawProject,>,
    /// Members in API order; empty for [`Scope::ProjectsOnly`].
    pub members:      Vec<RawMember,>,
}

impl Inventory
{
    /// Builds the validated resource graph from the inventory.
    ///
    /// # Errors
    ///
    /// See [`build`].
    pub fn build(&self,) -> Result<ResourceGraph, Error,>
    {
        build(&self.organization, &self.teams, &self.projects, &self.members,)
    }
}

/// Fetches and filters the resources of one organization.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no organization is configured and the
/// token sees none, and propagates any API or decoding error.
///
/// # Example
///
/// ```no_run
/// use stfd::{ApiClient, ApiConfig, DiscoveryOptions, discover};
///
/// # async fn example() -> Result<(), stfd::Error> {
/// let client = ApiClient::new(ApiConfig::new("https://sentry.io/api/0", "sntrys_token"),)?;
/// let inventory = discover(&client, &DiscoveryOptions::default(),).await?;
/// println!("{} teams", inventory.teams.len());
/// # Ok(())
/// # }
/// ```
pub async fn discover<T: Transport,>(
    client: &ApiClient<T,>,
    options: &DiscoveryOptions,
) -> Result<Inventory, Error,>
{
    let organization = select_organization(client, options.organization.as_deref(),).await?;
    let slug = organization.slug.clone();
    info!("Discovering resources for organization {}", slug);

    let teams: Vec<RawTeam,> = fetch_records(client, Resource::Teams, &slug,).await?;
    let total_teams = teams.len();
    let teams: Vec<RawTeam,> =
        teams.into_iter().filter(|team| options.filters.admits_team(&team.slug,),).collect();
    if teams.len() != total_teams {
        debug!("Team filters kept {} of {} teams", teams.len(), total_teams);
    }

    let projects = if options.scope.includes_projects() {
        let projects: Vec<RawProject,> = fetch_records(client, Resource::Projects, &slug,).await?;
        let total = projects.len();
        let mut kept: Vec<RawProject,> = projects
            .into_iter()
            .filter(|project| {
                options.filters.admits_project(
                    &project.slug,
                    project.platform.as_deref(),
                    project.status.as_deref(),
                )
            },)
            .collect();
        if options.filters.filters_teams() {
            for project in &mut kept {
                project.teams.retain(|team| options.filters.admits_team(team.slug(),),);
            }
        }
        if kept.len() != total {
            debug!("Project filters kept {} of {} projects", kept.len(), total);
        }
        kept
    } else {
        Vec::new()
    };

    let members = if options.scope.includes_members() {
        let mut members: Vec<RawMember,> = fetch_records(client, Resource::Members, &slug,).await?;
        if options.filters.filters_teams() {
            for member in &mut members {
                member.teams.retain(|team| options.filters.admits_team(team.slug(),),);
            }
        }
        members
    } else {
        Vec::new()
    };

    info!(
        "Discovered {} teams, {} projects and {} members in {}",
        teams.len(),
        projects.len(),
        members.len(),
        slug
    );

    Ok(Inventory {
        organization,
        teams,
        projects,
        members,
    },)
}

async fn select_organization<T: Transport,>(
    client: &ApiClient<T,>,
    slug: Option<&str,>,
) -> Result<RawOrganization, Error,>
{
    if let Some(slug,) = slug {
        let path = format!("organizations/{slug}/");
        let value = client.get_object(&path,).await?;
        return decode(&path, value,);
    }

    let organizations = client.list_organizations().await?;
    if organizations.len() > 1 {
        warn!(
            "Token can access {} organizations; using the first one. Set the organization \
             explicitly to choose another",
            organizations.len()
        );
    }

    let first = organizations.into_iter().next().ok_or_else(|| Error::NotFound {
        url: "organizations/".to_owned(),
    },)?;
    let organization: RawOrganization = decode("organizations/", first,)?;
    info!("Auto-selected organization {}", organization.slug);
    Ok(organization,)
}

async fn fetch_records<T: Transport, R: DeserializeOwned,>(
    client: &ApiClient<T,>,
    resource: Resource,
    organization: &str,
) -> Result<Vec<R,>, Error,>
{
    let source = format!("organizations/{organization}/{resource}/");
    client
        .fetch_all(resource, organization,)
        .await?
        .into_iter()
        .map(|value| decode(&source, value,),)
        .collect()
}

fn decode<R: DeserializeOwned,>(source: &str, value: Value,) -> Result<R, Error,>
{
    serde_json::from_value(value,).map_err(|e| Error::Decode {
        url: source.to_owned(), message: e.to_string(),
    },)
}
