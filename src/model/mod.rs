// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Normalized in-memory resource graph.
//!
//! The graph is owned by a single [`Organization`] and holds teams, projects
//! and members in discovery order. Cross-references between nodes are typed
//! indices ([`TeamRef`], [`MemberRef`]) that are validated when the graph is
//! built, so every lookup through [`ResourceGraph::team`] and
//! [`ResourceGraph::member`] is infallible.

mod build;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod raw;

use std::fmt;

use serde::Serialize;

pub use build::build;

/// Kinds of resources tracked by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind
{
    /// The Sentry organization.
    Organization,
    /// A team.
    Team,
    /// A project.
    Project,
    /// An organization member.
    Member,
    /// Membership of a member in a team.
    TeamMembership,
}

impl fmt::Display for ResourceKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        let label = match self {
            Self::Organization => "organization",
            Self::Team => "team",
            Self::Project => "project",
            Self::Member => "member",
            Self::TeamMembership => "team membership",
        };
        f.write_str(label,)
    }
}

/// Index of a team inside [`ResourceGraph::teams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,)]
pub struct TeamRef(usize,);

/// Index of a member inside [`ResourceGraph::members`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,)]
pub struct MemberRef(usize,);

impl TeamRef
{
    /// Position of the team in discovery order.
    pub fn index(self,) -> usize
    {
        self.0
    }
}

impl MemberRef
{
    /// Position of the member in discovery order.
    pub fn index(self,) -> usize
    {
        self.0
    }
}

/// Root of the graph.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Organization
{
    /// Remote identifier.
    pub id:   Option<String,>,
    /// Organization slug.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// Team node.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Team
{
    /// Remote identifier.
    pub id:      Option<String,>,
    /// Team slug.
    pub slug:    String,
    /// Display name; falls back to the slug.
    pub name:    String,
    /// Members of the team, in member discovery order.
    pub members: Vec<MemberRef,>,
}

/// Project node.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Project
{
    /// Remote identifier.
    pub id:       Option<String,>,
    /// Project slug.
    pub slug:     String,
    /// Display name; falls back to the slug.
    pub name:     String,
    /// Platform tag; `other` when the API omits it.
    pub platform: String,
    /// Lifecycle status, when reported.
    pub status:   Option<String,>,
    /// Owning teams, in API order.
    pub teams:    Vec<TeamRef,>,
}

/// Member node.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Member
{
    /// Remote identifier used for import keys.
    pub id:      Option<String,>,
    /// Unique key: email, or username when the email is absent.
    pub key:     String,
    /// Email address, when known.
    pub email:   Option<String,>,
    /// Display name; falls back to the key.
    pub name:    String,
    /// Organization role; `member` when the API omits it.
    pub role:    String,
    /// Teams the member belongs to, in API order.
    pub teams:   Vec<TeamRef,>,
    /// Whether the invitation is still pending.
    pub pending: bool,
}

/// Membership of a member in a team, derived from member team lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct TeamMembership
{
    /// Team side of the membership.
    pub team:   TeamRef,
    /// Member side of the membership.
    pub member: MemberRef,
}

/// Immutable graph of discovered resources.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ResourceGraph
{
    organization: Organization,
    teams:        Vec<Team,>,
    projects:     Vec<Project,>,
    members:      Vec<Member,>,
}

impl ResourceGraph
{
    /// Returns the organization at the root of the graph.
    pub fn organization(&self,) -> &Organization
    {
        &self.organization
    }

    /// Returns teams in discovery order.
    pub fn teams(&self,) -> &[Team]
    {
        &self.teams
    }

    /// Returns projects in discovery order.
    pub fn projects(&self,) -> &[Project]
    {
        &self.projects
    }

    /// Returns members in discovery order.
    pub fn members(&self,) -> &[Member]
    {
        &self.members
    }

    /// Iterates over teams together with their references.
    pub fn team_entries(&self,) -> impl Iterator<Item = (TeamRef, &Team,),> + '_
    {
        self.teams.iter().enumerate().map(|(index, team,)| (TeamRef(index,), team,),)
    }

    /// Iterates over members together with their references.
    pub fn member_entries(&self,) -> impl Iterator<Item = (MemberRef, &Member,),> + '_
    {
        self.members.iter().enumerate().map(|(index, member,)| (MemberRef(index,), member,),)
    }

    /// Resolves a team reference.
    pub fn team(&self, reference: TeamRef,) -> &Team
    {
        &self.teams[reference.0]
    }

    /// Resolves a member reference.
    pub fn member(&self, reference: MemberRef,) -> &Member
    {
        &self.members[reference.0]
    }

    /// Iterates over team memberships ordered by member, then by the
    /// member's team order.
    pub fn memberships(&self,) -> impl Iterator<Item = TeamMembership,> + '_
    {
        self.members.iter().enumerate().flat_map(|(index, member,)| {
            member.teams.iter().map(move |team| TeamMembership {
                team: *team, member: MemberRef(index,),
            },)
        },)
    }
}
