// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Derivation of Terraform identifiers from Sentry slugs.
//!
//! Identifiers produced by this module contain only lowercase ASCII
//! alphanumeric characters and single underscore separators, never start with
//! a digit and never equal a Terraform reserved word. They are unique within
//! their [`ResourceKind`]: collisions are broken with `_2`, `_3`, ... suffixes
//! in discovery order, so identical input always yields identical names.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::{
    error::Error,
    model::{MemberRef, ResourceGraph, ResourceKind, TeamMembership, TeamRef},
};

/// Names Terraform reserves for meta-arguments, block types and expression
/// keywords.
const RESERVED_WORDS: &[&str] = &[
    "count",
    "data",
    "depends_on",
    "each",
    "false",
    "for",
    "for_each",
    "if",
    "in",
    "lifecycle",
    "local",
    "locals",
    "module",
    "null",
    "output",
    "path",
    "provider",
    "providers",
    "resource",
    "self",
    "source",
    "terraform",
    "true",
    "var",
    "variable",
    "version",
];

/// Builder for identifier candidates derived from slugs and names.
#[derive(Debug, Clone, Copy,)]
pub struct IdentifierStrategy<'input,>
{
    source: &'input str,
}

impl<'input,> IdentifierStrategy<'input,>
{
    /// Creates a new identifier builder for the provided string slice.
    pub fn builder(source: &'input str,) -> Self
    {
        Self {
            source,
        }
    }

    /// Builds the candidate identifier. Returns `None` when the input does
    /// not contain any identifier-worthy characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use stfd::IdentifierStrategy;
    ///
    /// assert_eq!(IdentifierStrategy::builder("My-Project!",).build().as_deref(), Some("my_project"));
    /// assert_eq!(IdentifierStrategy::builder("42-service",).build().as_deref(), Some("_42_service"));
    /// assert_eq!(IdentifierStrategy::builder("count",).build().as_deref(), Some("_count"));
    /// assert!(IdentifierStrategy::builder("???",).build().is_none());
    /// ```
    pub fn build(self,) -> Option<String,>
    {
        let mut identifier = String::with_capacity(self.source.len() + 1,);
        let mut previous_separator = false;

        for candidate in self.source.trim().chars() {
            match candidate {
                'A'..='Z' => {
                    identifier.push(candidate.to_ascii_lowercase(),);
                    previous_separator = false;
                }
                'a'..='z' | '0'..='9' => {
                    identifier.push(candidate,);
                    previous_separator = false;
                }
                _ => {
                    if !previous_separator && !identifier.is_empty() {
                        identifier.push('_',);
                        previous_separator = true;
                    }
                }
            }
        }

        while identifier.ends_with('_',) {
            identifier.pop();
        }

        if identifier.is_empty() {
            return None;
        }

        let starts_with_digit = identifier.starts_with(|ch: char| ch.is_ascii_digit(),);
        if starts_with_digit || is_reserved(&identifier,) {
            identifier.insert(0, '_',);
        }

        Some(identifier,)
    }
}

/// Returns `true` when `identifier` is a Terraform reserved word.
pub fn is_reserved(identifier: &str,) -> bool
{
    RESERVED_WORDS.contains(&identifier,)
}

/// Hands out unique identifiers for a single resource kind.
#[derive(Debug, Default,)]
struct Allocator
{
    taken: HashSet<String,>,
}

impl Allocator
{
    fn allocate(&mut self, candidate: String,) -> String
    {
        if self.taken.insert(candidate.clone(),) {
            return candidate;
        }

        let mut suffix = 2u32;
        loop {
            let next = format!("{candidate}_{suffix}");
            if self.taken.insert(next.clone(),) {
                return next;
            }
            suffix += 1;
        }
    }
}

/// Identifiers assigned to every node of a [`ResourceGraph`].
///
/// Per-kind vectors are aligned with the graph's discovery order; the
/// `(kind, slug)` map serves lookups by slug.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ResolvedIdentifiers
{
    organization: String,
    teams:        Vec<String,>,
    projects:     Vec<String,>,
    members:      Vec<String,>,
    memberships:  Vec<String,>,
    by_slug:      BTreeMap<(ResourceKind, String,), String,>,
}

impl ResolvedIdentifiers
{
    /// Identifier of the organization.
    pub fn organization(&self,) -> &str
    {
        &self.organization
    }

    /// Identifier of a team.
    pub fn team(&self, team: TeamRef,) -> &str
    {
        &self.teams[team.index()]
    }

    /// Identifier of the project at `index` in discovery order.
    pub fn project(&self, index: usize,) -> &str
    {
        &self.projects[index]
    }

    /// Identifier of a member.
    pub fn member(&self, member: MemberRef,) -> &str
    {
        &self.members[member.index()]
    }

    /// Identifier of the membership at `index` in
    /// [`ResourceGraph::memberships`] order.
    pub fn membership(&self, index: usize,) -> &str
    {
        &self.memberships[index]
    }

    /// Looks an identifier up by kind and slug. Memberships use the
    /// `team/member` slug form.
    pub fn get(&self, kind: ResourceKind, slug: &str,) -> Option<&str,>
    {
        self.by_slug.get(&(kind, slug.to_owned(),),).map(String::as_str,)
    }

    /// Iterates over `((kind, slug), identifier)` pairs in sorted order.
    pub fn iter(&self,) -> impl Iterator<Item = (&(ResourceKind, String,), &String,),> + '_
    {
        self.by_slug.iter()
    }
}

/// Assigns collision-free identifiers to every node of the graph.
///
/// # Errors
///
/// Returns [`Error::InvalidSlug`] naming the offending node when a slug does
/// not contain a single identifier character.
pub fn resolve(graph: &ResourceGraph,) -> Result<ResolvedIdentifiers, Error,>
{
    resolve_with_prefix(graph, "",)
}

/// Like [`resolve`], with `prefix` prepended to every slug before
/// sanitization and collision handling. Membership identifiers inherit the
/// prefix through their team identifier.
///
/// # Errors
///
/// Same as [`resolve`].
pub fn resolve_with_prefix(graph: &ResourceGraph, prefix: &str,) -> Result<ResolvedIdentifiers, Error,>
{
    let mut by_slug = BTreeMap::new();
    let prefixed = |kind: ResourceKind, slug: &str| -> Result<String, Error,> {
        if prefix.is_empty() {
            return candidate(kind, slug,);
        }
        IdentifierStrategy::builder(&format!("{prefix}{slug}"),).build().ok_or_else(|| Error::InvalidSlug {
            kind, slug: slug.to_owned(),
        },)
    };

    let organization = graph.organization();
    let organization_id = prefixed(ResourceKind::Organization, &organization.slug,)?;
    by_slug.insert(
        (ResourceKind::Organization, organization.slug.clone(),),
        organization_id.clone(),
    );

    let mut allocator = Allocator::default();
    let mut teams = Vec::with_capacity(graph.teams().len(),);
    for team in graph.teams() {
        let identifier = allocator.allocate(prefixed(ResourceKind::Team, &team.slug,)?,);
        by_slug.insert((ResourceKind::Team, team.slug.clone(),), identifier.clone(),);
        teams.push(identifier,);
    }

    let mut allocator = Allocator::default();
    let mut projects = Vec::with_capacity(graph.projects().len(),);
    for project in graph.projects() {
        let identifier = allocator.allocate(prefixed(ResourceKind::Project, &project.slug,)?,);
        by_slug.insert((ResourceKind::Project, project.slug.clone(),), identifier.clone(),);
        projects.push(identifier,);
    }

    let mut allocator = Allocator::default();
    let mut members = Vec::with_capacity(graph.members().len(),);
    for member in graph.members() {
        let identifier = allocator.allocate(prefixed(ResourceKind::Member, &member.key,)?,);
        by_slug.insert((ResourceKind::Member, member.key.clone(),), identifier.clone(),);
        members.push(identifier,);
    }

    let mut allocator = Allocator::default();
    let mut memberships = Vec::new();
    for TeamMembership {
        team,
        member,
    } in graph.memberships()
    {
        let derived = format!("{}_{}", teams[team.index()], members[member.index()]);
        let identifier = allocator.allocate(candidate(ResourceKind::TeamMembership, &derived,)?,);
        let slug = format!("{}/{}", graph.team(team,).slug, graph.member(member,).key);
        by_slug.insert((ResourceKind::TeamMembership, slug,), identifier.clone(),);
        memberships.push(identifier,);
    }

    debug!(
        "Resolved identifiers for {} teams, {} projects, {} members and {} memberships",
        teams.len(),
        projects.len(),
        members.len(),
        memberships.len()
    );

    Ok(ResolvedIdentifiers {
        organization: organization_id,
        teams,
        projects,
        members,
        memberships,
        by_slug,
    },)
}

fn candidate(kind: ResourceKind, slug: &str,) -> Result<String, Error,>
{
    IdentifierStrategy::builder(slug,).build().ok_or_else(|| Error::InvalidSlug {
        kind, slug: slug.to_owned(),
    },)
}

#[cfg(test)]
mod tests
{
    use std::collections::HashSet;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::model::{
        build,
        raw::{RawMember, RawOrganization, RawProject, RawTeam},
    };

    fn organization() -> RawOrganization
    {
        RawOrganization {
            id: None, slug: "acme".to_owned(), name: "Acme".to_owned(),
        }
    }

    fn projects(slugs: &[&str],) -> Vec<RawProject,>
    {
        slugs
            .iter()
            .map(|slug| serde_json::from_value(json!({"slug": slug})).expect("project",),)
            .collect()
    }

    fn teams(slugs: &[&str],) -> Vec<RawTeam,>
    {
        slugs
            .iter()
            .map(|slug| RawTeam {
                id: None, slug: (*slug).to_owned(), name: String::new(),
            },)
            .collect()
    }

    fn is_valid_identifier(identifier: &str,) -> bool
    {
        let mut chars = identifier.chars();
        matches!(chars.next(), Some('a'..='z' | '_'))
            && chars.all(|ch| matches!(ch, 'a'..='z' | '0'..='9' | '_'))
            && !is_reserved(identifier,)
    }

    proptest! {
        #[test]
        fn identifiers_are_valid_and_unique(slugs in proptest::collection::vec("[A-Za-z0-9 !._-]{0,12}[a-z]", 1..24)) {
            let refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
            let mut unique = Vec::new();
            for slug in refs {
                if !unique.contains(&slug) {
                    unique.push(slug);
                }
            }
            let graph = build(&organization(), &[], &projects(&unique), &[]).expect("graph");
            let resolved = resolve(&graph).expect("identifiers");

            let mut seen = HashSet::new();
            for index in 0..graph.projects().len() {
                let identifier = resolved.project(index);
                prop_assert!(is_valid_identifier(identifier), "invalid identifier {identifier}");
                prop_assert!(seen.insert(identifier.to_owned()), "duplicate identifier {identifier}");
            }

            let again = resolve(&graph).expect("identifiers");
            prop_assert_eq!(resolved, again);
        }
    }

    #[test]
    fn builder_normalizes_separators_and_case()
    {
        let identifier = IdentifierStrategy::builder("  Multi--Separator..Value  ",).build();
        assert_eq!(identifier.as_deref(), Some("multi_separator_value"));
    }

    #[test]
    fn builder_strips_non_ascii_characters()
    {
        let identifier = IdentifierStrategy::builder("café-世界-api",).build();
        assert_eq!(identifier.as_deref(), Some("caf_api"));
    }

    #[test]
    fn builder_prefixes_leading_digits_and_reserved_words()
    {
        assert_eq!(IdentifierStrategy::builder("2fa",).build().as_deref(), Some("_2fa"));
        assert_eq!(IdentifierStrategy::builder("Provider",).build().as_deref(), Some("_provider"));
        assert_eq!(IdentifierStrategy::builder("providers-team",).build().as_deref(), Some("providers_team"));
    }

    #[test]
    fn builder_returns_none_for_empty_input()
    {
        assert!(IdentifierStrategy::builder("   ",).build().is_none());
        assert!(IdentifierStrategy::builder("---___",).build().is_none());
    }

    #[test]
    fn colliding_slugs_receive_numeric_suffixes_in_discovery_order()
    {
        let graph = build(&organization(), &[], &projects(&["api", "api!"],), &[],).expect("graph",);
        let resolved = resolve(&graph,).expect("identifiers",);

        assert_eq!(resolved.project(0,), "api");
        assert_eq!(resolved.project(1,), "api_2");
        assert_eq!(resolved.get(ResourceKind::Project, "api!",), Some("api_2"));
    }

    #[test]
    fn suffixes_skip_identifiers_already_taken()
    {
        let graph =
            build(&organization(), &[], &projects(&["api_2", "api", "API"],), &[],).expect("graph",);
        let resolved = resolve(&graph,).expect("identifiers",);

        assert_eq!(resolved.project(0,), "api_2");
        assert_eq!(resolved.project(1,), "api");
        assert_eq!(resolved.project(2,), "api_3");
    }

    #[test]
    fn prefix_applies_before_collision_handling()
    {
        let member: RawMember = serde_json::from_value(json!({
            "id": "9", "email": "ann@acme.io", "teams": ["core"]
        }),)
        .expect("member",);
        let graph = build(
            &organization(),
            &teams(&["core", "sentry-core"],),
            &projects(&["count"],),
            &[member],
        )
        .expect("graph",);
        let resolved = resolve_with_prefix(&graph, "sentry-",).expect("identifiers",);

        assert_eq!(resolved.organization(), "sentry_acme");
        assert_eq!(resolved.get(ResourceKind::Team, "core",), Some("sentry_core"));
        assert_eq!(resolved.get(ResourceKind::Team, "sentry-core",), Some("sentry_sentry_core"));
        assert_eq!(resolved.get(ResourceKind::Project, "count",), Some("sentry_count"));
        assert_eq!(resolved.get(ResourceKind::Member, "ann@acme.io",), Some("sentry_ann_acme_io"));
        assert_eq!(resolved.get(ResourceKind::TeamMembership, "core/ann@acme.io",), Some("sentry_core_sentry_ann_acme_io"));
        assert_eq!(resolve_with_prefix(&graph, "",).expect("identifiers",), resolve(&graph,).expect("identifiers",));
    }

    #[test]
    fn collisions_are_scoped_per_kind()
    {
        let graph =
            build(&organization(), &teams(&["core"],), &projects(&["core"],), &[],).expect("graph",);
        let resolved = resolve(&graph,).expect("identifiers",);

        assert_eq!(resolved.get(ResourceKind::Team, "core",), Some("core"));
        assert_eq!(resolved.get(ResourceKind::Project, "core",), Some("core"));
    }

    #[test]
    fn memberships_combine_team_and_member_identifiers()
    {
        let member: RawMember = serde_json::from_value(json!({
            "id": "9",
            "email": "Jane.Doe@example.com",
            "teams": ["backend"]
        }),)
        .expect("member",);
        let graph = build(&organization(), &teams(&["backend"],), &[], &[member],).expect("graph",);
        let resolved = resolve(&graph,).expect("identifiers",);

        assert_eq!(resolved.get(ResourceKind::Member, "Jane.Doe@example.com",), Some("jane_doe_example_com"));
        assert_eq!(resolved.membership(0,), "backend_jane_doe_example_com");
        assert_eq!(
            resolved.get(ResourceKind::TeamMembership, "backend/Jane.Doe@example.com",),
            Some("backend_jane_doe_example_com")
        );
    }

    #[test]
    fn slug_without_identifier_characters_is_rejected()
    {
        let graph = build(&organization(), &teams(&["---"],), &[], &[],).expect("graph",);
        let error = resolve(&graph,).expect_err("invalid slug",);
        match error {
            Error::InvalidSlug {
                kind,
                slug,
            } => {
                assert_eq!(kind, ResourceKind::Team);
                assert_eq!(slug, "---");
            }
            other => panic!("expected invalid slug error, got {other:?}"),
        }
    }
}
