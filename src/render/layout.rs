// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Maps the resource graph onto the fixed file set.

use super::{
    RenderOptions,
    block::{Block, Value},
    provider_base_url,
};
use crate::{identifier::ResolvedIdentifiers, model::ResourceGraph};

pub(crate) const PROVIDER_SOURCE: &str = "jianyuan/sentry";

/// Generated file, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,)]
pub enum FileKind
{
    /// Terraform settings and provider configuration.
    Main,
    /// Input variables.
    Variables,
    /// Organization data source.
    Organization,
    /// `sentry_team` resources.
    Teams,
    /// `sentry_project` resources.
    Projects,
    /// `sentry_organization_member` and `sentry_team_member` resources.
    Members,
    /// Outputs; only when enabled.
    Outputs,
}

impl FileKind
{
    /// Every kind in emission order.
    pub const ALL: [Self; 7] = [
        Self::Main,
        Self::Variables,
        Self::Organization,
        Self::Teams,
        Self::Projects,
        Self::Members,
        Self::Outputs,
    ];

    /// File name without extension.
    pub fn stem(self,) -> &'static str
    {
        match self {
            Self::Main => "main",
            Self::Variables => "variables",
            Self::Organization => "organization",
            Self::Teams => "teams",
            Self::Projects => "projects",
            Self::Members => "members",
            Self::Outputs => "outputs",
        }
    }

    fn description(self,) -> &'static str
    {
        match self {
            Self::Main => "Terraform settings and Sentry provider",
            Self::Variables => "Input variables",
            Self::Organization => "Sentry organization",
            Self::Teams => "Sentry teams",
            Self::Projects => "Sentry projects",
            Self::Members => "Sentry organization members and team memberships",
            Self::Outputs => "Outputs",
        }
    }
}

pub(crate) fn header(kind: FileKind, graph: &ResourceGraph,) -> String
{
    format!(
        "{} for organization {}.\nGenerated by {}. Import existing resources with imports.sh before \
         running terraform apply.",
        kind.description(),
        graph.organization().slug,
        env!("CARGO_PKG_NAME")
    )
}

/// Builds the blocks of every emitted file, in emission order.
pub(crate) fn layout(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    options: &RenderOptions,
) -> Vec<(FileKind, Vec<Block,>,),>
{
    let organization = format!("data.sentry_organization.{}.slug", identifiers.organization());

    FileKind::ALL
        .into_iter()
        .filter(|kind| *kind != FileKind::Outputs || options.include_outputs,)
        .map(|kind| {
            let blocks = match kind {
                FileKind::Main => main_blocks(options,),
                FileKind::Variables => variable_blocks(options,),
                FileKind::Organization => vec![
                    Block::new("data", &["sentry_organization", identifiers.organization()],)
                        .attribute("slug", Value::expression("var.sentry_organization",),),
                ],
                FileKind::Teams => team_blocks(graph, identifiers, &organization,),
                FileKind::Projects => project_blocks(graph, identifiers, &organization,),
                FileKind::Members => member_blocks(graph, identifiers, &organization,),
                FileKind::Outputs => output_blocks(graph, identifiers,),
            };
            (kind, blocks,)
        },)
        .collect()
}

fn main_blocks(options: &RenderOptions,) -> Vec<Block,>
{
    vec![
        Block::new("terraform", &[],)
            .attribute("required_version", Value::string(&options.terraform_version,),)
            .block(Block::new("required_providers", &[],).attribute(
                "sentry",
                Value::Object(vec![
                    ("source".to_owned(), Value::string(PROVIDER_SOURCE,),),
                    ("version".to_owned(), Value::string(&options.provider_version,),),
                ],),
            ),),
        Block::new("provider", &["sentry"],)
            .attribute("token", Value::expression("var.sentry_auth_token",),)
            .attribute("base_url", Value::expression("var.sentry_base_url",),),
    ]
}

fn variable_blocks(options: &RenderOptions,) -> Vec<Block,>
{
    vec![
        Block::new("variable", &["sentry_auth_token"],)
            .attribute("description", Value::string("Sentry authentication token",),)
            .attribute("type", Value::Type("string",),)
            .attribute("sensitive", Value::Bool(true,),),
        Block::new("variable", &["sentry_organization"],)
            .attribute("description", Value::string("Sentry organization slug",),)
            .attribute("type", Value::Type("string",),),
        Block::new("variable", &["sentry_base_url"],)
            .attribute("description", Value::string("Sentry API base URL",),)
            .attribute("type", Value::Type("string",),)
            .attribute("default", Value::string(provider_base_url(&options.base_url,),),),
    ]
}

fn team_blocks(graph: &ResourceGraph, identifiers: &ResolvedIdentifiers, organization: &str,) -> Vec<Block,>
{
    graph
        .team_entries()
        .map(|(reference, team,)| {
            Block::resource("sentry_team", identifiers.team(reference,),)
                .attribute("organization", Value::expression(organization,),)
                .attribute("name", Value::string(&team.name,),)
                .attribute("slug", Value::string(&team.slug,),)
        },)
        .collect()
}

fn project_blocks(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    organization: &str,
) -> Vec<Block,>
{
    graph
        .projects()
        .iter()
        .enumerate()
        .map(|(index, project,)| {
            let mut block = Block::resource("sentry_project", identifiers.project(index,),)
                .attribute("organization", Value::expression(organization,),);
            if !project.teams.is_empty() {
                let teams = project
                    .teams
                    .iter()
                    .map(|team| Value::expression(format!("sentry_team.{}.slug", identifiers.team(*team,)),),)
                    .collect();
                block = block.attribute("teams", Value::List(teams,),);
            }
            block
                .attribute("name", Value::string(&project.name,),)
                .attribute("slug", Value::string(&project.slug,),)
                .attribute("platform", Value::string(&project.platform,),)
        },)
        .collect()
}

fn member_blocks(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    organization: &str,
) -> Vec<Block,>
{
    let members = graph.member_entries().map(|(reference, member,)| {
        Block::resource("sentry_organization_member", identifiers.member(reference,),)
            .attribute("organization", Value::expression(organization,),)
            .attribute("email", Value::string(member.email.as_deref().unwrap_or(&member.key,),),)
            .attribute("role", Value::string(&member.role,),)
    },);

    let memberships = graph.memberships().enumerate().map(|(index, membership,)| {
        Block::resource("sentry_team_member", identifiers.membership(index,),)
            .attribute("organization", Value::expression(organization,),)
            .attribute(
                "team",
                Value::expression(format!("sentry_team.{}.slug", identifiers.team(membership.team,)),),
            )
            .attribute(
                "member_id",
                Value::expression(format!(
                    "sentry_organization_member.{}.internal_id",
                    identifiers.member(membership.member,)
                ),),
            )
    },);

    members.chain(memberships,).collect()
}

fn output_blocks(graph: &ResourceGraph, identifiers: &ResolvedIdentifiers,) -> Vec<Block,>
{
    let team_ids = graph
        .team_entries()
        .map(|(reference, _,)| {
            let identifier = identifiers.team(reference,);
            (identifier.to_owned(), Value::expression(format!("sentry_team.{identifier}.id"),),)
        },)
        .collect();
    let project_ids = (0..graph.projects().len())
        .map(|index| {
            let identifier = identifiers.project(index,);
            (identifier.to_owned(), Value::expression(format!("sentry_project.{identifier}.id"),),)
        },)
        .collect();

    vec![
        Block::new("output", &["team_ids"],)
            .attribute("description", Value::string("Sentry team IDs keyed by resource name",),)
            .attribute("value", Value::Object(team_ids,),),
        Block::new("output", &["project_ids"],)
            .attribute("description", Value::string("Sentry project IDs keyed by resource name",),)
            .attribute("value", Value::Object(project_ids,),),
    ]
}
