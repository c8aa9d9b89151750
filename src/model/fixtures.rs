// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Sample graphs shared by unit tests.

use serde_json::json;

use super::{
    ResourceGraph, build,
    raw::{RawMember, RawOrganization, RawProject, RawTeam},
};

/// Organization `acme` with two teams, two projects, an active member and a
/// pending invite without a remote id.
pub(crate) fn acme() -> ResourceGraph
{
    let organization: RawOrganization =
        serde_json::from_value(json!({"id": "1", "slug": "acme", "name": "Acme"})).expect("organization",);
    let teams: Vec<RawTeam,> = serde_json::from_value(json!([
        {"id": "10", "slug": "backend", "name": "Backend"},
        {"id": "11", "slug": "frontend", "name": "Frontend"}
    ]),)
    .expect("teams",);
    let projects: Vec<RawProject,> = serde_json::from_value(json!([
        {"id": "20", "slug": "api", "name": "API", "platform": "python", "teams": [{"slug": "backend"}]},
        {"id": "21", "slug": "web", "name": "Web", "teams": ["frontend", "backend"]}
    ]),)
    .expect("projects",);
    let members: Vec<RawMember,> = serde_json::from_value(json!([
        {"id": "30", "email": "ann@acme.io", "name": "Ann", "orgRole": "owner",
         "teams": ["backend", "frontend"]},
        {"email": "bob@acme.io", "pending": true, "teams": ["frontend"]}
    ]),)
    .expect("members",);

    build(&organization, &teams, &projects, &members,).expect("graph",)
}
