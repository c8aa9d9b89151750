// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Raw records as returned by the Sentry REST API.
//!
//! Only the fields the pipeline consumes are declared; everything else in
//! the API payload is ignored during deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Organization record from `/organizations/` or `/organizations/{slug}/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct RawOrganization
{
    /// Remote identifier.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id:   Option<String,>,
    /// Organization slug.
    pub slug: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Team record from `/organizations/{org}/teams/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct RawTeam
{
    /// Remote identifier.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id:   Option<String,>,
    /// Team slug.
    pub slug: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Project record from `/organizations/{org}/projects/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct RawProject
{
    /// Remote identifier.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id:       Option<String,>,
    /// Project slug.
    pub slug:     String,
    /// Display name.
    #[serde(default)]
    pub name:     String,
    /// Platform tag such as `python` or `javascript-react`.
    #[serde(default)]
    pub platform: Option<String,>,
    /// Lifecycle status reported by the service.
    #[serde(default)]
    pub status:   Option<String,>,
    /// Teams owning the project, in API order.
    #[serde(default)]
    pub teams:    Vec<SlugRef,>,
}

/// Member record from `/organizations/{org}/members/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct RawMember
{
    /// Remote identifier; absent for some invite records.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id:       Option<String,>,
    /// Email address of the member or invitee.
    #[serde(default)]
    pub email:    Option<String,>,
    /// Display name.
    #[serde(default)]
    pub name:     Option<String,>,
    /// Legacy role field.
    #[serde(default)]
    pub role:     Option<String,>,
    /// Organization role; preferred over `role` when present.
    #[serde(default, rename = "orgRole")]
    pub org_role: Option<String,>,
    /// Linked user account, if the invitation was accepted.
    #[serde(default)]
    pub user:     Option<RawUser,>,
    /// Teams the member belongs to, in API order.
    #[serde(default)]
    pub teams:    Vec<SlugRef,>,
    /// Whether the invitation is still pending.
    #[serde(default)]
    pub pending:  bool,
}

/// User account nested in a member record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct RawUser
{
    /// Login name.
    #[serde(default)]
    pub username: Option<String,>,
}

/// Reference to another resource, given either as a bare slug or as an
/// embedded object carrying a `slug` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(untagged)]
pub enum SlugRef
{
    /// Bare slug string.
    Slug(String,),
    /// Embedded object such as `{"id": "1", "slug": "backend"}`.
    Object
    {
        /// Referenced slug.
        slug: String,
    },
}

impl SlugRef
{
    /// Returns the referenced slug.
    pub fn slug(&self,) -> &str
    {
        match self {
            Self::Slug(slug,) => slug,
            Self::Object {
                slug,
            } => slug,
        }
    }
}

impl From<&str,> for SlugRef
{
    fn from(slug: &str,) -> Self
    {
        Self::Slug(slug.to_owned(),)
    }
}

impl RawMember
{
    /// Returns the key identifying the member: email, or the username when
    /// the email is missing or blank.
    pub fn key(&self,) -> Option<&str,>
    {
        let email = self.email.as_deref().map(str::trim,).filter(|value| !value.is_empty(),);
        email.or_else(|| {
            self.user
                .as_ref()
                .and_then(|user| user.username.as_deref(),)
                .map(str::trim,)
                .filter(|value| !value.is_empty(),)
        },)
    }
}

fn deserialize_optional_id<'de, D,>(deserializer: D,) -> Result<Option<String,>, D::Error,>
where
    D: Deserializer<'de,>,
{
    #[derive(Deserialize,)]
    #[serde(untagged)]
    enum Id
    {
        Text(String,),
        Number(u64,),
    }

    let value: Option<Id,> = Option::deserialize(deserializer,)?;
    Ok(value
        .map(|id| match id {
            Id::Text(text,) => text,
            Id::Number(number,) => number.to_string(),
        },)
        .filter(|id| !id.trim().is_empty(),),)
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;

    #[test]
    fn project_accepts_embedded_team_objects()
    {
        let project: RawProject = serde_json::from_value(json!({
            "id": "42",
            "slug": "api",
            "name": "API",
            "platform": "python",
            "teams": [{"id": "7", "slug": "backend", "name": "Backend"}, "ops"],
            "hasAccess": true
        }),)
        .expect("project should decode",);

        let slugs: Vec<&str,> = project.teams.iter().map(SlugRef::slug,).collect();
        assert_eq!(slugs, ["backend", "ops"]);
        assert_eq!(project.id.as_deref(), Some("42"));
    }

    #[test]
    fn numeric_and_blank_ids_are_normalized()
    {
        let team: RawTeam = serde_json::from_value(json!({"id": 7, "slug": "ops"}),)
            .expect("team should decode",);
        assert_eq!(team.id.as_deref(), Some("7"));

        let member: RawMember =
            serde_json::from_value(json!({"id": "", "email": "a@example.com"}),)
                .expect("member should decode",);
        assert!(member.id.is_none());
    }

    #[test]
    fn member_decodes_both_role_fields()
    {
        let member: RawMember = serde_json::from_value(json!({
            "id": "3",
            "email": "dev@example.com",
            "role": "member",
            "orgRole": "admin",
            "teams": ["backend"]
        }),)
        .expect("member should decode",);
        assert_eq!(member.org_role.as_deref(), Some("admin"));
        assert_eq!(member.role.as_deref(), Some("member"));
    }

    #[test]
    fn member_key_falls_back_to_username()
    {
        let member: RawMember = serde_json::from_value(json!({
            "id": "3",
            "email": "  ",
            "user": {"username": "octocat"}
        }),)
        .expect("member should decode",);
        assert_eq!(member.key(), Some("octocat"));

        let anonymous: RawMember =
            serde_json::from_value(json!({"id": "4"}),).expect("member should decode",);
        assert_eq!(anonymous.key(), None);
    }
}
