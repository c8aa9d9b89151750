// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Terraform configuration rendering.
//!
//! [`render`] is pure: it maps the resource graph onto a format-independent
//! block model and serializes it in the requested syntax. [`write`] is the
//! only function touching the filesystem. Identical input always yields
//! byte-identical files; no timestamps are embedded.

mod block;
mod hcl;
mod json;
mod layout;

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

pub use self::{
    block::{Block, Entry, Value},
    layout::FileKind,
};
use crate::{
    api::DEFAULT_BASE_URL,
    config::{Config, OutputFormat},
    error::{Error, io_error},
    identifier::ResolvedIdentifiers,
    model::ResourceGraph,
};

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RenderOptions
{
    /// Output syntax.
    pub format:            OutputFormat,
    /// Prefix every file with a comment header.
    pub include_comments:  bool,
    /// Emit the `outputs` file.
    pub include_outputs:   bool,
    /// `required_version` constraint.
    pub terraform_version: String,
    /// Provider version constraint.
    pub provider_version:  String,
    /// Sentry API root, e.g. `https://sentry.io/api/0`. The provider's
    /// `base_url` is derived from it by [`provider_base_url`].
    pub base_url:          String,
}

impl Default for RenderOptions
{
    fn default() -> Self
    {
        Self {
            format:            OutputFormat::Hcl,
            include_comments:  true,
            include_outputs:   true,
            terraform_version: ">= 1.0".to_owned(),
            provider_version:  "~> 0.14.0".to_owned(),
            base_url:          DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl From<&Config,> for RenderOptions
{
    fn from(config: &Config,) -> Self
    {
        Self {
            format:            config.output.format,
            include_comments:  config.terraform.include_comments,
            include_outputs:   config.terraform.include_outputs,
            terraform_version: config.terraform.terraform_version.clone(),
            provider_version:  config.terraform.provider_version.clone(),
            base_url:          config.sentry.base_url.clone(),
        }
    }
}

/// Converts an API root such as `https://sentry.io/api/0` into the form the
/// provider expects (`https://sentry.io/api/`); it appends `0/...` itself.
pub fn provider_base_url(api_root: &str,) -> String
{
    let trimmed = api_root.trim().trim_end_matches('/',);
    let root = trimmed.strip_suffix("/0",).unwrap_or(trimmed,);
    format!("{root}/")
}

/// Rendered file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RenderedFile
{
    /// Which part of the configuration the file holds.
    pub kind:     FileKind,
    /// File name including extension, e.g. `teams.tf`.
    pub name:     String,
    /// Full file contents.
    pub contents: String,
}

/// Renders the fixed file set for `graph`.
///
/// Files are returned in emission order: `main`, `variables`,
/// `organization`, `teams`, `projects`, `members` and, when enabled,
/// `outputs`. Relationships are rendered as references to resolved
/// identifiers.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if JSON encoding fails.
pub fn render(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    options: &RenderOptions,
) -> Result<Vec<RenderedFile,>, Error,>
{
    layout::layout(graph, identifiers, options,)
        .into_iter()
        .map(|(kind, blocks,)| -> Result<RenderedFile, Error,> {
            let header = options.include_comments.then(|| layout::header(kind, graph,),);
            let contents = match options.format {
                OutputFormat::Hcl => hcl::to_string(header.as_deref(), &blocks,),
                OutputFormat::Json => json::to_string(header.as_deref(), &blocks,)?,
            };
            debug!("Rendered {} blocks for {}", blocks.len(), kind.stem());
            Ok(RenderedFile {
                kind,
                name: format!("{}{}", kind.stem(), options.format.extension()),
                contents,
            },)
        },)
        .collect()
}

/// Addresses of every rendered `resource` block, in emission order.
pub fn resource_addresses(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    options: &RenderOptions,
) -> Vec<String,>
{
    layout::layout(graph, identifiers, options,)
        .iter()
        .flat_map(|(_, blocks,)| blocks.iter().filter_map(Block::address,),)
        .collect()
}

/// Writes `files` into `directory`, creating it when absent and overwriting
/// existing files.
///
/// Files of the generated set that are not part of `files`, such as
/// `teams.tf` after switching to JSON or `outputs.tf` once outputs are
/// disabled, are removed so Terraform never loads both. Other files in the
/// directory are left alone.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the path that could not be created, written
/// or removed.
pub fn write(files: &[RenderedFile], directory: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    fs::create_dir_all(directory,).map_err(|source| io_error(directory, source,),)?;

    let mut written = Vec::with_capacity(files.len(),);
    for file in files {
        let path = directory.join(&file.name,);
        fs::write(&path, &file.contents,).map_err(|source| io_error(&path, source,),)?;
        debug!("Wrote {}", path.display());
        written.push(path,);
    }

    for kind in FileKind::ALL {
        for format in [OutputFormat::Hcl, OutputFormat::Json] {
            let stale = directory.join(format!("{}{}", kind.stem(), format.extension()),);
            if written.contains(&stale,) || !stale.is_file() {
                continue;
            }
            fs::remove_file(&stale,).map_err(|source| io_error(&stale, source,),)?;
            info!("Removed stale {}", stale.display());
        }
    }

    info!("Wrote {} files to {}", written.len(), directory.display());
    Ok(written,)
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;
    use crate::{identifier::resolve, model::fixtures};

    fn rendered(options: &RenderOptions,) -> Vec<RenderedFile,>
    {
        let graph = fixtures::acme();
        let identifiers = resolve(&graph,).expect("identifiers",);
        render(&graph, &identifiers, options,).expect("render",)
    }

    fn contents<'a,>(files: &'a [RenderedFile], kind: FileKind,) -> &'a str
    {
        &files.iter().find(|file| file.kind == kind,).expect("file present",).contents
    }

    #[test]
    fn emits_fixed_file_set_in_order()
    {
        let names: Vec<String,> =
            rendered(&RenderOptions::default(),).into_iter().map(|file| file.name,).collect();
        assert_eq!(
            names,
            [
                "main.tf",
                "variables.tf",
                "organization.tf",
                "teams.tf",
                "projects.tf",
                "members.tf",
                "outputs.tf"
            ]
        );
    }

    #[test]
    fn outputs_are_optional()
    {
        let files = rendered(&RenderOptions {
            include_outputs: false, ..RenderOptions::default()
        },);
        assert_eq!(files.len(), 6);
        assert!(files.iter().all(|file| file.kind != FileKind::Outputs));
    }

    #[test]
    fn rendering_is_idempotent()
    {
        assert_eq!(rendered(&RenderOptions::default()), rendered(&RenderOptions::default()));
        let json = RenderOptions {
            format: OutputFormat::Json, ..RenderOptions::default()
        };
        assert_eq!(rendered(&json), rendered(&json));
    }

    #[test]
    fn relationships_reference_resolved_identifiers()
    {
        let files = rendered(&RenderOptions::default(),);
        let projects = contents(&files, FileKind::Projects,);
        assert!(projects.contains("teams        = [sentry_team.frontend.slug, sentry_team.backend.slug]"));
        assert!(!projects.contains("\"frontend\""));

        let members = contents(&files, FileKind::Members,);
        assert!(members.contains("resource \"sentry_team_member\" \"frontend_bob_acme_io\""));
        assert!(members.contains("member_id    = sentry_organization_member.bob_acme_io.internal_id"));
        assert!(members.contains("team         = sentry_team.backend.slug"));
        assert!(members.contains("role         = \"owner\""));
    }

    #[test]
    fn main_and_variables_never_inline_the_token()
    {
        let files = rendered(&RenderOptions::default(),);
        let main = contents(&files, FileKind::Main,);
        assert!(main.contains("source  = \"jianyuan/sentry\""));
        assert!(main.contains("token    = var.sentry_auth_token"));

        let variables = contents(&files, FileKind::Variables,);
        assert!(variables.contains("variable \"sentry_auth_token\""));
        assert!(variables.contains("sensitive   = true"));
        assert!(variables.contains("default     = \"https://sentry.io/api/\""));
        assert!(!variables.contains("/api/0"));

        let organization = contents(&files, FileKind::Organization,);
        assert!(organization.contains("data \"sentry_organization\" \"acme\" {\n  slug = var.sentry_organization\n}"));
    }

    #[test]
    fn provider_base_url_drops_the_api_version_segment()
    {
        assert_eq!(provider_base_url("https://sentry.io/api/0"), "https://sentry.io/api/");
        assert_eq!(provider_base_url("https://sentry.example.com/api/0/"), "https://sentry.example.com/api/");
        assert_eq!(provider_base_url("https://sentry.example.com/api/"), "https://sentry.example.com/api/");

        let files = rendered(&RenderOptions {
            base_url: "https://sentry.example.com/api/0".to_owned(), ..RenderOptions::default()
        },);
        let variables = contents(&files, FileKind::Variables,);
        assert!(variables.contains("default     = \"https://sentry.example.com/api/\""));
    }

    #[test]
    fn headers_are_comments_without_timestamps()
    {
        let files = rendered(&RenderOptions::default(),);
        let teams = contents(&files, FileKind::Teams,);
        assert!(teams.starts_with("# Sentry teams for organization acme.\n"));

        let bare = rendered(&RenderOptions {
            include_comments: false, ..RenderOptions::default()
        },);
        assert!(contents(&bare, FileKind::Teams).starts_with("resource \"sentry_team\" \"backend\""));
    }

    #[test]
    fn json_output_is_valid_and_ordered()
    {
        let files = rendered(&RenderOptions {
            format: OutputFormat::Json, ..RenderOptions::default()
        },);
        assert!(files.iter().all(|file| file.name.ends_with(".tf.json")));

        let projects: serde_json::Value =
            serde_json::from_str(contents(&files, FileKind::Projects,),).expect("valid json",);
        let api = &projects["resource"]["sentry_project"]["api"];
        assert_eq!(api["teams"], serde_json::json!(["${sentry_team.backend.slug}"]));
        assert_eq!(api["organization"], "${data.sentry_organization.acme.slug}");
        assert_eq!(projects["//"].as_str().map(|h| h.starts_with("Sentry projects")), Some(true));

        let keys: Vec<&String,> =
            projects["resource"]["sentry_project"].as_object().expect("object",).keys().collect();
        assert_eq!(keys, ["api", "web"]);
    }

    #[test]
    fn resource_addresses_follow_file_order()
    {
        let graph = fixtures::acme();
        let identifiers = resolve(&graph,).expect("identifiers",);
        let addresses = resource_addresses(&graph, &identifiers, &RenderOptions::default(),);
        assert_eq!(
            addresses,
            [
                "sentry_team.backend",
                "sentry_team.frontend",
                "sentry_project.api",
                "sentry_project.web",
                "sentry_organization_member.ann_acme_io",
                "sentry_organization_member.bob_acme_io",
                "sentry_team_member.backend_ann_acme_io",
                "sentry_team_member.frontend_ann_acme_io",
                "sentry_team_member.frontend_bob_acme_io",
            ]
        );
    }

    #[test]
    fn write_creates_directory_and_overwrites()
    {
        let temp = tempdir().expect("tempdir",);
        let directory = temp.path().join("nested/terraform",);
        let files = rendered(&RenderOptions::default(),);

        let written = write(&files, &directory,).expect("write",);
        assert_eq!(written.len(), files.len());
        assert_eq!(fs::read_to_string(directory.join("teams.tf"),).expect("read",), files[3].contents);

        fs::write(directory.join("teams.tf",), "stale",).expect("stale",);
        write(&files, &directory,).expect("rewrite",);
        assert_eq!(fs::read_to_string(directory.join("teams.tf"),).expect("read",), files[3].contents);
    }

    #[test]
    fn write_removes_files_of_the_other_format()
    {
        let temp = tempdir().expect("tempdir",);
        write(&rendered(&RenderOptions::default()), temp.path(),).expect("hcl",);
        fs::write(temp.path().join("custom.tf",), "# kept",).expect("custom",);

        let json = rendered(&RenderOptions {
            format: OutputFormat::Json, include_outputs: false, ..RenderOptions::default()
        },);
        write(&json, temp.path(),).expect("json",);

        let mut names: Vec<String,> = fs::read_dir(temp.path(),)
            .expect("read dir",)
            .map(|entry| entry.expect("entry",).file_name().to_string_lossy().into_owned(),)
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "custom.tf",
                "main.tf.json",
                "members.tf.json",
                "organization.tf.json",
                "projects.tf.json",
                "teams.tf.json",
                "variables.tf.json"
            ]
        );
    }

    #[test]
    fn write_reports_the_failing_path()
    {
        let temp = tempdir().expect("tempdir",);
        let blocker = temp.path().join("file",);
        fs::write(&blocker, "x",).expect("blocker",);

        let error = write(&rendered(&RenderOptions::default()), &blocker.join("sub",),).unwrap_err();
        assert!(matches!(error, Error::Io { ref path, .. } if path.starts_with(&blocker)));
    }
}
