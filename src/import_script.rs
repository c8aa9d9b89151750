// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation of the `imports.sh` script.
//!
//! The script binds every rendered resource address to the existing remote
//! object with `terraform import`. Each invocation goes through a shell
//! function that first checks `terraform state show`, so re-running the
//! script skips addresses that are already managed.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    error::{Error, io_error},
    identifier::ResolvedIdentifiers,
    model::{ResourceGraph, TeamMembership},
};

/// Name of the generated script.
pub const SCRIPT_NAME: &str = "imports.sh";

const PRELUDE: &str = r#"set -euo pipefail

TF="${TF_BIN:-terraform}"

import() {
  local address="$1"
  local id="$2"
  if "$TF" state show "$address" >/dev/null 2>&1; then
    echo "skip   $address (already in state)"
  else
    echo "import $address"
    "$TF" import "$address" "$id"
  fi
}
"#;

/// Script generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct ImportOptions
{
    /// Add a descriptive comment header and comments for skipped nodes.
    pub include_comments: bool,
}

impl Default for ImportOptions
{
    fn default() -> Self
    {
        Self {
            include_comments: true,
        }
    }
}

/// Single `terraform import` invocation.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ImportCommand
{
    /// Resource address, e.g. `sentry_team.backend`.
    pub address: String,
    /// Import key, e.g. `acme/backend`.
    pub key:     String,
}

/// Node that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ImportWarning
{
    /// Resource address that was skipped.
    pub address: String,
    /// Why no import key could be derived.
    pub reason:  String,
}

/// Generated script with the commands it contains and the skipped nodes.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ImportScript
{
    /// Full script text.
    pub text:     String,
    /// Commands in script order.
    pub commands: Vec<ImportCommand,>,
    /// Nodes without an import key.
    pub warnings: Vec<ImportWarning,>,
}

/// Builds the import script for every node with a derivable import key.
///
/// Commands follow the renderer's block order: teams, projects, members,
/// then team memberships. Generation never fails; members without a remote
/// id and their memberships are reported as [`ImportWarning`]s.
pub fn generate(
    graph: &ResourceGraph,
    identifiers: &ResolvedIdentifiers,
    options: ImportOptions,
) -> ImportScript
{
    let organization = &graph.organization().slug;
    let mut commands = Vec::new();
    let mut warnings = Vec::new();

    for (reference, team,) in graph.team_entries() {
        commands.push(ImportCommand {
            address: format!("sentry_team.{}", identifiers.team(reference,)),
            key:     format!("{organization}/{}", team.slug),
        },);
    }

    for (index, project,) in graph.projects().iter().enumerate() {
        commands.push(ImportCommand {
            address: format!("sentry_project.{}", identifiers.project(index,)),
            key:     format!("{organization}/{}", project.slug),
        },);
    }

    for (reference, member,) in graph.member_entries() {
        let address = format!("sentry_organization_member.{}", identifiers.member(reference,));
        match &member.id {
            Some(id,) => commands.push(ImportCommand {
                address,
                key: format!("{organization}/{id}"),
            },),
            None => warnings.push(ImportWarning {
                address,
                reason: format!("member '{}' has no remote id", member.key),
            },),
        }
    }

    for (
        index,
        TeamMembership {
            team,
            member,
        },
    ) in graph.memberships().enumerate()
    {
        let address = format!("sentry_team_member.{}", identifiers.membership(index,));
        let member = graph.member(member,);
        match &member.id {
            Some(id,) => commands.push(ImportCommand {
                address,
                key: format!("{organization}/{}/{id}", graph.team(team,).slug),
            },),
            None => warnings.push(ImportWarning {
                address,
                reason: format!("member '{}' has no remote id", member.key),
            },),
        }
    }

    for warning in &warnings {
        warn!("Skipping import of {}: {}", warning.address, warning.reason);
    }

    let text = script_text(organization, &commands, &warnings, options,);
    ImportScript {
        text,
        commands,
        warnings,
    }
}

fn script_text(
    organization: &str,
    commands: &[ImportCommand],
    warnings: &[ImportWarning],
    options: ImportOptions,
) -> String
{
    let mut text = String::from("#!/usr/bin/env bash\n",);
    if options.include_comments {
        let _ = writeln!(
            text,
            "# Imports existing resources of Sentry organization {organization} into Terraform state."
        );
        let _ = writeln!(
            text,
            "# Generated by {}. Safe to re-run: addresses already in state are skipped.",
            env!("CARGO_PKG_NAME")
        );
        text.push_str("# Set TF_BIN to use a different terraform binary.\n",);
    }
    text.push_str(PRELUDE,);
    text.push('\n',);

    for command in commands {
        let _ = writeln!(text, "import {} {}", shell_quote(&command.address), shell_quote(&command.key));
    }

    if options.include_comments && !warnings.is_empty() {
        text.push('\n',);
        for warning in warnings {
            let _ = writeln!(text, "# skipped {}: {}", warning.address, warning.reason);
        }
    }

    text
}

fn shell_quote(value: &str,) -> String
{
    format!("'{}'", value.replace('\'', "'\\''",))
}

/// Writes the script as `imports.sh` inside `directory` and marks it
/// executable on Unix.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the path that could not be written.
pub fn write_import_script(script: &ImportScript, directory: &Path,) -> Result<PathBuf, Error,>
{
    fs::create_dir_all(directory,).map_err(|source| io_error(directory, source,),)?;
    let path = directory.join(SCRIPT_NAME,);
    fs::write(&path, &script.text,).map_err(|source| io_error(&path, source,),)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755,),)
            .map_err(|source| io_error(&path, source,),)?;
    }

    info!("Wrote import script with {} commands to {}", script.commands.len(), path.display());
    Ok(path,)
}
