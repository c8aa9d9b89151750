// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the stfd binary.
//!
//! Discovers the resources of a Sentry organization and writes Terraform
//! configuration plus an import script into the output directory.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use stfd::{
    ApiClient, Config, ConfigOverrides, DiscoveryOptions, Error, ImportOptions, ImportScript,
    OutputFormat, RenderOptions, RenderedFile, ResourceGraph, SCRIPT_NAME, Scope, discover,
    generate_import_script, io_error, render, resolve_with_prefix, write_files, write_import_script,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Discover Sentry resources and generate Terraform configuration.
#[derive(Debug, Parser,)]
#[command(name = "stfd", version, about = "Generate Terraform configuration from existing Sentry resources")]
struct Cli
{
    /// Sentry auth token.
    #[arg(long = "token", env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String,>,

    /// Sentry API base URL, e.g. https://sentry.example.com/api/0.
    #[arg(long = "base-url", env = "SENTRY_BASE_URL", value_name = "URL")]
    base_url: Option<String,>,

    /// Organization slug; the first visible organization when omitted.
    #[arg(long = "org", env = "SENTRY_ORG", value_name = "SLUG")]
    organization: Option<String,>,

    /// Directory receiving the generated files.
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    output_dir: Option<PathBuf,>,

    /// Path to a YAML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Discover teams and projects, skipping members.
    #[arg(long = "projects-only", action = ArgAction::SetTrue, conflicts_with = "teams_only")]
    projects_only: bool,

    /// Discover teams and members, skipping projects.
    #[arg(long = "teams-only", action = ArgAction::SetTrue)]
    teams_only: bool,

    /// Print the generated files instead of writing them.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// Output syntax.
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    format: Option<OutputFormat,>,

    /// Overwrite files in a non-empty output directory.
    #[arg(long = "force", action = ArgAction::SetTrue)]
    force: bool,

    /// Enable debug logging.
    #[arg(long = "verbose", short = 'v', action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli
{
    fn overrides(&self,) -> ConfigOverrides
    {
        ConfigOverrides {
            token:        self.token.clone(),
            base_url:     self.base_url.clone(),
            organization: self.organization.clone(),
            output_dir:   self.output_dir.clone(),
            format:       self.format,
            dry_run:      self.dry_run,
            verbose:      self.verbose,
        }
    }

    fn scope(&self,) -> Scope
    {
        if self.projects_only {
            Scope::ProjectsOnly
        } else if self.teams_only {
            Scope::TeamsOnly
        } else {
            Scope::All
        }
    }
}

/// Result of a completed run.
#[derive(Debug,)]
struct Outcome
{
    graph:   ResourceGraph,
    files:   Vec<RenderedFile,>,
    script:  Option<ImportScript,>,
    written: Vec<PathBuf,>,
    dry_run: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main(flavor = "current_thread")]
async fn main()
{
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if let Err(error,) = run(cli, &mut handle,).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Executes the pipeline and prints the summary to `out`.
///
/// # Errors
///
/// Propagates configuration, API, model, rendering and I/O errors.
async fn run<W: io::Write,>(cli: Cli, out: &mut W,) -> Result<(), Error,>
{
    let config = Config::load(cli.config.as_deref(),)?.merge(cli.overrides(),);
    init_logging(config.output.verbose,);

    let issues = config.validate();
    if !issues.is_empty() {
        return Err(Error::validation(issues.join("; ",),),);
    }

    let outcome = execute(&config, cli.scope(), cli.force,).await?;
    if outcome.dry_run {
        print_dry_run(out, &outcome,)?;
    }
    print_summary(out, &config, &outcome,)
}

async fn execute(config: &Config, scope: Scope, force: bool,) -> Result<Outcome, Error,>
{
    let output_dir = config.terraform.output_dir.as_path();
    let dry_run = config.output.dry_run;
    if !dry_run {
        ensure_writable(output_dir, force,)?;
    }

    let client = ApiClient::new(config.api_config()?,)?;
    let options = DiscoveryOptions {
        organization: config.sentry.organization.clone(),
        scope,
        filters: config.filters.clone(),
    };

    let spinner = spinner();
    spinner.set_message("Discovering Sentry resources...",);
    let inventory = discover(&client, &options,).await;
    spinner.finish_and_clear();
    let inventory = inventory?;

    let graph = inventory.build()?;
    let identifiers = resolve_with_prefix(&graph, &config.terraform.resource_prefix,)?;
    info!("Rendering {} configuration", config.output.format.extension());
    let files = render(&graph, &identifiers, &RenderOptions::from(config,),)?;
    let script = config.terraform.import_script.then(|| {
        generate_import_script(
            &graph,
            &identifiers,
            ImportOptions {
                include_comments: config.terraform.include_comments,
            },
        )
    },);

    let mut written = Vec::new();
    if !dry_run {
        written = write_files(&files, output_dir,)?;
        if let Some(script,) = &script {
            written.push(write_import_script(script, output_dir,)?,);
        }
    }

    Ok(Outcome {
        graph,
        files,
        script,
        written,
        dry_run,
    },)
}

/// Refuses to write into a non-empty directory unless `force` is set.
fn ensure_writable(directory: &Path, force: bool,) -> Result<(), Error,>
{
    if force || !directory.exists() {
        return Ok((),);
    }

    let mut entries = fs::read_dir(directory,).map_err(|source| io_error(directory, source,),)?;
    if entries.next().is_some() {
        return Err(Error::validation(format!(
            "output directory {} is not empty; pass --force to overwrite",
            directory.display()
        ),),);
    }

    debug!("Output directory {} exists and is empty", directory.display());
    Ok((),)
}

fn init_logging(verbose: bool,)
{
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level,),);

    let _ = tracing_subscriber::registry()
        .with(filter,)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr,).with_target(false,),)
        .try_init();
}

fn spinner() -> ProgressBar
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
            .expect("valid template",),
    );
    pb.enable_steady_tick(Duration::from_millis(100,),);
    pb
}

fn print_dry_run<W: io::Write,>(out: &mut W, outcome: &Outcome,) -> Result<(), Error,>
{
    let stdout = Path::new("<stdout>",);
    for file in &outcome.files {
        writeln!(out, "==> {} <==\n{}", file.name, file.contents).map_err(|e| io_error(stdout, e,),)?;
    }
    if let Some(script,) = &outcome.script {
        writeln!(out, "==> {SCRIPT_NAME} <==\n{}", script.text).map_err(|e| io_error(stdout, e,),)?;
    }
    Ok((),)
}

fn print_summary<W: io::Write,>(out: &mut W, config: &Config, outcome: &Outcome,) -> Result<(), Error,>
{
    let mut text = String::new();
    let graph = &outcome.graph;
    let organization = graph.organization();

    let mut platforms: BTreeMap<&str, usize,> = BTreeMap::new();
    for project in graph.projects() {
        *platforms.entry(project.platform.as_str(),).or_default() += 1;
    }
    let platforms =
        platforms.iter().map(|(platform, count,)| format!("{count} {platform}"),).collect::<Vec<_,>>().join(", ",);
    let pending = graph.members().iter().filter(|member| member.pending,).count();

    let host = if config.is_self_hosted() { "self-hosted" } else { "sentry.io" };
    text.push_str(&format!("Sentry:       {} ({host})\n", config.sentry.base_url),);
    text.push_str(&format!("Organization: {} ({})\n", organization.name, organization.slug),);
    text.push_str(&format!("Teams:        {}\n", graph.teams().len()),);
    if platforms.is_empty() {
        text.push_str(&format!("Projects:     {}\n", graph.projects().len()),);
    } else {
        text.push_str(&format!("Projects:     {} ({platforms})\n", graph.projects().len()),);
    }
    text.push_str(&format!("Members:      {} ({pending} pending)\n", graph.members().len()),);
    text.push_str(&format!("Memberships:  {}\n", graph.memberships().count()),);

    let directory = config.terraform.output_dir.display();
    if outcome.dry_run {
        text.push_str(&format!("\nDry run: {} files would be written to {directory}\n", outcome.files.len()),);
    } else {
        text.push_str(&format!("\nGenerated files in {directory}:\n"),);
        for path in &outcome.written {
            let name = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned(),);
            text.push_str(&format!("  {name}\n"),);
        }
    }

    if let Some(script,) = &outcome.script
        && !script.warnings.is_empty()
    {
        text.push_str("\nNot imported:\n",);
        for warning in &script.warnings {
            text.push_str(&format!("  {}: {}\n", warning.address, warning.reason),);
        }
    }

    if !outcome.dry_run {
        let mut steps = vec!["Review the generated configuration".to_owned(), "terraform init".to_owned()];
        if outcome.script.is_some() {
            steps.push(format!("./{SCRIPT_NAME}"),);
        }
        steps.push("terraform plan".to_owned(),);

        text.push_str("\nNext steps:\n",);
        for (number, step,) in steps.iter().enumerate() {
            text.push_str(&format!("  {}. {step}\n", number + 1),);
        }
    }

    out.write_all(text.as_bytes(),).map_err(|e| io_error(Path::new("<stdout>",), e,),)
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use clap::Parser;
    use serde_json::json;
    use stfd::OutputFormat;
    use tempfile::tempdir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::{Cli, ensure_writable, run};
    use stfd::Scope;

    const TOKEN: &str = "sntrys_0123456789abcdefghijklmnop";

    #[test]
    fn cli_parses_every_flag()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--token",
            TOKEN,
            "--org",
            "acme",
            "--output-dir",
            "infra",
            "--format",
            "json",
            "--teams-only",
            "--dry-run",
            "--force",
            "-v",
        ],)
        .expect("failed to parse CLI",);

        assert_eq!(cli.organization.as_deref(), Some("acme"));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.scope(), Scope::TeamsOnly);
        assert!(cli.dry_run && cli.force && cli.verbose);

        let overrides = cli.overrides();
        assert_eq!(overrides.token.as_deref(), Some(TOKEN));
        assert_eq!(overrides.output_dir.as_deref(), Some(std::path::Path::new("infra")));
    }

    #[test]
    fn scope_flags_conflict()
    {
        let error = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "--teams-only", "--projects-only",],)
            .expect_err("conflicting flags",);
        assert_eq!(error.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn unknown_format_is_rejected()
    {
        assert!(Cli::try_parse_from([env!("CARGO_PKG_NAME"), "--format", "yaml"]).is_err());
    }

    #[test]
    fn non_empty_output_directory_requires_force()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        ensure_writable(temp.path(), false,).expect("empty directory is writable",);
        ensure_writable(&temp.path().join("missing",), false,).expect("missing directory is writable",);

        fs::write(temp.path().join("main.tf",), "# existing",).expect("failed to write file",);
        let error = ensure_writable(temp.path(), false,).expect_err("expected overwrite guard",);
        match error {
            stfd::Error::Validation {
                message,
            } => assert!(message.contains("pass --force")),
            other => panic!("unexpected error variant: {other:?}"),
        }
        ensure_writable(temp.path(), true,).expect("force overrides the guard",);
    }

    async fn sentry_server() -> MockServer
    {
        let server = MockServer::start().await;
        let mount = |route: &'static str, body: serde_json::Value| {
            Mock::given(method("GET",),)
                .and(path(route,),)
                .and(header("authorization", format!("Bearer {TOKEN}").as_str(),),)
                .respond_with(ResponseTemplate::new(200,).set_body_json(body,),)
        };

        mount("/api/0/organizations/acme/", json!({"id": "1", "slug": "acme", "name": "Acme"}))
            .mount(&server,)
            .await;
        mount("/api/0/organizations/acme/teams/", json!([{"id": "10", "slug": "backend", "name": "Backend"}]))
            .mount(&server,)
            .await;
        mount(
            "/api/0/organizations/acme/projects/",
            json!([{"id": "20", "slug": "api", "name": "API", "platform": "python", "teams": [{"slug": "backend"}]}]),
        )
        .mount(&server,)
        .await;
        mount(
            "/api/0/organizations/acme/members/",
            json!([{"id": "30", "email": "ann@acme.io", "role": "admin", "teams": ["backend"]}]),
        )
        .mount(&server,)
        .await;
        server
    }

    #[tokio::test]
    async fn run_writes_configuration_and_summary()
    {
        let server = sentry_server().await;
        let temp = tempdir().expect("failed to create tempdir",);
        let output = temp.path().join("terraform",);
        let base_url = format!("{}/api/0", server.uri());

        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--token",
            TOKEN,
            "--base-url",
            &base_url,
            "--org",
            "acme",
            "--output-dir",
            output.to_str().expect("utf8",),
            "--config",
            temp.path().join("absent.yaml",).to_str().expect("utf8",),
        ],)
        .expect("failed to parse CLI",);

        // The explicit config path does not exist.
        let mut buffer = Vec::new();
        assert!(run(cli, &mut buffer,).await.is_err());

        fs::write(temp.path().join("stfd.yaml",), "terraform:\n  include_outputs: false\n",)
            .expect("failed to write config",);
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--token",
            TOKEN,
            "--base-url",
            &base_url,
            "--org",
            "acme",
            "--output-dir",
            output.to_str().expect("utf8",),
            "--config",
            temp.path().join("stfd.yaml",).to_str().expect("utf8",),
        ],)
        .expect("failed to parse CLI",);

        run(cli, &mut buffer,).await.expect("run succeeds",);

        let summary = String::from_utf8(buffer,).expect("invalid UTF-8",);
        assert!(summary.contains("Organization: Acme (acme)"));
        assert!(summary.contains(&format!("Sentry:       {base_url} (self-hosted)")));
        assert!(summary.contains("Projects:     1 (1 python)"));
        assert!(summary.contains("  imports.sh"));

        assert!(output.join("teams.tf").exists());
        assert!(!output.join("outputs.tf").exists());
        let script = fs::read_to_string(output.join("imports.sh"),).expect("script",);
        assert!(script.contains("import 'sentry_team_member.backend_ann_acme_io' 'acme/backend/30'"));
    }

    #[tokio::test]
    async fn dry_run_prints_files_without_writing()
    {
        let server = sentry_server().await;
        let temp = tempdir().expect("failed to create tempdir",);
        let output = temp.path().join("terraform",);
        let config = temp.path().join("empty.yaml",);
        fs::write(&config, "",).expect("failed to write config",);
        let base_url = format!("{}/api/0", server.uri());

        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--token",
            TOKEN,
            "--base-url",
            &base_url,
            "--org",
            "acme",
            "--output-dir",
            output.to_str().expect("utf8",),
            "--config",
            config.to_str().expect("utf8",),
            "--dry-run",
            "--format",
            "json",
        ],)
        .expect("failed to parse CLI",);

        let mut buffer = Vec::new();
        run(cli, &mut buffer,).await.expect("run succeeds",);

        let printed = String::from_utf8(buffer,).expect("invalid UTF-8",);
        assert!(printed.contains("==> teams.tf.json <=="));
        assert!(printed.contains("==> imports.sh <=="));
        assert!(printed.contains("Dry run: 7 files would be written"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn invalid_token_is_reported_before_any_request()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let config = temp.path().join("empty.yaml",);
        fs::write(&config, "",).expect("failed to write config",);

        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--token",
            "short",
            "--config",
            config.to_str().expect("utf8",),
        ],)
        .expect("failed to parse CLI",);

        let error = run(cli, &mut Vec::new(),).await.expect_err("invalid token",);
        assert!(error.to_string().contains("invalid format"));
    }
}
