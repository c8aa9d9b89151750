// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Configuration document for the discovery tool.
//!
//! The document mirrors the YAML file accepted through `--config` or found in
//! one of the default locations. Every section is optional; missing values
//! fall back to built-in defaults. Command-line flags and environment
//! variables are layered on top with [`Config::merge`].

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    api::{ApiConfig, DEFAULT_BASE_URL},
    error::{Error, io_error},
    retry::RetryConfig,
};

/// File names probed in the working directory when no path is given.
const LOCAL_CONFIG_FILES: &[&str] = &[".stfd.yaml", ".stfd.yml"];

/// File name probed in the home directory.
const HOME_CONFIG_FILE: &str = ".stfd.yaml";

static HEX_TOKEN: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$",).expect("valid token pattern",),);

static RESOURCE_PREFIX: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$",).expect("valid prefix pattern",),);

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use stfd::{Config, OutputFormat};
///
/// let yaml = r#"
/// sentry:
///   organization: acme
/// output:
///   format: json
/// filters:
///   exclude_platforms: [native]
/// "#;
/// let config: Config = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.sentry.organization.as_deref(), Some("acme"));
/// assert_eq!(config.output.format, OutputFormat::Json);
/// assert_eq!(config.filters.exclude_platforms, vec!["native".to_owned()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize,)]
#[serde(default)]
pub struct Config
{
    /// Connection settings for the Sentry API.
    pub sentry:    SentrySettings,
    /// Terraform generation settings.
    pub terraform: TerraformSettings,
    /// Output formatting settings.
    pub output:    OutputSettings,
    /// Resource filters applied during discovery.
    pub filters:   Filters,
}

/// Connection settings for the Sentry API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default)]
pub struct SentrySettings
{
    /// Bearer token. Usually supplied through `SENTRY_AUTH_TOKEN`.
    #[serde(skip_serializing)]
    pub token:          Option<String,>,
    /// API root, e.g. `https://sentry.example.com/api/0` for self-hosted.
    pub base_url:       String,
    /// Organization slug; the first visible organization when absent.
    pub organization:   Option<String,>,
    /// Per-request timeout in seconds.
    pub timeout:        u64,
    /// Number of retries after the first attempt.
    pub retry_attempts: u32,
}

impl Default for SentrySettings
{
    fn default() -> Self
    {
        Self {
            token:          None,
            base_url:       DEFAULT_BASE_URL.to_owned(),
            organization:   None,
            timeout:        30,
            retry_attempts: 3,
        }
    }
}

/// Terraform generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default)]
pub struct TerraformSettings
{
    /// Directory receiving the generated files.
    pub output_dir:        PathBuf,
    /// Whether `imports.sh` is generated.
    pub import_script:     bool,
    /// Value of `required_version` in the `terraform` block.
    pub terraform_version: String,
    /// Version constraint for the `jianyuan/sentry` provider.
    pub provider_version:  String,
    /// Whether generated files start with a header comment.
    pub include_comments:  bool,
    /// Whether `outputs` is generated.
    pub include_outputs:   bool,
    /// Prepended to every resource identifier, e.g. `sentry_`.
    pub resource_prefix:   String,
}

impl Default for TerraformSettings
{
    fn default() -> Self
    {
        Self {
            output_dir:        PathBuf::from("./terraform",),
            import_script:     true,
            terraform_version: ">= 1.0".to_owned(),
            provider_version:  "~> 0.14.0".to_owned(),
            include_comments:  true,
            include_outputs:   true,
            resource_prefix:   String::new(),
        }
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize,)]
#[serde(default)]
pub struct OutputSettings
{
    /// Syntax of the generated configuration.
    pub format:  OutputFormat,
    /// Render without writing any file.
    pub dry_run: bool,
    /// Enable debug logging.
    pub verbose: bool,
}

/// Syntax of the generated Terraform configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat
{
    /// Native syntax, `*.tf`.
    #[default]
    Hcl,
    /// Terraform JSON syntax, `*.tf.json`.
    Json,
}

impl OutputFormat
{
    /// File extension including the leading dot.
    pub fn extension(self,) -> &'static str
    {
        match self {
            Self::Hcl => ".tf",
            Self::Json => ".tf.json",
        }
    }
}

/// Resource filters. Empty include lists admit everything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default)]
pub struct Filters
{
    /// Project slugs to keep.
    pub include_projects:    Vec<String,>,
    /// Project slugs to drop.
    pub exclude_projects:    Vec<String,>,
    /// Team slugs to keep.
    pub include_teams:       Vec<String,>,
    /// Team slugs to drop.
    pub exclude_teams:       Vec<String,>,
    /// Platforms to keep.
    pub include_platforms:   Vec<String,>,
    /// Platforms to drop.
    pub exclude_platforms:   Vec<String,>,
    /// Drop projects whose status is not `active`.
    pub include_active_only: bool,
}

impl Default for Filters
{
    fn default() -> Self
    {
        Self {
            include_projects:    Vec::new(),
            exclude_projects:    Vec::new(),
            include_teams:       Vec::new(),
            exclude_teams:       Vec::new(),
            include_platforms:   Vec::new(),
            exclude_platforms:   Vec::new(),
            include_active_only: true,
        }
    }
}

impl Filters
{
    /// Whether a team slug passes the include/exclude lists.
    pub fn admits_team(&self, slug: &str,) -> bool
    {
        admits(&self.include_teams, &self.exclude_teams, slug,)
    }

    /// Whether a project passes slug, platform and status filters.
    pub fn admits_project(&self, slug: &str, platform: Option<&str,>, status: Option<&str,>,) -> bool
    {
        if !admits(&self.include_projects, &self.exclude_projects, slug,) {
            return false;
        }

        let platform = platform.unwrap_or("other",);
        if !admits(&self.include_platforms, &self.exclude_platforms, platform,) {
            return false;
        }

        !self.include_active_only || status.is_none_or(|status| status == "active",)
    }

    /// Whether any team filter is configured.
    pub fn filters_teams(&self,) -> bool
    {
        !self.include_teams.is_empty() || !self.exclude_teams.is_empty()
    }
}

fn admits(include: &[String], exclude: &[String], value: &str,) -> bool
{
    let included = include.is_empty() || include.iter().any(|candidate| candidate == value,);
    included && !exclude.iter().any(|candidate| candidate == value,)
}

/// Values supplied on the command line or through the environment. `None`
/// leaves the configured value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct ConfigOverrides
{
    /// Bearer token.
    pub token:        Option<String,>,
    /// API root.
    pub base_url:     Option<String,>,
    /// Organization slug.
    pub organization: Option<String,>,
    /// Output directory.
    pub output_dir:   Option<PathBuf,>,
    /// Output syntax.
    pub format:       Option<OutputFormat,>,
    /// Force a dry run.
    pub dry_run:      bool,
    /// Force verbose logging.
    pub verbose:      bool,
}

impl Config
{
    /// Loads the configuration from `path`, or from the first existing
    /// default location when `path` is `None`. Returns the defaults when no
    /// file is found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when an explicit path cannot be read and
    /// [`Error::ConfigParse`] when the document is not valid YAML.
    pub fn load(path: Option<&Path,>,) -> Result<Self, Error,>
    {
        if let Some(path,) = path {
            return Self::from_path(path,);
        }

        let cwd = std::env::current_dir().map_err(|source| io_error(Path::new("."), source,),)?;
        let home = std::env::var_os("HOME",).map(PathBuf::from,);
        match default_paths(&cwd, home.as_deref(),).into_iter().find(|candidate| candidate.is_file(),) {
            Some(found,) => Self::from_path(&found,),
            None => {
                debug!("No configuration file found; using defaults");
                Ok(Self::default(),)
            }
        }
    }

    /// Reads and parses the YAML document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::ConfigParse`].
    pub fn from_path(path: &Path,) -> Result<Self, Error,>
    {
        let contents = fs::read_to_string(path,).map_err(|source| io_error(path, source,),)?;
        debug!("Loaded configuration from {}", path.display());
        Self::parse(&contents,)
    }

    /// Parses a YAML document. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] when the document is malformed.
    pub fn parse(contents: &str,) -> Result<Self, Error,>
    {
        if contents.trim().is_empty() {
            return Ok(Self::default(),);
        }
        Ok(serde_yaml::from_str(contents,)?,)
    }

    /// Layers command-line and environment values over the file values.
    pub fn merge(mut self, overrides: ConfigOverrides,) -> Self
    {
        if let Some(token,) = non_blank(overrides.token,) {
            self.sentry.token = Some(token,);
        }
        if let Some(base_url,) = non_blank(overrides.base_url,) {
            self.sentry.base_url = base_url;
        }
        if let Some(organization,) = non_blank(overrides.organization,) {
            self.sentry.organization = Some(organization,);
        }
        if let Some(output_dir,) = overrides.output_dir {
            self.terraform.output_dir = output_dir;
        }
        if let Some(format,) = overrides.format {
            self.output.format = format;
        }
        self.output.dry_run |= overrides.dry_run;
        self.output.verbose |= overrides.verbose;
        self
    }

    /// Lists every problem that prevents a run. An empty list means the
    /// configuration is usable.
    pub fn validate(&self,) -> Vec<String,>
    {
        let mut issues = Vec::new();

        match self.sentry.token.as_deref().map(str::trim,) {
            None | Some("",) => {
                issues.push("Sentry auth token is required (set SENTRY_AUTH_TOKEN or use --token)".to_owned(),)
            }
            Some(token,) if !validate_token(token,) => issues.push("Sentry auth token has an invalid format".to_owned(),),
            Some(_,) => {}
        }

        let base_url = self.sentry.base_url.trim();
        if base_url.is_empty() {
            issues.push("Sentry base URL is required".to_owned(),);
        } else if !(base_url.starts_with("https://",) || base_url.starts_with("http://",)) {
            issues.push(format!("Sentry base URL must start with http:// or https://: {base_url}"),);
        }

        if self.sentry.timeout == 0 {
            issues.push("Sentry timeout must be positive".to_owned(),);
        }

        if self.terraform.output_dir.as_os_str().is_empty() {
            issues.push("Terraform output directory is required".to_owned(),);
        }

        let prefix = &self.terraform.resource_prefix;
        if !prefix.is_empty() && !RESOURCE_PREFIX.is_match(prefix,) {
            issues.push(format!(
                "Resource prefix must start with a letter and contain only letters, digits, '_' or '-': {prefix}"
            ),);
        }

        if self.sentry.organization.as_deref().is_some_and(|slug| slug.trim().is_empty(),) {
            issues.push("Sentry organization slug must not be blank".to_owned(),);
        }

        issues
    }

    /// Builds the API client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when no token is configured.
    pub fn api_config(&self,) -> Result<ApiConfig, Error,>
    {
        let token = self
            .sentry
            .token
            .as_deref()
            .map(str::trim,)
            .filter(|token| !token.is_empty(),)
            .ok_or_else(|| Error::validation("Sentry auth token is required",),)?;

        Ok(ApiConfig {
            timeout: std::time::Duration::from_secs(self.sentry.timeout,),
            retry: RetryConfig::with_retries(self.sentry.retry_attempts,),
            ..ApiConfig::new(self.sentry.base_url.trim(), token,)
        },)
    }

    /// Whether the API root points at a self-hosted installation.
    pub fn is_self_hosted(&self,) -> bool
    {
        !self.sentry.base_url.contains("sentry.io",)
    }
}

/// Default configuration locations in lookup order.
pub fn default_paths(cwd: &Path, home: Option<&Path,>,) -> Vec<PathBuf,>
{
    let mut paths: Vec<PathBuf,> = LOCAL_CONFIG_FILES.iter().map(|name| cwd.join(name,),).collect();
    if let Some(home,) = home {
        paths.push(home.join(HOME_CONFIG_FILE,),);
    }
    paths
}

/// Checks the shape of a Sentry auth token: a 64 character lowercase hex
/// string, or an organization (`sntrys_`) or user (`sntryu_`) token.
pub fn validate_token(token: &str,) -> bool
{
    if HEX_TOKEN.is_match(token,) {
        return true;
    }

    (token.starts_with("sntrys_",) || token.starts_with("sntryu_",)) && token.len() > 20
}

fn non_blank(value: Option<String,>,) -> Option<String,>
{
    value.map(|value| value.trim().to_owned(),).filter(|value| !value.is_empty(),)
}
