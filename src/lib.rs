// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Discovery of Sentry resources and generation of Terraform configuration.
//!
//! The pipeline fetches an organization's teams, projects and members
//! through the Sentry REST API ([`ApiClient`], [`discover`]), assembles a
//! validated [`ResourceGraph`], assigns collision-free Terraform identifiers
//! ([`resolve`]) and renders configuration for the `jianyuan/sentry`
//! provider ([`render`]) together with an idempotent import script
//! ([`generate_import_script`]).
//!
//! ```no_run
//! use stfd::{
//!     ApiClient, Config, DiscoveryOptions, ImportOptions, RenderOptions, discover,
//!     generate_import_script, render, resolve,
//! };
//!
//! # async fn example() -> Result<(), stfd::Error> {
//! let config = Config::load(None,)?;
//! let client = ApiClient::new(config.api_config()?,)?;
//! let inventory = discover(&client, &DiscoveryOptions::default(),).await?;
//! let graph = inventory.build()?;
//! let identifiers = resolve(&graph,)?;
//! let files = render(&graph, &identifiers, &RenderOptions::from(&config,),)?;
//! let script = generate_import_script(&graph, &identifiers, ImportOptions::default(),);
//! # let _ = (files, script);
//! # Ok(())
//! # }
//! ```

pub mod api;
mod config;
mod discover;
mod error;
mod identifier;
mod import_script;
pub mod model;
mod render;
pub mod retry;

pub use api::{ApiClient, ApiConfig, HttpResponse, Paginator, ReqwestTransport, Resource, Transport};
pub use config::{
    Config, ConfigOverrides, Filters, OutputFormat, OutputSettings, SentrySettings, TerraformSettings,
    default_paths, validate_token,
};
pub use discover::{DiscoveryOptions, Inventory, Scope, discover};
pub use error::{Error, io_error};
pub use identifier::{IdentifierStrategy, ResolvedIdentifiers, is_reserved, resolve, resolve_with_prefix};
pub use import_script::{
    ImportCommand, ImportOptions, ImportScript, ImportWarning, SCRIPT_NAME, generate as generate_import_script,
    write_import_script,
};
pub use model::{ResourceGraph, ResourceKind};
pub use render::{
    Block, Entry, FileKind, RenderOptions, RenderedFile, Value, render, resource_addresses, write as write_files,
};
