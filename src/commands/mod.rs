//! Command-line surface
//!
//! Each API group has its own module holding the clap arguments of its
//! commands and the handlers that run them. Handlers that talk to an API are
//! split in two: a library function taking a [`GcpClient`] and returning typed
//! results, and a thin `run_*` wrapper printing them.
//!
//! - [`compute`] - `compute backend-services update|update-backend`
//! - [`iam`] - `iam service-accounts remove-iam-policy-binding`
//! - [`dataflow`] - `dataflow jobs|messages|metrics`
//! - [`dataproc`] - `dataproc jobs submit spark|pyspark`
//! - [`config`] - `config list|set|unset`

pub mod compute;
pub mod config;
pub mod dataflow;
pub mod dataproc;
pub mod iam;

use crate::compute::Channel;
use crate::config::Config;
use crate::error::UpdateError;
use crate::gcp::auth::validate_project_id;
use crate::gcp::client::{format_gcp_error, GcpClient};
use crate::resource::ReferenceResolver;
use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute Engine resources
    Compute(compute::ComputeArgs),
    /// Identity and Access Management
    Iam(iam::IamArgs),
    /// Dataflow jobs
    Dataflow(dataflow::DataflowArgs),
    /// Dataproc jobs
    Dataproc(dataproc::DataprocArgs),
    /// View and edit gcpctl properties
    Config(config::ConfigArgs),
}

impl Command {
    /// Dotted command path used in error messages, e.g. `compute.backend-services.update`
    pub fn path(&self) -> String {
        let tail = match self {
            Command::Compute(args) => format!("compute.{}", args.path()),
            Command::Iam(args) => format!("iam.{}", args.path()),
            Command::Dataflow(args) => format!("dataflow.{}", args.path()),
            Command::Dataproc(args) => format!("dataproc.{}", args.path()),
            Command::Config(args) => format!("config.{}", args.path()),
        };
        format!("gcpctl.{}", tail)
    }
}

/// Settings shared by every command of one invocation
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    project_flag: Option<String>,
    pub channel: Channel,
}

impl Context {
    pub fn new(config: Config, project_flag: Option<String>, channel_flag: Option<Channel>) -> Self {
        let channel = config.effective_channel(channel_flag);
        Self {
            config,
            project_flag,
            channel,
        }
    }

    pub fn project(&self) -> Result<String> {
        let project = self
            .config
            .effective_project(self.project_flag.as_deref())
            .context(
                "No GCP project configured. Set GOOGLE_CLOUD_PROJECT, run \
                 'gcpctl config set project PROJECT' or use --project",
            )?;

        if !validate_project_id(&project) {
            bail!("Invalid project ID [{}]", project);
        }
        Ok(project)
    }

    /// Resolver seeded with the configured default zone and region
    pub fn resolver(&self, project: &str) -> ReferenceResolver {
        ReferenceResolver::new(project)
            .with_defaults(self.config.effective_zone(), self.config.effective_region())
    }

    pub async fn client(&self) -> Result<GcpClient> {
        let project = self.project()?;
        tracing::info!("Using project {} on the {} channel", project, self.channel);
        GcpClient::new(&project, self.config.endpoints()).await
    }
}

/// Run one parsed command
pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Compute(args) => compute::run(ctx, args).await,
        Command::Iam(args) => iam::run(ctx, args).await,
        Command::Dataflow(args) => dataflow::run(ctx, args).await,
        Command::Dataproc(args) => dataproc::run(ctx, args).await,
        Command::Config(args) => config::run(ctx, args),
    }
}

/// User-facing message for a failed command
pub fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<UpdateError>() {
        Some(UpdateError::RemoteCallFailed(inner)) => format_gcp_error(inner),
        _ => format_gcp_error(err),
    }
}

/// Print a resource as YAML on stdout
pub(crate) fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).context("Failed to render output")?;
    print!("{}", yaml);
    Ok(())
}

pub(crate) fn uppercase(value: &str) -> Result<String, String> {
    Ok(value.to_uppercase())
}

/// Parse a duration in seconds: `30`, `30s`, `5m`, `2h` or `1d`
pub(crate) fn parse_duration_secs(value: &str) -> Result<i64, String> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&value[..i], c.to_ascii_lowercase()),
        _ => (value, 's'),
    };

    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", value))?;
    let scale = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    amount
        .checked_mul(scale)
        .ok_or_else(|| format!("duration '{}' is too long", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        TestCli::try_parse_from(std::iter::once("gcpctl").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("30"), Ok(30));
        assert_eq!(parse_duration_secs("45s"), Ok(45));
        assert_eq!(parse_duration_secs("5m"), Ok(300));
        assert_eq!(parse_duration_secs("2H"), Ok(7200));
        assert!(parse_duration_secs("5w").is_err());
        assert!(parse_duration_secs("abc").is_err());
        assert!(parse_duration_secs("").is_err());
    }

    #[test]
    fn test_command_paths() {
        let command = parse(&[
            "compute",
            "backend-services",
            "update-backend",
            "web",
            "--instance-group",
            "ig",
            "--max-rate",
            "10",
        ])
        .unwrap();
        assert_eq!(command.path(), "gcpctl.compute.backend-services.update-backend");

        let command = parse(&[
            "dataproc",
            "jobs",
            "submit",
            "pyspark",
            "gs://bucket/main.py",
            "--cluster",
            "analytics",
            "--region",
            "us-central1",
        ])
        .unwrap();
        assert_eq!(command.path(), "gcpctl.dataproc.jobs.submit.pyspark");
        let Command::Dataproc(args) = command else {
            panic!("expected a dataproc command");
        };
        assert_eq!(args.region, "us-central1");

        let command = parse(&["config", "list"]).unwrap();
        assert_eq!(command.path(), "gcpctl.config.list");
    }

    #[test]
    fn test_capacity_flags_are_exclusive() {
        let result = parse(&[
            "compute",
            "backend-services",
            "update-backend",
            "web",
            "--instance-group",
            "ig",
            "--max-rate",
            "10",
            "--max-connections",
            "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_remote_error_is_rendered_with_hint() {
        use crate::gcp::http::ApiStatusError;
        use reqwest::StatusCode;

        let err: anyhow::Error = UpdateError::RemoteCallFailed(
            ApiStatusError {
                status: StatusCode::NOT_FOUND,
                message: Some("The resource 'web' was not found".into()),
            }
            .into(),
        )
        .into();
        assert_eq!(
            render_error(&err),
            "Resource not found. The resource 'web' was not found"
        );

        let local: anyhow::Error = UpdateError::NoFieldsSpecified.into();
        assert_eq!(render_error(&local), "At least one property must be modified.");
    }
}
